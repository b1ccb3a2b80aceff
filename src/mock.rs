// 🎲 Mock ACE reports for demos and tests
//
// Produces the three CSV reports with a seeded RNG, so a given seed always
// yields the same files (relative to the chosen "today").
// 10-15 entries carry IEEPA codes and most are liquidated with no protest,
// so a default run always has refund-eligible and urgent rows to show.

use crate::error::Result;
use crate::pipeline::{ReportSources, SourceInput};
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const LIQUIDATION_OTHER: &[&str] = &["Pending", "Suspended", "Cancelled"];
const PROTEST_FILED: &[&str] = &["Filed", "Pending", "Denied"];
const PORTS: &[&str] = &["LAX", "JFK", "MIA", "ORD", "SEA", "DFW"];

#[derive(Debug, Clone, Serialize)]
pub struct EntrySummaryRow {
    pub entry_number: String,
    pub hts_code: String,
    pub duties_paid: f64,
    pub entered_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiquidationRow {
    pub entry_number: String,
    pub liquidation_date: String,
    pub liquidation_status: String,
    pub protest_status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImporterRow {
    pub entry_number: String,
    pub importer_name: String,
    pub port_of_entry: String,
    pub entry_date: String,
}

#[derive(Debug, Clone)]
pub struct MockOptions {
    pub count: usize,
    pub seed: u64,
    pub today: NaiveDate,
}

impl MockOptions {
    pub fn new(today: NaiveDate) -> Self {
        MockOptions {
            count: 50,
            seed: 42,
            today,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockDataset {
    pub entries: Vec<EntrySummaryRow>,
    pub liquidations: Vec<LiquidationRow>,
    pub importers: Vec<ImporterRow>,
}

/// Paths of the files written by `MockDataset::write_to_dir`.
#[derive(Debug, Clone)]
pub struct MockFiles {
    pub entry_summary: PathBuf,
    pub liquidation_status: PathBuf,
    pub importer_statement: PathBuf,
}

impl MockFiles {
    /// Standard file names inside `dir`, whether or not they exist yet.
    pub fn in_dir(dir: &Path) -> Self {
        MockFiles {
            entry_summary: dir.join("entry_summary.csv"),
            liquidation_status: dir.join("liquidation_status.csv"),
            importer_statement: dir.join("importer_statement.csv"),
        }
    }

    /// Previously generated reports in `dir`. `None` unless both required
    /// reports are on disk.
    pub fn locate(dir: &Path) -> Option<Self> {
        let files = Self::in_dir(dir);
        (files.entry_summary.is_file() && files.liquidation_status.is_file()).then_some(files)
    }

    /// Pipeline sources for these files; the importer statement only if present.
    pub fn sources(&self) -> ReportSources {
        let sources = ReportSources::new(
            SourceInput::path(&self.entry_summary),
            SourceInput::path(&self.liquidation_status),
        );
        if self.importer_statement.is_file() {
            sources.with_importer_statement(SourceInput::path(&self.importer_statement))
        } else {
            sources
        }
    }
}

impl MockDataset {
    pub fn ieepa_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.hts_code.starts_with("9903"))
            .count()
    }

    pub fn write_to_dir(&self, dir: &Path) -> Result<MockFiles> {
        fs::create_dir_all(dir)?;

        let files = MockFiles::in_dir(dir);

        write_rows(&files.entry_summary, &self.entries)?;
        write_rows(&files.liquidation_status, &self.liquidations)?;
        write_rows(&files.importer_statement, &self.importers)?;

        info!(
            entries = self.entries.len(),
            ieepa = self.ieepa_count(),
            dir = %dir.display(),
            "wrote mock reports"
        );
        Ok(files)
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn offset(today: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        today + Days::new(days as u64)
    } else {
        today - Days::new(days.unsigned_abs())
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn generate(options: &MockOptions) -> MockDataset {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let count = options.count;

    let mut seen = HashSet::with_capacity(count);
    let mut entry_numbers = Vec::with_capacity(count);
    while entry_numbers.len() < count {
        let n: u64 = rng.gen_range(10_000_000_000..=99_999_999_999);
        if seen.insert(n) {
            entry_numbers.push(format!("{:011}", n));
        }
    }

    let mut liquidation_dates: Vec<NaiveDate> = (0..count)
        .map(|_| offset(options.today, rng.gen_range(-180..=365)))
        .collect();
    liquidation_dates.shuffle(&mut rng);

    let target_ieepa = rng.gen_range(10..=15);
    let hts_codes: Vec<String> = (0..count)
        .map(|i| {
            if i < target_ieepa {
                format!("9903.{:02}.{:04}", rng.gen_range(10..=99), rng.gen_range(1000..=9999))
            } else {
                format!(
                    "{:02}{:02}.{:02}.{:04}",
                    rng.gen_range(1..=97),
                    rng.gen_range(10..=99),
                    rng.gen_range(10..=99),
                    rng.gen_range(1000..=9999)
                )
            }
        })
        .collect();

    let mut entries = Vec::with_capacity(count);
    let mut liquidations = Vec::with_capacity(count);
    let mut importers = Vec::with_capacity(count);

    for i in 0..count {
        let is_ieepa = hts_codes[i].starts_with("9903");

        let duties_paid = if is_ieepa {
            round_cents(rng.gen_range(5_000.0..50_000.0))
        } else {
            round_cents(rng.gen_range(100.0..10_000.0))
        };
        let entered_value = round_cents(duties_paid * rng.gen_range(10.0..50.0));

        entries.push(EntrySummaryRow {
            entry_number: entry_numbers[i].clone(),
            hts_code: hts_codes[i].clone(),
            duties_paid,
            entered_value,
        });

        let liquidation_status = if rng.gen_bool(0.9) {
            "Liquidated"
        } else {
            LIQUIDATION_OTHER.choose(&mut rng).copied().unwrap_or("Pending")
        };

        let no_protest_prob = if is_ieepa { 0.80 } else { 0.85 };
        let protest_status = if rng.gen_bool(no_protest_prob) {
            "None"
        } else {
            PROTEST_FILED.choose(&mut rng).copied().unwrap_or("Filed")
        };

        liquidations.push(LiquidationRow {
            entry_number: entry_numbers[i].clone(),
            liquidation_date: liquidation_dates[i].to_string(),
            liquidation_status: liquidation_status.to_string(),
            protest_status: protest_status.to_string(),
        });

        importers.push(ImporterRow {
            entry_number: entry_numbers[i].clone(),
            importer_name: format!("Importer {}", rng.gen_range(1..=20)),
            port_of_entry: PORTS.choose(&mut rng).copied().unwrap_or("LAX").to_string(),
            entry_date: offset(options.today, -rng.gen_range(0..=365)).to_string(),
        });
    }

    MockDataset {
        entries,
        liquidations,
        importers,
    }
}
