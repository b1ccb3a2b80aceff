use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use ieepa_claims::deadline::URGENT_WINDOW_DAYS;
use ieepa_claims::enriched::{DAYS_REMAINING_COLUMN, DEADLINE_COLUMN, REFUND_COLUMN};
use ieepa_claims::logging::init_logging;
use ieepa_claims::mock::{generate, MockOptions};
use ieepa_claims::{AppConfig, ClaimsPipeline, Clock, EnrichedTable, FixedClock, RiskSummary};

/// Rows listed per section of the text report.
const SAMPLE_ROWS: usize = 5;

#[derive(Parser)]
#[command(name = "ieepa-claims")]
#[command(about = "Merge ACE reports and flag IEEPA refund and protest-deadline risk")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (default: ./ieepa.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Evaluate days_remaining as of this date (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the reports, compute refunds and deadlines, print the risk summary
    Process {
        /// Report 1: entry summary CSV
        #[arg(long)]
        entry_summary: PathBuf,

        /// Report 2: liquidation status CSV
        #[arg(long)]
        liquidation: PathBuf,

        /// Report 3: importer statement CSV (optional)
        #[arg(long)]
        importer: Option<PathBuf>,

        /// Write the enriched table to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the enriched table and summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write demo ACE report CSVs
    GenerateMock {
        /// Output directory
        #[arg(short, long, default_value = "data")]
        out: PathBuf,

        /// Number of entries
        #[arg(short = 'n', long, default_value = "50")]
        count: usize,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging.filter);

    if let Err(e) = run(cli, config) {
        error!("{:#}", e);
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let clock: Box<dyn Clock> = match cli.today {
        Some(date) => Box::new(FixedClock(date)),
        None => config.pipeline.clock(),
    };

    match cli.command {
        Commands::Process {
            entry_summary,
            liquidation,
            importer,
            output,
            json,
        } => {
            let mut pipeline = ClaimsPipeline::with_clock(clock);
            pipeline
                .process_files(&entry_summary, &liquidation, importer.as_deref())
                .context("Processing failed")?;
            let summary = pipeline.summary()?;

            if let Some(path) = &output {
                pipeline
                    .export(path)
                    .with_context(|| format!("Failed to export to {}", path.display()))?;
            }

            let Some(table) = pipeline.result() else {
                anyhow::bail!("pipeline produced no result");
            };

            if json {
                let body = serde_json::json!({
                    "success": true,
                    "data": table,
                    "summary": summary,
                    "total_records": table.len(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print_report(table, &summary);
                if let Some(path) = &output {
                    println!("\n💾 Exported {} rows to {}", table.len(), path.display());
                }
            }
        }

        Commands::GenerateMock { out, count, seed } => {
            let options = MockOptions {
                count,
                seed,
                today: clock.today(),
            };
            let dataset = generate(&options);
            let files = dataset.write_to_dir(&out)?;

            println!("✓ Generated {} mock entries", dataset.entries.len());
            println!("✓ {} with {} IEEPA tariffs", files.entry_summary.display(), dataset.ieepa_count());
            println!("✓ {}", files.liquidation_status.display());
            println!("✓ {}", files.importer_statement.display());
        }
    }

    Ok(())
}

fn print_report(table: &EnrichedTable, summary: &RiskSummary) {
    println!("📈 Risk Summary (as of {})", table.as_of);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Total Entries:               {}", summary.total_entries);
    println!("  Refund Eligible:             {}", summary.refund_eligible_count);
    println!("  Urgent Deadlines (<{} days): {}", URGENT_WINDOW_DAYS, summary.urgent_deadlines);
    println!("  Overdue Deadlines:           {}", summary.overdue_deadlines);
    println!("  Total Refund Value:          ${:.2}", summary.total_refund_value);
    println!("  Average Refund:              ${:.2}", summary.average_refund);

    let cell = |i: usize, c: &str| table.get(i, c).map(|v| v.to_csv_field()).unwrap_or_default();

    let eligible: Vec<usize> = table.refund_eligible_rows().take(SAMPLE_ROWS).collect();
    if !eligible.is_empty() {
        println!("\n💰 Sample refund-eligible entries:");
        println!("  {:<13} {:<14} {:>14} {:>6}", "entry_number", "hts_code", REFUND_COLUMN, "days");
        for i in eligible {
            println!(
                "  {:<13} {:<14} {:>14} {:>6}",
                table.record(i).entry_number,
                table.record(i).hts_code.unwrap_or(""),
                format!("{:.2}", table.rows[i].derived.calculated_refund_due),
                cell(i, DAYS_REMAINING_COLUMN)
            );
        }
    }

    let urgent: Vec<usize> = table.urgent_rows().take(SAMPLE_ROWS).collect();
    if !urgent.is_empty() {
        println!("\n⚠️  Urgent entries (<{} days remaining):", URGENT_WINDOW_DAYS);
        println!("  {:<13} {:<12} {:>6} {:>14}", "entry_number", DEADLINE_COLUMN, "days", REFUND_COLUMN);
        for i in urgent {
            println!(
                "  {:<13} {:<12} {:>6} {:>14}",
                table.record(i).entry_number,
                cell(i, DEADLINE_COLUMN),
                cell(i, DAYS_REMAINING_COLUMN),
                format!("{:.2}", table.rows[i].derived.calculated_refund_due)
            );
        }
    }
}
