// 📥 Record Normalizer - CSV report → typed source table
//
// Each of the three ACE reports is read into a `SourceTable`:
// - the join key (`entry_number`) is re-encoded as an 11-character,
//   zero-padded string
// - date columns become `Value::Date`; `duties_paid` must be numeric
// - `entered_value` is informational: numeric when it parses, text otherwise
// - every other column keeps its raw text, or a numeric type when every
//   non-missing cell in that column is numeric
//
// A single bad cell fails the whole read. There is no per-row skipping.

use crate::error::{ClaimsError, Result};
use crate::value::{is_missing, parse_amount, parse_date, Value};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Join key column shared by all three reports.
pub const KEY_COLUMN: &str = "entry_number";

/// Width of a normalized entry number.
pub const ENTRY_ID_WIDTH: usize = 11;

// ============================================================================
// SOURCE KIND
// ============================================================================

/// Which ACE report a table came from. Drives the expected schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Report 1: HTS codes, duties paid, entered values. Authoritative for rows.
    EntrySummary,
    /// Report 2: liquidation date/status and protest status.
    LiquidationStatus,
    /// Report 3: importer metadata, carried through untouched.
    ImporterStatement,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::EntrySummary => "entry_summary",
            SourceKind::LiquidationStatus => "liquidation_status",
            SourceKind::ImporterStatement => "importer_statement",
        }
    }

    /// Columns that must be present in the header row.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            SourceKind::EntrySummary => &[KEY_COLUMN, "hts_code", "duties_paid", "entered_value"],
            SourceKind::LiquidationStatus => &[
                KEY_COLUMN,
                "liquidation_date",
                "liquidation_status",
                "protest_status",
            ],
            SourceKind::ImporterStatement => &[KEY_COLUMN],
        }
    }

    pub fn date_columns(&self) -> &'static [&'static str] {
        match self {
            SourceKind::LiquidationStatus => &["liquidation_date"],
            _ => &[],
        }
    }

    /// Amounts the calculators rely on. A non-numeric cell fails the read.
    pub fn amount_columns(&self) -> &'static [&'static str] {
        match self {
            SourceKind::EntrySummary => &["duties_paid"],
            _ => &[],
        }
    }

    /// Amounts carried for reference only. Unparsable cells stay text.
    pub fn informational_amount_columns(&self) -> &'static [&'static str] {
        match self {
            SourceKind::EntrySummary => &["entered_value"],
            _ => &[],
        }
    }

    /// Columns that always stay text, even when every cell looks numeric.
    fn text_columns(&self) -> &'static [&'static str] {
        match self {
            SourceKind::EntrySummary => &["hts_code"],
            SourceKind::LiquidationStatus => &["liquidation_status", "protest_status"],
            SourceKind::ImporterStatement => &[],
        }
    }
}

// ============================================================================
// SOURCE TABLE
// ============================================================================

/// One normalized report: ordered columns, ordered rows.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub kind: SourceKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    key_index: usize,
}

impl SourceTable {
    /// Build a table from already-typed parts. Fails if the key column is absent.
    pub fn new(kind: SourceKind, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let key_index = columns
            .iter()
            .position(|c| c == KEY_COLUMN)
            .ok_or_else(|| ClaimsError::schema(kind.name(), KEY_COLUMN))?;

        Ok(SourceTable {
            kind,
            columns,
            rows,
            key_index,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn key_index(&self) -> usize {
        self.key_index
    }

    /// Normalized entry number of a row.
    pub fn key(&self, row: usize) -> &str {
        self.rows[row][self.key_index].as_str().unwrap_or("")
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Zero-pad an entry number to 11 characters.
///
/// Integer-looking values are canonicalized first, so `"1"`, `"01"` and
/// `"00000000001"` all map to `"00000000001"`. Values already longer than
/// 11 characters pass through unchanged (never truncated).
pub fn normalize_entry_number(raw: &str) -> String {
    let trimmed = raw.trim();
    let canonical = match trimmed.parse::<u64>() {
        Ok(n) => n.to_string(),
        Err(_) => trimmed.to_string(),
    };
    format!("{:0>width$}", canonical, width = ENTRY_ID_WIDTH)
}

/// Read one report from a CSV file on disk.
pub fn read_source_file(kind: SourceKind, path: &Path) -> Result<SourceTable> {
    let file = File::open(path).map_err(|e| {
        ClaimsError::source_read(kind.name(), format!("cannot open {}: {}", path.display(), e))
    })?;
    read_source(kind, file)
}

/// Read one report from any CSV byte stream with a header row.
pub fn read_source<R: Read>(kind: SourceKind, reader: R) -> Result<SourceTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| ClaimsError::source_read(kind.name(), format!("invalid header row: {}", e)))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    for required in kind.required_columns() {
        if !columns.iter().any(|c| c == required) {
            return Err(ClaimsError::schema(kind.name(), required));
        }
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| {
            ClaimsError::source_read(
                kind.name(),
                format!("CSV line {}: {}", line_num + 2, e),
            )
        })?;
        raw_rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    let mut rows: Vec<Vec<Value>> = vec![Vec::with_capacity(columns.len()); raw_rows.len()];
    for (col, name) in columns.iter().enumerate() {
        let cells: Vec<&str> = raw_rows.iter().map(|r| r[col].as_str()).collect();
        let typed = coerce_column(kind, name, &cells)?;
        for (row, value) in rows.iter_mut().zip(typed) {
            row.push(value);
        }
    }

    debug!(
        source = kind.name(),
        rows = rows.len(),
        columns = columns.len(),
        "normalized source"
    );

    SourceTable::new(kind, columns, rows)
}

fn coerce_column(kind: SourceKind, name: &str, cells: &[&str]) -> Result<Vec<Value>> {
    if name == KEY_COLUMN {
        return cells
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                if raw.trim().is_empty() {
                    Err(ClaimsError::source_read(
                        kind.name(),
                        format!("CSV line {}: empty {}", i + 2, KEY_COLUMN),
                    ))
                } else {
                    Ok(Value::Text(normalize_entry_number(raw)))
                }
            })
            .collect();
    }

    if kind.date_columns().contains(&name) {
        return cells
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                if is_missing(raw) {
                    return Ok(Value::Null);
                }
                parse_date(raw).map(Value::Date).ok_or_else(|| {
                    ClaimsError::source_read(
                        kind.name(),
                        format!("CSV line {}: unparsable date '{}' in {}", i + 2, raw, name),
                    )
                })
            })
            .collect();
    }

    if kind.amount_columns().contains(&name) {
        let amounts = cells
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                if is_missing(raw) {
                    return Ok(None);
                }
                parse_amount(raw).map(Some).ok_or_else(|| {
                    ClaimsError::source_read(
                        kind.name(),
                        format!("CSV line {}: invalid amount '{}' in {}", i + 2, raw, name),
                    )
                })
            })
            .collect::<Result<Vec<Option<f64>>>>()?;
        return Ok(amount_values(cells, &amounts));
    }

    if kind.informational_amount_columns().contains(&name) {
        let amounts: Vec<Option<f64>> = cells.iter().map(|raw| parse_amount(raw)).collect();
        if cells.iter().zip(&amounts).all(|(raw, a)| a.is_some() || is_missing(raw)) {
            return Ok(amount_values(cells, &amounts));
        }
        return Ok(cells
            .iter()
            .zip(amounts)
            .map(|(raw, amount)| match amount {
                Some(n) => Value::Number(n),
                None => text_or_null(raw),
            })
            .collect());
    }

    if kind.text_columns().contains(&name) {
        return Ok(cells.iter().map(|raw| text_or_null(raw)).collect());
    }

    Ok(infer_column(cells))
}

/// A fully populated column of whole amounts stays integer, so `1000` is
/// exported as `1000`. Any gap or fraction makes the whole column float.
fn amount_values(cells: &[&str], amounts: &[Option<f64>]) -> Vec<Value> {
    let whole = amounts.iter().all(|a| matches!(a, Some(n) if n.fract() == 0.0 && n.abs() < 1e15))
        && cells.iter().all(|raw| !raw.contains('.'));

    amounts
        .iter()
        .map(|a| match a {
            Some(n) if whole => Value::Integer(*n as i64),
            other => Value::from(*other),
        })
        .collect()
}

fn text_or_null(raw: &str) -> Value {
    if is_missing(raw) {
        Value::Null
    } else {
        Value::Text(raw.to_string())
    }
}

/// Pass-through columns: integer if every present cell is an integer,
/// number if every present cell is numeric, otherwise text.
fn infer_column(cells: &[&str]) -> Vec<Value> {
    let present: Vec<&str> = cells.iter().copied().filter(|c| !is_missing(c)).collect();

    if !present.is_empty() && present.iter().all(|c| c.trim().parse::<i64>().is_ok()) {
        return cells
            .iter()
            .map(|c| c.trim().parse::<i64>().map(Value::Integer).unwrap_or(Value::Null))
            .collect();
    }

    if !present.is_empty() && present.iter().all(|c| c.trim().parse::<f64>().is_ok()) {
        return cells
            .iter()
            .map(|c| Value::from(c.trim().parse::<f64>().ok()))
            .collect();
    }

    cells.iter().map(|raw| text_or_null(raw)).collect()
}
