// 📊 Enriched Table - joined entries plus derived refund/deadline columns
//
// Output schema = every joined input column, in order, followed by
//   calculated_refund_due, protest_deadline, days_remaining
// Dates render as YYYY-MM-DD. Missing values render as an empty CSV field
// and as JSON `null`.

use crate::deadline::{days_remaining, protest_deadline, DeadlineStatus};
use crate::error::Result;
use crate::join::JoinedTable;
use crate::record::{EntryRecord, RecordLayout};
use crate::refund::refund_due;
use crate::value::Value;
use chrono::NaiveDate;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::io::Write;

pub const REFUND_COLUMN: &str = "calculated_refund_due";
pub const DEADLINE_COLUMN: &str = "protest_deadline";
pub const DAYS_REMAINING_COLUMN: &str = "days_remaining";

pub const DERIVED_COLUMNS: [&str; 3] = [REFUND_COLUMN, DEADLINE_COLUMN, DAYS_REMAINING_COLUMN];

// ============================================================================
// DERIVED FIELDS
// ============================================================================

/// The three computed values for one entry. Never read from input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedFields {
    pub calculated_refund_due: f64,
    pub protest_deadline: Option<NaiveDate>,
    pub days_remaining: Option<i64>,
}

impl DerivedFields {
    pub fn compute(record: &EntryRecord, today: NaiveDate) -> Self {
        let deadline = protest_deadline(record.liquidation_date);
        DerivedFields {
            calculated_refund_due: refund_due(record),
            protest_deadline: deadline,
            days_remaining: days_remaining(deadline, today),
        }
    }

    fn values(&self) -> [Value; 3] {
        [
            Value::Number(self.calculated_refund_due),
            Value::from(self.protest_deadline),
            Value::from(self.days_remaining),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct EnrichedRow {
    pub values: Vec<Value>,
    pub derived: DerivedFields,
}

// ============================================================================
// ENRICHED TABLE
// ============================================================================

#[derive(Debug, Clone)]
pub struct EnrichedTable {
    /// Input columns only; derived columns are appended on output.
    pub columns: Vec<String>,
    pub rows: Vec<EnrichedRow>,
    /// The "today" every `days_remaining` was computed against.
    pub as_of: NaiveDate,
    layout: RecordLayout,
}

impl EnrichedTable {
    /// Map every joined row through the calculators, keeping row order.
    ///
    /// Input columns that share a name with a derived column are replaced by
    /// the computed value.
    pub fn from_joined(joined: JoinedTable, today: NaiveDate) -> Self {
        let keep: Vec<usize> = joined
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| !DERIVED_COLUMNS.contains(&name.as_str()))
            .map(|(i, _)| i)
            .collect();

        let columns: Vec<String> = keep.iter().map(|&i| joined.columns[i].clone()).collect();
        let layout = RecordLayout::resolve(&columns);

        let rows = joined
            .rows
            .into_iter()
            .map(|row| {
                let values: Vec<Value> = if keep.len() == row.len() {
                    row
                } else {
                    keep.iter().map(|&i| row[i].clone()).collect()
                };
                let derived = DerivedFields::compute(&layout.record(&values), today);
                EnrichedRow { values, derived }
            })
            .collect();

        EnrichedTable {
            columns,
            rows,
            as_of: today,
            layout,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Full output header: input columns then derived columns.
    pub fn output_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .cloned()
            .chain(DERIVED_COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }

    pub fn record(&self, row: usize) -> EntryRecord<'_> {
        self.layout.record(&self.rows[row].values)
    }

    /// Output row in `output_columns` order.
    pub fn output_row(&self, row: usize) -> Vec<Value> {
        let r = &self.rows[row];
        r.values.iter().cloned().chain(r.derived.values()).collect()
    }

    /// Cell lookup by output column name, derived columns included.
    pub fn get(&self, row: usize, column: &str) -> Option<Value> {
        let r = self.rows.get(row)?;
        if let Some(pos) = DERIVED_COLUMNS.iter().position(|c| *c == column) {
            return Some(r.derived.values()[pos].clone());
        }
        let idx = self.columns.iter().position(|c| c == column)?;
        r.values.get(idx).cloned()
    }

    /// Find a row by normalized entry number.
    pub fn find(&self, entry_number: &str) -> Option<usize> {
        (0..self.rows.len()).find(|&i| self.record(i).entry_number == entry_number)
    }

    /// Rows with a positive refund, in table order.
    pub fn refund_eligible_rows(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows.len()).filter(|&i| self.rows[i].derived.calculated_refund_due > 0.0)
    }

    /// Rows whose protest window closes within the urgent window, in table order.
    pub fn urgent_rows(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows.len()).filter(|&i| {
            DeadlineStatus::classify(self.rows[i].derived.days_remaining) == DeadlineStatus::Urgent
        })
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.output_columns())?;

        for i in 0..self.rows.len() {
            let fields: Vec<String> = self.output_row(i).iter().map(Value::to_csv_field).collect();
            wtr.write_record(&fields)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

struct RowView<'a> {
    table: &'a EnrichedTable,
    row: usize,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let columns = self.table.output_columns();
        let values = self.table.output_row(self.row);
        let mut map = serializer.serialize_map(Some(columns.len()))?;
        for (name, value) in columns.iter().zip(values.iter()) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Serializes as an array of row objects keyed by output column name.
impl Serialize for EnrichedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in 0..self.rows.len() {
            seq.serialize_element(&RowView { table: self, row })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::join;
    use crate::normalize::{read_source, SourceKind};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    fn enriched() -> EnrichedTable {
        let entries = "entry_number,hts_code,duties_paid,entered_value\n\
                       1,9903.01.1234,1000,25000\n\
                       2,8501.10.0000,300,4000\n";
        let liquidation = "entry_number,liquidation_date,liquidation_status,protest_status\n\
                           1,2025-03-15,Liquidated,None\n";

        let primary = read_source(SourceKind::EntrySummary, entries.as_bytes()).unwrap();
        let liq = read_source(SourceKind::LiquidationStatus, liquidation.as_bytes()).unwrap();
        EnrichedTable::from_joined(join(primary, &[liq]), today())
    }

    #[test]
    fn test_derived_columns_appended() {
        let table = enriched();
        let columns = table.output_columns();

        assert_eq!(columns.len(), 4 + 3 + 3);
        assert_eq!(&columns[columns.len() - 3..], &DERIVED_COLUMNS.map(String::from));

        assert_eq!(table.get(0, REFUND_COLUMN), Some(Value::Number(1000.0)));
        assert_eq!(
            table.get(0, DEADLINE_COLUMN),
            Some(Value::Date(NaiveDate::from_ymd_opt(2025, 9, 11).unwrap()))
        );
        assert_eq!(table.get(0, DAYS_REMAINING_COLUMN), Some(Value::Integer(-20)));

        assert_eq!(table.get(1, REFUND_COLUMN), Some(Value::Number(0.0)));
        assert_eq!(table.get(1, DEADLINE_COLUMN), Some(Value::Null));
        assert_eq!(table.get(1, "liquidation_date"), Some(Value::Null));
        assert_eq!(table.get(1, "no_such_column"), None);
    }

    #[test]
    fn test_row_selectors() {
        let table = enriched();
        assert_eq!(table.refund_eligible_rows().collect::<Vec<_>>(), vec![0]);
        // Row 0 is overdue and row 1 has no deadline
        assert_eq!(table.urgent_rows().count(), 0);

        let entries = "entry_number,hts_code,duties_paid,entered_value\n\
                       1,9903.01.1234,1000,25000\n\
                       2,9903.01.1234,500,25000\n";
        let liquidation = "entry_number,liquidation_date,liquidation_status,protest_status\n\
                           1,2025-06-01,Liquidated,Filed\n\
                           2,2025-09-01,Liquidated,None\n";
        let primary = read_source(SourceKind::EntrySummary, entries.as_bytes()).unwrap();
        let liq = read_source(SourceKind::LiquidationStatus, liquidation.as_bytes()).unwrap();
        let table = EnrichedTable::from_joined(join(primary, &[liq]), today());

        assert_eq!(table.refund_eligible_rows().collect::<Vec<_>>(), vec![1]);
        assert_eq!(table.urgent_rows().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_csv_export_format() {
        let table = enriched();
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "entry_number,hts_code,duties_paid,entered_value,liquidation_date,liquidation_status,protest_status,calculated_refund_due,protest_deadline,days_remaining"
        );
        assert_eq!(
            lines[1],
            "00000000001,9903.01.1234,1000,25000,2025-03-15,Liquidated,,1000.0,2025-09-11,-20"
        );
        assert_eq!(lines[2], "00000000002,8501.10.0000,300,4000,,,,0.0,,");
    }

    #[test]
    fn test_json_uses_null_for_missing() {
        let table = enriched();
        let json = serde_json::to_value(&table).unwrap();

        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["entry_number"], "00000000001");
        assert_eq!(rows[0]["days_remaining"], -20);
        assert_eq!(rows[0]["protest_deadline"], "2025-09-11");
        assert!(rows[1]["protest_deadline"].is_null());
        assert!(rows[1]["days_remaining"].is_null());
        assert_eq!(rows[1]["calculated_refund_due"], 0.0);
    }

    #[test]
    fn test_input_column_named_like_derived_is_replaced() {
        let entries = "entry_number,hts_code,duties_paid,entered_value,days_remaining\n\
                       1,8501.10.0000,1,1,999\n";
        let primary = read_source(SourceKind::EntrySummary, entries.as_bytes()).unwrap();
        let table = EnrichedTable::from_joined(join(primary, &[]), today());

        let columns = table.output_columns();
        assert_eq!(columns.iter().filter(|c| c.as_str() == "days_remaining").count(), 1);
        assert_eq!(table.get(0, DAYS_REMAINING_COLUMN), Some(Value::Null));
    }

    #[test]
    fn test_find_by_entry_number() {
        let table = enriched();
        assert_eq!(table.find("00000000002"), Some(1));
        assert_eq!(table.find("2"), None);
    }
}
