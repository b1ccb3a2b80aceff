// 📄 Entry Record - typed per-row view over a joined table
//
// The joined table stays column-ordered and open-ended (extra columns pass
// through). Calculators never look at it directly: they get an
// `EntryRecord`, a borrowed view of the fields they care about.

use crate::normalize::KEY_COLUMN;
use crate::value::Value;
use chrono::NaiveDate;

/// The fields of one customs entry that drive the derived columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRecord<'a> {
    pub entry_number: &'a str,
    pub hts_code: Option<&'a str>,
    pub duties_paid: Option<f64>,
    /// Informational only; not used by any calculation.
    pub entered_value: Option<f64>,
    pub liquidation_date: Option<NaiveDate>,
    pub liquidation_status: Option<&'a str>,
    pub protest_status: Option<&'a str>,
}

impl<'a> EntryRecord<'a> {
    /// A record with only an entry number; everything else missing.
    pub fn bare(entry_number: &'a str) -> Self {
        EntryRecord {
            entry_number,
            hts_code: None,
            duties_paid: None,
            entered_value: None,
            liquidation_date: None,
            liquidation_status: None,
            protest_status: None,
        }
    }
}

/// Column positions of the record fields, resolved once per table.
///
/// A column absent from the table yields `None` for every row.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordLayout {
    entry_number: Option<usize>,
    hts_code: Option<usize>,
    duties_paid: Option<usize>,
    entered_value: Option<usize>,
    liquidation_date: Option<usize>,
    liquidation_status: Option<usize>,
    protest_status: Option<usize>,
}

impl RecordLayout {
    pub fn resolve(columns: &[String]) -> Self {
        let find = |name: &str| columns.iter().position(|c| c == name);
        RecordLayout {
            entry_number: find(KEY_COLUMN),
            hts_code: find("hts_code"),
            duties_paid: find("duties_paid"),
            entered_value: find("entered_value"),
            liquidation_date: find("liquidation_date"),
            liquidation_status: find("liquidation_status"),
            protest_status: find("protest_status"),
        }
    }

    pub fn record<'a>(&self, row: &'a [Value]) -> EntryRecord<'a> {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));

        EntryRecord {
            entry_number: cell(self.entry_number).and_then(Value::as_str).unwrap_or(""),
            hts_code: cell(self.hts_code).and_then(Value::as_str),
            duties_paid: cell(self.duties_paid).and_then(Value::as_f64),
            entered_value: cell(self.entered_value).and_then(Value::as_f64),
            liquidation_date: cell(self.liquidation_date).and_then(Value::as_date),
            liquidation_status: cell(self.liquidation_status).and_then(Value::as_str),
            protest_status: cell(self.protest_status).and_then(Value::as_str),
        }
    }
}
