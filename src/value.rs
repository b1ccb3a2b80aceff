// 🧱 Cell values - one nullable, typed cell per column per row
//
// Missing data is always `Value::Null`. There are no NaN/NaT sentinels
// anywhere downstream of the normalizer.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;

/// Canonical output format for every date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw strings read as "no value" (same markers a dataframe CSV reader treats as NA).
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "<NA>", "N/A", "n/a", "NA", "NULL", "null", "NaN", "nan",
    "-NaN", "-nan", "None",
];

/// Date-only layouts accepted by `parse_date`, tried in order.
const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y", "%Y%m%d", "%d %b %Y", "%b %d, %Y", "%B %d, %Y",
];

/// Timestamp layouts; the time part is dropped.
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// ============================================================================
// VALUE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the cell. Non-finite numbers count as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Text form of the cell regardless of type; `None` only for null.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Rendering used by CSV export. Null becomes an empty field.
    pub fn to_csv_field(&self) -> String {
        self.to_text().unwrap_or_default()
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(n) if n.is_finite() => Value::Number(n),
            _ => Value::Null,
        }
    }
}

impl From<Option<i64>> for Value {
    fn from(v: Option<i64>) -> Self {
        v.map(Value::Integer).unwrap_or(Value::Null)
    }
}

impl From<Option<NaiveDate>> for Value {
    fn from(v: Option<NaiveDate>) -> Self {
        v.map(Value::Date).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Number(_) => serializer.serialize_none(),
            Value::Date(d) => serializer.serialize_str(&d.format(DATE_FORMAT).to_string()),
        }
    }
}

/// Floats keep a trailing `.0` when integral so amounts stay visibly decimal.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// COERCION HELPERS
// ============================================================================

pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING_MARKERS.iter().any(|m| *m == trimmed)
}

/// Parse a date in any of the common layouts; `None` if nothing matches.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    for layout in DATE_LAYOUTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, layout) {
            return Some(d);
        }
    }

    for layout in DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parse a monetary amount. Accepts thousands separators and a leading `$`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        assert_eq!(parse_date("2025-03-14"), Some(expected));
        assert_eq!(parse_date(" 2025/03/14 "), Some(expected));
        assert_eq!(parse_date("03/14/2025"), Some(expected));
        assert_eq!(parse_date("2025-03-14 08:30:00"), Some(expected));
        assert_eq!(parse_date("2025-03-14T23:59:59Z"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2025-02-30"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1000"), Some(1000.0));
        assert_eq!(parse_amount("$1,234.50"), Some(1234.5));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_missing_markers() {
        assert!(is_missing(""));
        assert!(is_missing("  NaN "));
        assert!(is_missing("None"));
        assert!(!is_missing("Filed"));
        assert!(!is_missing("0"));
    }

    #[test]
    fn test_display_and_json() {
        assert_eq!(Value::Number(1000.0).to_string(), "1000.0");
        assert_eq!(Value::Number(12.25).to_string(), "12.25");
        assert_eq!(Value::Integer(-20).to_string(), "-20");
        assert_eq!(Value::Null.to_csv_field(), "");

        let date = Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(date.to_string(), "2024-01-05");

        let json = serde_json::to_string(&vec![
            Value::Null,
            Value::Number(f64::NAN),
            date,
            Value::Text("LAX".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,null,"2024-01-05","LAX"]"#);
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Integer(5).as_f64(), Some(5.0));
        assert_eq!(Value::Number(f64::NAN).as_f64(), None);
        assert_eq!(Value::Text("5".to_string()).as_f64(), None);
        assert_eq!(Value::from(Some(f64::INFINITY)), Value::Null);
    }
}
