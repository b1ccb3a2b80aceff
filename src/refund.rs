// 💰 Eligibility & Refund Calculator
//
// Per-row pure function. Gates are checked in order and the first one that
// fails yields a zero refund:
//   1. HTS code is an IEEPA tariff (cleaned code starts with "9903")
//   2. Entry is liquidated
//   3. No protest on file
// When all gates pass, the refund is the full duties paid, never below zero.

use crate::record::EntryRecord;
use serde::{Deserialize, Serialize};

/// Chapter 99 prefix that marks an IEEPA emergency tariff line.
pub const IEEPA_PREFIX: &str = "9903";

/// Protest status values that mean "no protest", compared trimmed and lower-cased.
pub const NO_PROTEST_MARKERS: &[&str] = &["none", "na", "", "nan"];

// ============================================================================
// DECISION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RefundDecision {
    /// All gates passed; refund equals duties paid (0.0 if missing or negative)
    Eligible { amount: f64 },

    /// HTS code missing or not an IEEPA line
    NotIeepa,

    /// Liquidation status is anything other than "liquidated"
    NotLiquidated,

    /// A real protest is already on file
    ProtestOnFile,
}

impl RefundDecision {
    pub fn amount(&self) -> f64 {
        match self {
            RefundDecision::Eligible { amount } => *amount,
            _ => 0.0,
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, RefundDecision::Eligible { .. })
    }
}

// ============================================================================
// GATES
// ============================================================================

/// Remove `.`, `-` and whitespace from an HTS code.
pub fn clean_hts_code(code: &str) -> String {
    code.chars()
        .filter(|c| *c != '.' && *c != '-' && !c.is_whitespace())
        .collect()
}

pub fn is_ieepa_tariff(code: Option<&str>) -> bool {
    match code {
        Some(code) => clean_hts_code(code).starts_with(IEEPA_PREFIX),
        None => false,
    }
}

pub fn is_liquidated(status: Option<&str>) -> bool {
    status
        .map(|s| s.trim().to_lowercase() == "liquidated")
        .unwrap_or(false)
}

/// A missing protest status means no protest.
pub fn has_protest(status: Option<&str>) -> bool {
    match status {
        Some(s) => {
            let normalized = s.trim().to_lowercase();
            !NO_PROTEST_MARKERS.contains(&normalized.as_str())
        }
        None => false,
    }
}

pub fn assess(record: &EntryRecord) -> RefundDecision {
    if !is_ieepa_tariff(record.hts_code) {
        return RefundDecision::NotIeepa;
    }

    if !is_liquidated(record.liquidation_status) {
        return RefundDecision::NotLiquidated;
    }

    if has_protest(record.protest_status) {
        return RefundDecision::ProtestOnFile;
    }

    RefundDecision::Eligible {
        amount: record
            .duties_paid
            .filter(|d| d.is_finite())
            .unwrap_or(0.0)
            .max(0.0),
    }
}

/// Estimated duty refund for one entry.
pub fn refund_due(record: &EntryRecord) -> f64 {
    assess(record).amount()
}
