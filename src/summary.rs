// 📈 Summary Aggregator - portfolio-level risk snapshot
//
// Pure reduction over one Enriched Table:
//   refund_eligible  = rows with calculated_refund_due > 0
//   urgent           = rows with 0 <= days_remaining < 90
//   overdue          = rows with days_remaining < 0
// Rows without a days_remaining are in neither deadline bucket.

use crate::deadline::DeadlineStatus;
use crate::enriched::EnrichedTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total_entries: usize,
    pub refund_eligible_count: usize,
    pub urgent_deadlines: usize,
    pub overdue_deadlines: usize,
    pub total_refund_value: f64,
    /// Mean refund over eligible rows; 0.0 when none are eligible.
    pub average_refund: f64,
}

impl RiskSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} entries: {} refund-eligible (${:.2} total, ${:.2} avg), {} urgent, {} overdue",
            self.total_entries,
            self.refund_eligible_count,
            self.total_refund_value,
            self.average_refund,
            self.urgent_deadlines,
            self.overdue_deadlines
        )
    }
}

pub fn summarize(table: &EnrichedTable) -> RiskSummary {
    let mut refund_eligible_count = 0;
    let mut total_refund_value = 0.0;
    let mut urgent_deadlines = 0;
    let mut overdue_deadlines = 0;

    for row in &table.rows {
        let refund = row.derived.calculated_refund_due;
        if refund > 0.0 {
            refund_eligible_count += 1;
            total_refund_value += refund;
        }

        match DeadlineStatus::classify(row.derived.days_remaining) {
            DeadlineStatus::Urgent => urgent_deadlines += 1,
            DeadlineStatus::Overdue => overdue_deadlines += 1,
            DeadlineStatus::Open | DeadlineStatus::Unknown => {}
        }
    }

    let average_refund = if refund_eligible_count > 0 {
        total_refund_value / refund_eligible_count as f64
    } else {
        0.0
    };

    RiskSummary {
        total_entries: table.len(),
        refund_eligible_count,
        urgent_deadlines,
        overdue_deadlines,
        total_refund_value,
        average_refund,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::join;
    use crate::normalize::{read_source, SourceKind};
    use chrono::NaiveDate;

    fn table(entries: &str, liquidation: &str) -> EnrichedTable {
        let today = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let primary = read_source(SourceKind::EntrySummary, entries.as_bytes()).unwrap();
        let liq = read_source(SourceKind::LiquidationStatus, liquidation.as_bytes()).unwrap();
        EnrichedTable::from_joined(join(primary, &[liq]), today)
    }

    #[test]
    fn test_summary_counts() {
        // Deadlines relative to 2025-10-01:
        //   1: liquidated 2025-03-15 -> 2025-09-11, -20 (overdue)
        //   2: liquidated 2025-05-01 -> 2025-10-28, 27 (urgent)
        //   3: liquidated 2025-09-01 -> 2026-02-28, 150 (open)
        //   4: no liquidation row
        let entries = "entry_number,hts_code,duties_paid,entered_value\n\
                       1,9903.01.1234,1000,1\n\
                       2,9903.02.0000,3000,1\n\
                       3,8501.10.0000,500,1\n\
                       4,9903.03.0000,800,1\n";
        let liquidation = "entry_number,liquidation_date,liquidation_status,protest_status\n\
                           1,2025-03-15,Liquidated,None\n\
                           2,2025-05-01,Liquidated,\n\
                           3,2025-09-01,Liquidated,None\n";

        let summary = summarize(&table(entries, liquidation));

        assert_eq!(summary.total_entries, 4);
        assert_eq!(summary.refund_eligible_count, 2);
        assert_eq!(summary.overdue_deadlines, 1);
        assert_eq!(summary.urgent_deadlines, 1);
        assert_eq!(summary.total_refund_value, 4000.0);
        assert_eq!(summary.average_refund, 2000.0);

        println!("✅ Test passed: {}", summary.summary());
    }

    #[test]
    fn test_average_is_zero_without_eligible_rows() {
        let entries = "entry_number,hts_code,duties_paid,entered_value\n\
                       1,8501.10.0000,1000,1\n";
        let liquidation = "entry_number,liquidation_date,liquidation_status,protest_status\n\
                           1,2025-09-20,Liquidated,Filed\n";

        let summary = summarize(&table(entries, liquidation));

        assert_eq!(summary.refund_eligible_count, 0);
        assert_eq!(summary.total_refund_value, 0.0);
        assert_eq!(summary.average_refund, 0.0);
        assert!(summary.average_refund.is_finite());
    }

    #[test]
    fn test_empty_table() {
        let entries = "entry_number,hts_code,duties_paid,entered_value\n";
        let liquidation = "entry_number,liquidation_date,liquidation_status,protest_status\n";

        let summary = summarize(&table(entries, liquidation));
        assert_eq!(summary.total_entries, 0);
        assert_eq!(summary.average_refund, 0.0);
    }
}
