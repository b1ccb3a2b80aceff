// IEEPA Claims Pipeline - Core Library
// Merges the three ACE reports and flags refund and protest-deadline risk.
// Used by the CLI, the API server and tests.

pub mod config;
pub mod deadline;
pub mod enriched;
pub mod error;
pub mod join;
pub mod logging;
pub mod mock;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod refund;
pub mod summary;
pub mod value;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use deadline::{
    days_remaining, protest_deadline, Clock, DeadlineStatus, FixedClock, SystemClock,
    PROTEST_WINDOW_DAYS, URGENT_WINDOW_DAYS,
};
pub use enriched::{DerivedFields, EnrichedRow, EnrichedTable};
pub use error::{ClaimsError, Result};
pub use join::{join, left_join, JoinStats, JoinedTable};
pub use normalize::{
    normalize_entry_number, read_source, read_source_file, SourceKind, SourceTable,
};
pub use pipeline::{ClaimsPipeline, ReportSources, SourceInput};
pub use record::{EntryRecord, RecordLayout};
pub use refund::{assess, is_ieepa_tariff, refund_due, RefundDecision};
pub use summary::{summarize, RiskSummary};
pub use value::Value;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
