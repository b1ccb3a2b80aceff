// ⚠️ Error taxonomy for the claims pipeline
// Every failure is fatal for the current `process` call; nothing is retried.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClaimsError {
    /// File missing or unreadable, CSV decode failure, or a cell that could
    /// not be coerced (bad date, bad amount).
    #[error("Failed to read {source_name}: {reason}")]
    SourceRead { source_name: String, reason: String },

    /// An expected column is absent from a source's header row.
    #[error("{source_name} is missing required column '{column}'")]
    Schema { source_name: String, column: String },

    /// A required report was not supplied at all.
    #[error("Required source not provided: {0}")]
    MissingSource(String),

    /// `summary` or `export` called before any successful `process`.
    #[error("No processed data available. Run process() first.")]
    Unprocessed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClaimsError {
    pub fn source_read(source_name: &str, reason: impl Into<String>) -> Self {
        ClaimsError::SourceRead {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn schema(source_name: &str, column: &str) -> Self {
        ClaimsError::Schema {
            source_name: source_name.to_string(),
            column: column.to_string(),
        }
    }

    /// True for failures caused by the caller's input rather than the host.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ClaimsError::SourceRead { .. } | ClaimsError::Schema { .. } | ClaimsError::MissingSource(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClaimsError>;
