use manta_core::error::CoreError;

/// Failure computing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The requested day cannot be turned into a time range.
    #[error(transparent)]
    InvalidDate(#[from] CoreError),

    #[error("Report query failed: {0}")]
    Store(#[from] sqlx::Error),
}
