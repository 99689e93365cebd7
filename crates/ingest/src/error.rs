use std::time::Duration;

use manta_core::error::CoreError;

/// Errors from an [`EventSource`](crate::source::EventSource).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The feed rejected our credentials. Retrying will not help.
    #[error("Event source rejected credentials ({status})")]
    Unauthorized { status: u16 },

    /// The feed returned a non-2xx status code.
    #[error("Event source error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed event source response: {0}")]
    Decode(String),
}

impl SourceError {
    /// Whether the error ends a subscription instead of waiting for the next poll.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Errors from reconciling or syncing events.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The event is unusable. Dropped, never retried.
    #[error("Invalid event: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl SyncError {
    /// Whether the caller may retry the same event.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(_) | Self::Timeout(_) => true,
            Self::Source(e) => !e.is_fatal(),
            Self::Validation(_) | Self::NotFound { .. } => false,
        }
    }
}

impl From<CoreError> for SyncError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Validation(other.to_string()),
        }
    }
}
