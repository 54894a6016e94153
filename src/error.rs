/* src/error.rs */

use thiserror::Error;

/// Failure reported by a [`KvBackend`](crate::history::KvBackend).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The medium has no room left for the value being written.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, BackendError::QuotaExceeded)
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    /// Even with every older fit evicted the new one does not fit.
    #[error("storage full, cannot save new fit")]
    StorageExhausted,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("history serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("legacy fit {id} has an unreadable image: {reason}")]
    InvalidLegacyImage { id: String, reason: String },
}

pub type Result<T, E = HistoryError> = std::result::Result<T, E>;
