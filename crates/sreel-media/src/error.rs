//! Media resolution error types.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while resolving media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Non-success status or transport failure while fetching. Always
    /// carries the original (non-proxied) URL.
    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Invalid fetch configuration: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] sreel_store::StoreError),
}

impl MediaError {
    pub fn fetch_failed(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
