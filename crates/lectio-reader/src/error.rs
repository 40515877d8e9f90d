//! Reader core error types.

use thiserror::Error;

/// Remote annotation store error.
///
/// An absent value is not an error (reads return `Ok(None)`); these cover
/// genuine store/network failures, which surface to the UI as an offline
/// flag and are retried on user action, never automatically.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store read failed for {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("store write failed for {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("stored record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
