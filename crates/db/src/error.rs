//! Typed error type for the db crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored document is not valid JSON for this collection: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("record not found")]
    NotFound,
}
