//! Shared error type for the row stores (customers, invoices).

use thiserror::Error;

/// Row store operation error.
///
/// These are infrastructure failures; domain failures (validation,
/// invariants) never reach a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("undecodable row: {0}")]
    Corrupt(String),

    #[error("storage unavailable: {0}")]
    Transient(String),
}

impl StoreError {
    pub(crate) fn transient(e: sqlx::Error) -> Self {
        Self::Transient(e.to_string())
    }
}
