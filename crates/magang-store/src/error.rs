//! Error types for the magang-store crate.
//!
//! Storage primitives that can fail return [`StoreError`] via
//! [`StoreResult`]. The public CRUD surface catches these at the
//! context boundary and degrades instead of propagating; see
//! [`crate::context::StoreContext`].

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur against the backing medium.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite operation failed (includes disk-full / quota conditions).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The medium rejected an operation for a non-SQLite reason
    /// (poisoned lock, injected test failure, disabled storage).
    #[error("medium error: {0}")]
    Medium(String),
}
