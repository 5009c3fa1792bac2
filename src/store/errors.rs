//! Store-side error surface.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by the underlying document store.
///
/// The engine collapses every variant into its uniform `NotAvailable`
/// kind; the distinction exists only for store-level logging.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store rejected or failed to execute the query.
    #[error("store query failed: {0}")]
    Query(String),

    /// The store answered with a shape the caller cannot unpack.
    #[error("malformed store response: {0}")]
    Malformed(String),
}
