//! Uniform failure surface for the query engine.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, NotAvailable>;

/// The engine's single error kind: no data exist for this request.
///
/// Raised for empty existence checks, count queries yielding zero or
/// more than one row, latest-value lookups with no rows or a missing
/// field, unreachable requested pages, and CSV rendering of an empty
/// result. Malformed store responses collapse into the same kind, so
/// callers see one failure surface regardless of the underlying cause.
/// Terminal: no retries happen at this layer; externally this maps to a
/// not-found-style response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("data are not available for the requested parameters")]
pub struct NotAvailable;

impl From<StoreError> for NotAvailable {
    fn from(_: StoreError) -> Self {
        NotAvailable
    }
}
