//! # Observability
//!
//! Structured JSON-line logging: one line per event, event key first,
//! remaining keys in deterministic order. `QueryLog` layers the per-query
//! audit record on top, carrying its own round counter.

pub mod logger;
pub mod query_log;

pub use logger::{Logger, Severity};
pub use query_log::QueryLog;
