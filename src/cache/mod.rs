//! # Count Cache
//!
//! Count queries are expensive aggregate calls, so their results are
//! memoized process-wide. Entries never expire; they only leave the
//! cache by least-recently-used eviction once capacity is exceeded.

pub mod count;

pub use count::{CountCache, CountKey, DEFAULT_CAPACITY};
