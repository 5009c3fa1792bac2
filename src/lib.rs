//! datagate - A deterministic query and pagination gateway for
//! date-partitioned document stores.
//!
//! The crate sits between a parsed HTTP-style request and a partitioned
//! document store: it renders query text from filter/ordering fragments,
//! picks the partition strategy, memoizes count queries, pages through
//! results behind content-derived continuation tokens, and assembles a
//! paged JSON envelope or CSV export.

pub mod api;
pub mod cache;
pub mod engine;
pub mod observability;
pub mod query;
pub mod settings;
pub mod store;
