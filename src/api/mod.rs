//! # Request/Response Envelope
//!
//! The HTTP-facing boundary: typed request envelopes handed in by the
//! routing layer (which is external to this crate), and the JSON/CSV
//! response shapes handed back.

pub mod csv;
pub mod request;
pub mod response;

pub use request::{ApiRequest, QueryTokens, RequestMethod, ResponseFormat};
pub use response::{ApiResponse, Envelope, PaginationLinks};
