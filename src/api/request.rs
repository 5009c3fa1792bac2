//! API request types
//!
//! The request envelope as handed over by the routing layer: method,
//! original URL, series date, and the already-parsed query tokens.
//! Querystring parsing itself happens upstream.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::query::{FilterFragment, OrderingExpression};

/// Supported request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    /// Existence check only; no rows are returned.
    Head,
    /// Full data retrieval.
    Get,
}

impl FromStr for RequestMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HEAD" => Ok(RequestMethod::Head),
            "GET" => Ok(RequestMethod::Get),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

/// Requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ResponseFormat::Json),
            "csv" => Ok(ResponseFormat::Csv),
            other => Err(format!("unsupported format: {other}")),
        }
    }
}

/// Parsed query tokens for one request.
#[derive(Debug, Default)]
pub struct QueryTokens {
    /// Filter clause and its bound parameters.
    pub filters: FilterFragment,
    /// Requested ordering, resolved once per request.
    pub ordering: OrderingExpression,
    /// 1-indexed page number; `None` means first page only.
    pub page_number: Option<usize>,
    pub format: ResponseFormat,
    /// Restrict results to the latest date on which this metric exists.
    pub only_latest_by: Option<String>,
    /// Result-shape (projection) template text.
    pub structure: String,
    /// Pre-built assurance sub-filter, appended verbatim. May be empty.
    pub assurance_clause: String,
}

/// One incoming request.
#[derive(Debug)]
pub struct ApiRequest {
    pub method: RequestMethod,
    /// Original request URL, used to rebuild pagination links.
    pub url: String,
    /// Series date: the partition key value for this request.
    pub series_date: NaiveDate,
    pub tokens: QueryTokens,
}
