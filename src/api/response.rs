//! # Response Formatting
//!
//! The paged JSON envelope and its pagination links. Links are rebuilt
//! from the original request URL with any existing page-number query
//! parameter stripped and replaced.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Matches a page-number query parameter and its trailing separator.
fn page_pattern() -> &'static Regex {
    static PAGE_PATTERN: OnceLock<Regex> = OnceLock::new();
    PAGE_PATTERN.get_or_init(|| Regex::new(r"page=\d+&?").expect("pagination pattern is valid"))
}

/// Pagination links for one page of a result set.
///
/// `next` and `previous` serialize as `null` at the sequence edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationLinks {
    pub current: String,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub first: String,
    pub last: String,
}

/// Paged JSON response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub length: usize,
    #[serde(rename = "maxPageLimit")]
    pub max_page_limit: usize,
    pub data: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationLinks>,
}

/// Engine response: a JSON envelope, flat CSV text, or nothing.
#[derive(Debug, Clone)]
pub enum ApiResponse {
    Json(Envelope),
    Csv(String),
    /// Existence checks return no body: "no error raised" is the
    /// success signal.
    Empty,
}

/// `ceil(count / page_size)`.
pub fn total_pages(count: u64, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    ((count + page_size as u64 - 1) / page_size as u64) as usize
}

/// Rebuild pagination links from the original request URL.
///
/// The URL is reduced to its query string with any `page=N` parameter
/// removed, re-rooted at the data endpoint, and each link re-appends its
/// own page number.
pub fn build_links(request_url: &str, page: usize, total_pages: usize) -> PaginationLinks {
    let stripped = page_pattern().replace_all(request_url, "");
    let query = stripped
        .split_once('?')
        .map(|(_, query)| query)
        .unwrap_or("");
    let base = format!("/v1/data?{query}");
    let base = base.trim_end_matches('&');

    let link = |page: usize| format!("{base}&page={page}");

    PaginationLinks {
        current: link(page),
        next: (page < total_pages).then(|| link(page + 1)),
        previous: (page > 1).then(|| link(page - 1)),
        first: link(1),
        last: link(total_pages),
    }
}
