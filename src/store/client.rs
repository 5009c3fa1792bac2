//! # Store Client Interface
//!
//! Trait seam to the document store. The store executes query text with
//! bound parameters under an execution scope and hands back a forward-only
//! page cursor that accepts an optional continuation seed.

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::query::QueryParameter;

use super::errors::StoreResult;
use super::scope::ExecutionScope;

/// Per-call execution metadata surfaced by the store for observability.
#[derive(Debug, Clone, Default)]
pub struct PageMetadata {
    /// Request cost charged by the store for this page.
    pub request_charge: f64,
    /// Number of items returned in this page.
    pub item_count: usize,
    /// Content path of the queried collection, when reported.
    pub content_path: Option<String>,
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct QueryPage {
    pub items: Vec<Value>,
    pub metadata: PageMetadata,
}

/// Opaque token identifying a resume position within a page sequence.
///
/// Tokens derived from query text make repeated identical requests begin
/// paging from the same point, so pagination is reproducible across
/// requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// Derive a token from the full query text (bound parameter values
    /// excluded): hex of the 32-byte SHA-256 digest.
    pub fn from_query_text(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        ContinuationToken(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A fully specified store query.
#[derive(Debug, Clone)]
pub struct StoreQuery {
    pub text: String,
    pub parameters: Vec<QueryParameter>,
    pub scope: ExecutionScope,
    pub max_item_count: usize,
    pub continuation: Option<ContinuationToken>,
}

/// Client for the underlying document store.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Execute a query, returning a cursor over its pages.
    async fn execute(&self, query: StoreQuery) -> StoreResult<Box<dyn PageCursor>>;
}

/// Forward-only cursor over one query's page sequence.
#[async_trait]
pub trait PageCursor: Send {
    /// Fetch the next page, or `None` once the sequence is exhausted.
    async fn next_page(&mut self) -> StoreResult<Option<QueryPage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_deterministic() {
        let a = ContinuationToken::from_query_text("SELECT VALUE COUNT(1) FROM c");
        let b = ContinuationToken::from_query_text("SELECT VALUE COUNT(1) FROM c");
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_is_32_bytes_hex() {
        let token = ContinuationToken::from_query_text("SELECT 1");
        assert_eq!(token.as_str().len(), 64);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_token_varies_with_query_text() {
        let a = ContinuationToken::from_query_text("SELECT 1");
        let b = ContinuationToken::from_query_text("SELECT 2");
        assert_ne!(a, b);
    }
}
