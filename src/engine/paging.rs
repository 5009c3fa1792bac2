//! # Paginated Retrieval
//!
//! Executes a query through the store's page cursor. The cursor is seeded
//! by the caller with a content-derived continuation token, so identical
//! query text always pages from the same starting position.
//!
//! Seeking is strictly sequential and forward-only: reaching page `n`
//! costs `n` page fetches. That cost profile is inherited from the
//! store's cursor model and callers depend on it, so it stays.

use serde_json::Value;

use crate::observability::QueryLog;
use crate::store::{StoreClient, StoreQuery};

use super::errors::{EngineResult, NotAvailable};

/// Fetch one page of results.
///
/// With no page number, returns the first page (an immediately exhausted
/// cursor yields an empty row set, not an error). With a 1-indexed page
/// number `n`, fetches `n` pages and discards the first `n - 1`; if the
/// cursor runs out before page `n`, the page is unreachable and the call
/// fails with `NotAvailable`.
pub async fn fetch_page(
    store: &dyn StoreClient,
    log: &mut QueryLog,
    query: StoreQuery,
    page_number: Option<usize>,
) -> EngineResult<Vec<Value>> {
    let mut cursor = store.execute(query).await?;

    let Some(requested) = page_number else {
        return match cursor.next_page().await? {
            Some(page) => {
                log.record(&page.metadata);
                Ok(page.items)
            }
            None => Ok(Vec::new()),
        };
    };

    if requested == 0 {
        // Page numbers are 1-indexed.
        return Err(NotAvailable);
    }

    let mut current = None;
    for _ in 0..requested {
        let page = cursor.next_page().await?.ok_or(NotAvailable)?;
        log.record(&page.metadata);
        current = Some(page);
    }

    match current {
        Some(page) => Ok(page.items),
        None => Err(NotAvailable),
    }
}
