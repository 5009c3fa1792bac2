//! Count Cache Invariants
//!
//! Tests for count memoization through the engine:
//! - One underlying count execution across identical requests
//! - Parameter order never causes a miss
//! - Distinct dates hit distinct entries
//! - Failed counts are not cached

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use datagate::api::{ApiRequest, QueryTokens, RequestMethod, ResponseFormat};
use datagate::cache::CountCache;
use datagate::engine::{NotAvailable, QueryEngine};
use datagate::query::{FilterFragment, OrderingExpression, QueryParameter};
use datagate::settings::Settings;
use datagate::store::{
    InMemoryStore, PageCursor, QueryPage, StoreClient, StoreError, StoreQuery, StoreResult,
};

// =============================================================================
// Helper Functions
// =============================================================================

const COUNT_PREFIX: &str = "SELECT VALUE COUNT";

fn rows(n: usize) -> Vec<Value> {
    (0..n).map(|i| json!({ "n": i })).collect()
}

fn engine_over(store: Arc<dyn StoreClient>) -> QueryEngine {
    QueryEngine::new(
        store,
        Arc::new(CountCache::with_default_capacity()),
        Settings::with_max_page_size(10),
    )
}

fn request_with_params(parameters: Vec<QueryParameter>, day: u32) -> ApiRequest {
    ApiRequest {
        method: RequestMethod::Get,
        url: "https://api.example.com/v1/data?areaType=nation".to_string(),
        series_date: NaiveDate::from_ymd_opt(2020, 11, day).unwrap(),
        tokens: QueryTokens {
            filters: FilterFragment::new("c.areaType = @areaType AND c.areaCode = @areaCode", parameters),
            ordering: OrderingExpression::default(),
            page_number: Some(1),
            format: ResponseFormat::Json,
            only_latest_by: None,
            structure: "{'n': c.n}".to_string(),
            assurance_clause: String::new(),
        },
    }
}

// =============================================================================
// Memoization
// =============================================================================

#[tokio::test]
async fn test_identical_requests_run_one_count() {
    let store = Arc::new(InMemoryStore::with_rows(rows(25)));
    let engine = engine_over(Arc::clone(&store) as Arc<dyn StoreClient>);

    for _ in 0..3 {
        let params = vec![
            QueryParameter::new("@areaType", "nation"),
            QueryParameter::new("@areaCode", "E92000001"),
        ];
        engine.get_data(request_with_params(params, 20)).await.unwrap();
    }

    assert_eq!(store.execution_count_matching(COUNT_PREFIX), 1);
}

/// Permuted parameter lists hit the same cache entry.
#[tokio::test]
async fn test_parameter_order_never_misses() {
    let store = Arc::new(InMemoryStore::with_rows(rows(25)));
    let engine = engine_over(Arc::clone(&store) as Arc<dyn StoreClient>);

    let forward = vec![
        QueryParameter::new("@areaType", "nation"),
        QueryParameter::new("@areaCode", "E92000001"),
    ];
    let reversed = vec![
        QueryParameter::new("@areaCode", "E92000001"),
        QueryParameter::new("@areaType", "nation"),
    ];

    engine.get_data(request_with_params(forward, 20)).await.unwrap();
    engine.get_data(request_with_params(reversed, 20)).await.unwrap();

    assert_eq!(store.execution_count_matching(COUNT_PREFIX), 1);
}

/// A different series date is a different entry.
#[tokio::test]
async fn test_distinct_dates_are_distinct_entries() {
    let store = Arc::new(InMemoryStore::with_rows(rows(25)));
    let engine = engine_over(Arc::clone(&store) as Arc<dyn StoreClient>);

    let params = || {
        vec![
            QueryParameter::new("@areaType", "nation"),
            QueryParameter::new("@areaCode", "E92000001"),
        ]
    };
    engine.get_data(request_with_params(params(), 20)).await.unwrap();
    engine.get_data(request_with_params(params(), 21)).await.unwrap();

    assert_eq!(store.execution_count_matching(COUNT_PREFIX), 2);
}

// =============================================================================
// Failure Handling
// =============================================================================

/// Fails the first count query, then delegates to the inner store.
struct FlakyCountStore {
    inner: InMemoryStore,
    failed_once: AtomicBool,
}

struct FailingCursor;

#[async_trait]
impl PageCursor for FailingCursor {
    async fn next_page(&mut self) -> StoreResult<Option<QueryPage>> {
        Err(StoreError::Malformed("truncated count row".to_string()))
    }
}

#[async_trait]
impl StoreClient for FlakyCountStore {
    async fn execute(&self, query: StoreQuery) -> StoreResult<Box<dyn PageCursor>> {
        if query.text.starts_with(COUNT_PREFIX) && !self.failed_once.swap(true, Ordering::SeqCst) {
            return Ok(Box::new(FailingCursor));
        }
        self.inner.execute(query).await
    }
}

/// A failed count is surfaced as NotAvailable and not cached; the next
/// request recomputes and succeeds.
#[tokio::test]
async fn test_failed_count_is_not_cached() {
    let store = Arc::new(FlakyCountStore {
        inner: InMemoryStore::with_rows(rows(5)),
        failed_once: AtomicBool::new(false),
    });
    let engine = engine_over(Arc::clone(&store) as Arc<dyn StoreClient>);

    let params = || vec![QueryParameter::new("@areaType", "nation")];

    let first = engine.get_data(request_with_params(params(), 20)).await;
    assert!(matches!(first, Err(NotAvailable)));

    let second = engine.get_data(request_with_params(params(), 20)).await;
    assert!(second.is_ok());
}
