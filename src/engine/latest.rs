//! # Latest-Value Resolution
//!
//! The store has no "latest match per group, then filter by it"
//! operator, so only-latest-by requests run two dependent queries: an
//! auxiliary top-1 lookup for the most recent qualifying date, whose
//! result is folded back into the main query as an extra equality
//! filter. The main query must not start until resolution completes.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::observability::QueryLog;
use crate::query::templates::{self, TemplateContext, TemplateKind, DATE_FIELD, DOC_ALIAS};
use crate::query::{FilterFragment, OrderClause, OrderingExpression};
use crate::store::{ExecutionScope, StoreClient, StoreQuery};

use super::errors::{EngineResult, NotAvailable};

const PARAM_DIGEST_BYTES: usize = 6;

/// Fixed most-recent-first ordering for the lookup.
fn latest_ordering() -> OrderingExpression {
    OrderingExpression::fixed(vec![
        OrderClause::desc("releaseTimestamp"),
        OrderClause::desc(DATE_FIELD),
    ])
}

/// Derive the injected parameter name for `field`: the field name plus a
/// short collision-resistant digest suffix. The suffix guarantees the
/// name cannot collide with any parameter the caller already bound.
pub fn hashed_parameter_name(field: &str) -> String {
    let digest = Sha256::digest(field.as_bytes());
    format!("@{field}{}", hex::encode(&digest[..PARAM_DIGEST_BYTES]))
}

/// The clause text injected into the caller's filter for the resolved
/// value bound under `name`.
pub fn equality_clause(name: &str) -> String {
    format!(" AND {DOC_ALIAS}.{DATE_FIELD} = {name}")
}

/// Resolve the most recent qualifying date for `latest_by`.
///
/// Fails with `NotAvailable` when the lookup yields no rows or the row
/// lacks the date field.
pub async fn resolve_latest(
    store: &dyn StoreClient,
    filters: &FilterFragment,
    latest_by: &str,
    scope: &ExecutionScope,
    max_item_count: usize,
) -> EngineResult<Value> {
    let ordering = latest_ordering().resolve().await;
    let text = templates::render(
        TemplateKind::LatestDate,
        &TemplateContext {
            clause: &filters.clause,
            ordering: &ordering,
            latest_by,
            ..Default::default()
        },
    );

    let mut log = QueryLog::new(&text, &filters.parameters);
    let query = StoreQuery {
        text,
        parameters: filters.parameters.clone(),
        scope: scope.clone(),
        max_item_count,
        continuation: None,
    };

    let mut cursor = store.execute(query).await?;
    let page = cursor.next_page().await?.ok_or(NotAvailable)?;
    log.record(&page.metadata);

    page.items
        .first()
        .and_then(|row| row.get(DATE_FIELD))
        .cloned()
        .ok_or(NotAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryParameter;
    use crate::store::InMemoryStore;
    use serde_json::json;

    #[test]
    fn test_parameter_name_has_digest_suffix() {
        let name = hashed_parameter_name(DATE_FIELD);
        assert!(name.starts_with("@date"));
        // "@" + field + 6-byte digest in hex
        assert_eq!(name.len(), 1 + DATE_FIELD.len() + PARAM_DIGEST_BYTES * 2);
    }

    #[test]
    fn test_parameter_name_is_stable() {
        assert_eq!(hashed_parameter_name("date"), hashed_parameter_name("date"));
        assert_ne!(hashed_parameter_name("date"), hashed_parameter_name("week"));
    }

    #[test]
    fn test_parameter_name_avoids_caller_collisions() {
        let generated = hashed_parameter_name(DATE_FIELD);
        // Even a caller binding the same visual prefix cannot produce the
        // digest-suffixed name.
        let callers = [
            QueryParameter::new("@date", json!("2020-01-01")),
            QueryParameter::new("@dateLatest", json!("2020-01-01")),
            QueryParameter::new("@seriesDate", json!("2020-01-01")),
        ];
        assert!(callers.iter().all(|p| p.name != generated));
    }

    #[tokio::test]
    async fn test_resolves_date_from_top_row() {
        let store = InMemoryStore::new();
        store.set_latest_date("2020-11-20");

        let filters = FilterFragment::new("c.areaType = @areaType", vec![]);
        let value = resolve_latest(
            &store,
            &filters,
            "newCasesByPublishDate",
            &ExecutionScope::CrossPartition,
            1000,
        )
        .await
        .unwrap();
        assert_eq!(value, json!("2020-11-20"));
    }

    #[tokio::test]
    async fn test_no_rows_is_not_available() {
        let store = InMemoryStore::new();
        let filters = FilterFragment::default();
        let result = resolve_latest(
            &store,
            &filters,
            "newCasesByPublishDate",
            &ExecutionScope::CrossPartition,
            1000,
        )
        .await;
        assert_eq!(result, Err(NotAvailable));
    }
}
