//! # Query Execution Engine
//!
//! Orchestrates one request end to end: assembles the final filter
//! fragment, selects the partition scope, resolves the latest-value
//! refilter when requested, memoizes the count query, pages through the
//! data query, and hands rows to the response assembler.
//!
//! The engine owns no ambient state: the store client, the count cache,
//! and the settings are injected once at startup.

pub mod errors;
pub mod latest;
pub mod paging;

pub use errors::{EngineResult, NotAvailable};

use std::sync::Arc;

use serde_json::Value;

use crate::api::csv;
use crate::api::request::{ApiRequest, QueryTokens, RequestMethod, ResponseFormat};
use crate::api::response::{self, ApiResponse, Envelope};
use crate::cache::{CountCache, CountKey};
use crate::observability::QueryLog;
use crate::query::templates::{self, TemplateContext, TemplateKind, DATE_FIELD, SERIES_DATE_PARAM};
use crate::query::FilterFragment;
use crate::settings::Settings;
use crate::store::{ContinuationToken, ExecutionScope, StoreClient, StoreQuery};

/// The query-and-pagination engine.
pub struct QueryEngine {
    store: Arc<dyn StoreClient>,
    counts: Arc<CountCache>,
    settings: Settings,
}

/// Request state shared by every query the request issues.
struct PreparedQuery {
    filters: FilterFragment,
    ordering: String,
    scope: ExecutionScope,
    date: String,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn StoreClient>, counts: Arc<CountCache>, settings: Settings) -> Self {
        Self {
            store,
            counts,
            settings,
        }
    }

    /// Retrieve the data for one request.
    ///
    /// `HEAD` runs the existence check only and returns an empty
    /// response; `GET` returns the JSON envelope or CSV text selected by
    /// the request's format token.
    pub async fn get_data(&self, request: ApiRequest) -> EngineResult<ApiResponse> {
        let ApiRequest {
            method,
            url,
            series_date,
            tokens,
        } = request;
        let QueryTokens {
            mut filters,
            ordering,
            page_number,
            format,
            only_latest_by,
            structure,
            assurance_clause,
        } = tokens;

        filters.append_raw(&assurance_clause);

        let date = series_date.format("%Y-%m-%d").to_string();
        filters.bind(SERIES_DATE_PARAM, Value::String(date.clone()));

        let scope = ExecutionScope::for_request(self.settings.deployment_mode, series_date);
        let ordering = ordering.resolve().await;
        let mut max_page_limit = self.settings.max_page_size;

        if let Some(latest_by) = only_latest_by.as_deref() {
            // The refiltered main query depends on this lookup; it must
            // complete before anything else is issued.
            let value = latest::resolve_latest(
                self.store.as_ref(),
                &filters,
                latest_by,
                &scope,
                self.settings.max_page_size,
            )
            .await?;

            max_page_limit = 1;
            let name = latest::hashed_parameter_name(DATE_FIELD);
            filters.append_raw(&latest::equality_clause(&name));
            filters.bind(name, value);
        }

        let prepared = PreparedQuery {
            filters,
            ordering,
            scope,
            date,
        };

        match method {
            RequestMethod::Head => self.process_head(&prepared).await,
            RequestMethod::Get => {
                self.process_get(&url, &structure, format, page_number, max_page_limit, &prepared)
                    .await
            }
        }
    }

    /// Existence check: succeed if at least one row matches. Fetched
    /// rows are discarded.
    async fn process_head(&self, prepared: &PreparedQuery) -> EngineResult<ApiResponse> {
        let text = templates::render(
            TemplateKind::Exists,
            &TemplateContext {
                clause: &prepared.filters.clause,
                ordering: &prepared.ordering,
                ..Default::default()
            },
        );

        let mut log = QueryLog::new(&text, &prepared.filters.parameters);
        let query = StoreQuery {
            text,
            parameters: prepared.filters.parameters.clone(),
            scope: prepared.scope.clone(),
            max_item_count: self.settings.max_page_size,
            continuation: None,
        };

        let mut cursor = self.store.execute(query).await?;
        let page = cursor.next_page().await?.ok_or(NotAvailable)?;
        log.record(&page.metadata);

        if page.items.is_empty() {
            return Err(NotAvailable);
        }
        Ok(ApiResponse::Empty)
    }

    async fn process_get(
        &self,
        url: &str,
        structure: &str,
        format: ResponseFormat,
        page_number: Option<usize>,
        max_page_limit: usize,
        prepared: &PreparedQuery,
    ) -> EngineResult<ApiResponse> {
        let ctx = TemplateContext {
            shape: structure,
            clause: &prepared.filters.clause,
            ordering: &prepared.ordering,
            ..Default::default()
        };
        let data_text = templates::render(TemplateKind::Data, &ctx);
        let count_text = templates::render(TemplateKind::Count, &ctx);

        let count = self.cached_count(&count_text, prepared).await?;

        let mut log = QueryLog::new(&data_text, &prepared.filters.parameters);
        let query = StoreQuery {
            continuation: Some(ContinuationToken::from_query_text(&data_text)),
            text: data_text,
            parameters: prepared.filters.parameters.clone(),
            scope: prepared.scope.clone(),
            max_item_count: self.settings.max_page_size,
        };
        let rows = paging::fetch_page(self.store.as_ref(), &mut log, query, page_number).await?;

        match format {
            ResponseFormat::Csv => Ok(ApiResponse::Csv(csv::render(&rows)?)),
            ResponseFormat::Json => {
                let pagination = page_number.map(|page| {
                    let total = response::total_pages(count, self.settings.max_page_size);
                    response::build_links(url, page, total)
                });
                Ok(ApiResponse::Json(Envelope {
                    length: rows.len(),
                    max_page_limit,
                    data: rows,
                    pagination,
                }))
            }
        }
    }

    /// Count queries are expensive; results are memoized process-wide,
    /// keyed on (query text, date, sorted parameters).
    async fn cached_count(&self, text: &str, prepared: &PreparedQuery) -> EngineResult<u64> {
        let key = CountKey::new(text, &prepared.date, &prepared.filters.parameters);

        self.counts
            .get_or_compute(key, || async move {
                let mut log = QueryLog::new(text, &prepared.filters.parameters);
                let query = StoreQuery {
                    text: text.to_string(),
                    parameters: prepared.filters.parameters.clone(),
                    scope: prepared.scope.clone(),
                    max_item_count: self.settings.max_page_size,
                    continuation: None,
                };

                let mut cursor = self.store.execute(query).await?;
                let page = cursor.next_page().await?.ok_or(NotAvailable)?;
                log.record(&page.metadata);

                match page.items.as_slice() {
                    [count] => count.as_u64().ok_or(NotAvailable),
                    _ => Err(NotAvailable),
                }
            })
            .await
    }
}
