//! Per-query audit logging.
//!
//! One `QueryLog` is constructed per logical query and passed explicitly
//! to whatever executes it. Each recorded page fetch emits a structured
//! line carrying the readable query text, the parameter list, the store's
//! response metadata, and a monotonically increasing round counter.

use serde_json::{json, Value};

use crate::query::QueryParameter;
use crate::store::PageMetadata;

use super::logger::Logger;

const QUERY_EVENT: &str = "DB_QUERY";

/// Audit record for one logical query.
pub struct QueryLog {
    /// Query text with bound values substituted for readability.
    query: String,
    parameters: Value,
    round: u64,
}

impl QueryLog {
    pub fn new(text: &str, parameters: &[QueryParameter]) -> Self {
        // Substitute longest names first so a parameter whose name is a
        // prefix of another does not clobber it.
        let mut by_length: Vec<&QueryParameter> = parameters.iter().collect();
        by_length.sort_by_key(|p| std::cmp::Reverse(p.name.len()));

        let mut query = text.to_string();
        for parameter in by_length {
            let rendered = match &parameter.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            query = query.replace(&parameter.name, &rendered);
        }

        Self {
            query,
            parameters: json!(parameters),
            round: 0,
        }
    }

    /// Rounds recorded so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Record one page fetch and advance the round counter.
    pub fn record(&mut self, metadata: &PageMetadata) {
        Logger::info(
            QUERY_EVENT,
            &[
                ("charge", json!(metadata.request_charge)),
                ("query", json!(self.query)),
                ("response_count", json!(metadata.item_count)),
                ("path", json!(metadata.content_path)),
                ("parameters", self.parameters.clone()),
                ("request_round", json!(self.round)),
            ],
        );
        self.round += 1;
    }
}
