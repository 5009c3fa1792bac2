//! # Filter Fragments
//!
//! A filter fragment is an opaque clause in the store's query language
//! plus the ordered parameter list it references. Parameter names are
//! unique within one logical query; every name referenced by the clause
//! must appear in the list.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single bound query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

impl QueryParameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Opaque filter-clause text together with its bound parameters.
///
/// Fragments are assembled once per request and extended only by
/// appending: the assurance sub-filter and the latest-value equality
/// arrive as pre-rendered clause text.
#[derive(Debug, Clone, Default)]
pub struct FilterFragment {
    pub clause: String,
    pub parameters: Vec<QueryParameter>,
}

impl FilterFragment {
    pub fn new(clause: impl Into<String>, parameters: Vec<QueryParameter>) -> Self {
        Self {
            clause: clause.into(),
            parameters,
        }
    }

    /// Append pre-rendered clause text verbatim. The caller is
    /// responsible for any leading connective (`AND ...`).
    pub fn append_raw(&mut self, clause: &str) {
        self.clause.push_str(clause);
    }

    /// Bind an additional parameter.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.parameters.push(QueryParameter {
            name: name.into(),
            value,
        });
    }

    /// True if a parameter with this exact name is already bound.
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }
}
