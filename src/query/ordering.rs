//! # Ordering Expressions
//!
//! An ordering expression is a sequence of `(field, direction)` clauses.
//! Resolution is asynchronous: the clause list may be produced by a
//! deferred metadata lookup, so callers await `resolve` once per request
//! and reuse the rendered text for every query they build.

use std::fmt;

use futures_util::future::BoxFuture;

use crate::query::templates::DOC_ALIAS;

/// Sort direction for one ordering clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `(field, direction)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub field: String,
    pub direction: Direction,
}

impl OrderClause {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// A lazily-resolved ordering.
///
/// `Fixed` orderings are known at parse time. `Deferred` orderings are
/// produced by an external metadata lookup and resolved on first use.
pub enum OrderingExpression {
    Fixed(Vec<OrderClause>),
    Deferred(BoxFuture<'static, Vec<OrderClause>>),
}

impl OrderingExpression {
    pub fn fixed(clauses: Vec<OrderClause>) -> Self {
        OrderingExpression::Fixed(clauses)
    }

    pub fn deferred<F>(lookup: F) -> Self
    where
        F: std::future::Future<Output = Vec<OrderClause>> + Send + 'static,
    {
        OrderingExpression::Deferred(Box::pin(lookup))
    }

    /// Resolve the clause list and render it as `ORDER BY` text.
    ///
    /// Returns an empty string when there are no clauses so templates can
    /// substitute the result unconditionally.
    pub async fn resolve(self) -> String {
        let clauses = match self {
            OrderingExpression::Fixed(clauses) => clauses,
            OrderingExpression::Deferred(lookup) => lookup.await,
        };
        format_ordering(&clauses)
    }
}

impl fmt::Debug for OrderingExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingExpression::Fixed(clauses) => {
                f.debug_tuple("Fixed").field(clauses).finish()
            }
            OrderingExpression::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl Default for OrderingExpression {
    fn default() -> Self {
        OrderingExpression::Fixed(Vec::new())
    }
}

/// Render clauses as `ORDER BY c.field DESC, c.other ASC`.
pub fn format_ordering(clauses: &[OrderClause]) -> String {
    if clauses.is_empty() {
        return String::new();
    }

    let rendered: Vec<String> = clauses
        .iter()
        .map(|clause| format!("{DOC_ALIAS}.{} {}", clause.field, clause.direction))
        .collect();

    format!("ORDER BY {}", rendered.join(", "))
}
