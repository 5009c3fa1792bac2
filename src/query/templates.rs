//! # Query Templates
//!
//! The four fixed query shapes issued by the engine, rendered by pure
//! text substitution. Rendering is deterministic: identical inputs
//! always produce identical query text, which the pagination engine
//! relies on when deriving continuation tokens.

/// Document alias used by every template.
pub const DOC_ALIAS: &str = "c";

/// Field holding the record date, used by the latest-value lookup.
pub const DATE_FIELD: &str = "date";

/// Parameter carrying the series date, bound on every request.
pub const SERIES_DATE_PARAM: &str = "@seriesDate";

const EXISTS_TEMPLATE: &str = "SELECT TOP 1 VALUE (1) FROM c WHERE $clause_script $ordering";

const DATA_TEMPLATE: &str = "SELECT VALUE $template FROM c WHERE $clause_script $ordering";

const COUNT_TEMPLATE: &str = "SELECT VALUE COUNT(1) FROM c WHERE $clause_script";

const LATEST_DATE_TEMPLATE: &str =
    "SELECT TOP 1 c.date FROM c WHERE $clause_script AND IS_DEFINED(c.$latest_by) $ordering";

/// The template kinds the engine can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Existence check: matches at least one row.
    Exists,
    /// Main data fetch, projected through the shape template.
    Data,
    /// Aggregate row count.
    Count,
    /// Most recent qualifying date for a metric.
    LatestDate,
}

impl TemplateKind {
    fn text(&self) -> &'static str {
        match self {
            TemplateKind::Exists => EXISTS_TEMPLATE,
            TemplateKind::Data => DATA_TEMPLATE,
            TemplateKind::Count => COUNT_TEMPLATE,
            TemplateKind::LatestDate => LATEST_DATE_TEMPLATE,
        }
    }
}

/// Substitution values for one render call. Fields a template does not
/// reference are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContext<'a> {
    /// Result-shape (projection) template text.
    pub shape: &'a str,
    /// Filter clause text.
    pub clause: &'a str,
    /// Rendered `ORDER BY` text, possibly empty.
    pub ordering: &'a str,
    /// Metric field for the latest-date lookup.
    pub latest_by: &'a str,
}

/// Render a template kind with the given substitutions.
pub fn render(kind: TemplateKind, ctx: &TemplateContext<'_>) -> String {
    kind.text()
        .replace("$template", ctx.shape)
        .replace("$clause_script", ctx.clause)
        .replace("$latest_by", ctx.latest_by)
        .replace("$ordering", ctx.ordering)
        .trim_end()
        .to_string()
}
