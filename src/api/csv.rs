//! # CSV Export
//!
//! Flattens a row set into delimited text. Rows that are JSON arrays are
//! treated as positional value lists and emitted without a header; rows
//! that are objects become records with a header taken from the first
//! row's field names. No row-index column is emitted.

use serde_json::Value;

use crate::engine::{EngineResult, NotAvailable};

/// Maximum significant digits for floating-point values.
const SIGNIFICANT_DIGITS: i32 = 20;

/// Render rows as CSV text. An empty row set has no tabular form and
/// fails with `NotAvailable`.
pub fn render(rows: &[Value]) -> EngineResult<String> {
    let first = rows.first().ok_or(NotAvailable)?;

    let mut out = String::new();

    if first.is_array() {
        for row in rows {
            let values = row.as_array().map(Vec::as_slice).unwrap_or(&[]);
            push_line(&mut out, values.iter().map(format_field));
        }
        return Ok(out);
    }

    let headers: Vec<String> = first
        .as_object()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();
    if headers.is_empty() {
        return Err(NotAvailable);
    }

    push_line(&mut out, headers.iter().map(|h| escape(h)));
    for row in rows {
        push_line(
            &mut out,
            headers
                .iter()
                .map(|header| row.get(header).map(format_field).unwrap_or_default()),
        );
    }

    Ok(out)
}

fn push_line(out: &mut String, fields: impl Iterator<Item = String>) {
    let line: Vec<String> = fields.collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

fn format_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => escape(s),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                format_float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        nested => escape(&nested.to_string()),
    }
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render a float with at most `SIGNIFICANT_DIGITS` significant digits:
/// fixed notation for exponents in `[-4, 20)`, scientific otherwise,
/// trailing zeros trimmed.
fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
        let precision = (SIGNIFICANT_DIGITS - 1) as usize;
        trim_scientific(&format!("{value:.precision$e}"))
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}"))
    }
}

fn trim_fraction(formatted: &str) -> String {
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted.to_string()
    }
}

fn trim_scientific(formatted: &str) -> String {
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => format!("{}e{exponent}", trim_fraction(mantissa)),
        None => formatted.to_string(),
    }
}
