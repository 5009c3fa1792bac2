//! Structured JSON line logger.
//!
//! - One log line = one event
//! - Event key first, then severity, then fields sorted by key
//! - Synchronous, unbuffered
//! - Fire-and-forget: logging failures never affect the request

use std::fmt;
use std::io::{self, Write};

use serde_json::Value;

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Emits structured JSON lines to stdout/stderr.
pub struct Logger;

impl Logger {
    /// Log an event with JSON-typed fields.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, Value)]) {
        match severity {
            Severity::Error => Self::log_to_writer(severity, event, fields, &mut io::stderr()),
            _ => Self::log_to_writer(severity, event, fields, &mut io::stdout()),
        }
    }

    pub fn info(event: &str, fields: &[(&str, Value)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, Value)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, Value)]) {
        Self::log(Severity::Error, event, fields);
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, Value)],
        writer: &mut W,
    ) {
        let mut line = String::with_capacity(256);

        line.push_str("{\"event\":");
        line.push_str(&encode(&Value::String(event.to_string())));
        line.push_str(",\"severity\":\"");
        line.push_str(severity.as_str());
        line.push('"');

        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);

        for (key, value) in sorted {
            line.push(',');
            line.push_str(&encode(&Value::String((*key).to_string())));
            line.push(':');
            line.push_str(&encode(value));
        }

        line.push_str("}\n");

        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

fn encode(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Capture a log line for assertions.
#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, Value)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_is_valid_json() {
        let line = capture_log(Severity::Info, "DB_QUERY", &[("charge", json!(2.33))]);
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "DB_QUERY");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["charge"], 2.33);
    }

    #[test]
    fn test_field_order_is_deterministic() {
        let a = capture_log(
            Severity::Info,
            "E",
            &[("zulu", json!(1)), ("alpha", json!(2))],
        );
        let b = capture_log(
            Severity::Info,
            "E",
            &[("alpha", json!(2)), ("zulu", json!(1))],
        );
        assert_eq!(a, b);
        assert!(a.find("alpha").unwrap() < a.find("zulu").unwrap());
    }

    #[test]
    fn test_event_key_comes_first() {
        let line = capture_log(Severity::Info, "E", &[("aaa", json!(1))]);
        assert!(line.starts_with("{\"event\":"));
    }

    #[test]
    fn test_one_line_per_event() {
        let line = capture_log(Severity::Info, "E", &[("text", json!("a\nb"))]);
        assert_eq!(line.chars().filter(|c| *c == '\n').count(), 1);
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_structured_field_values() {
        let line = capture_log(
            Severity::Info,
            "E",
            &[("parameters", json!([{"name": "@a", "value": 1}]))],
        );
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["parameters"][0]["name"], "@a");
    }
}
