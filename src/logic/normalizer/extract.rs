//! Nested Field Extraction
//!
//! Key matching rule: a field is taken from the key that equals the wanted
//! name exactly (case-sensitive). Near misses like `path` never match.

use serde_json::{Map, Value};
use thiserror::Error;

use super::record::{parse_status_code, LogRecord};

// ============================================================================
// KEYS
// ============================================================================

pub const TIMESTAMP_KEY: &str = "Timestamp";
pub const SCOPE_KEY: &str = "Scope";
pub const STATE_KEY: &str = "State";
pub const TRACE_ID_KEY: &str = "TraceId";
pub const PATH_KEY: &str = "Path";
pub const STATUS_CODE_KEY: &str = "StatusCode";
pub const USER_AGENT_KEY: &str = "User-Agent";

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Per-record parse failure, always recovered by the caller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    MalformedJson(String),
    #[error("{field} is not an object (got {kind})")]
    NotAnObject { field: &'static str, kind: &'static str },
}

// ============================================================================
// STATS
// ============================================================================

/// Audit counters for one normalization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub lines_read: u64,
    pub records: u64,
    /// Lines with no `{` at all
    pub lines_without_payload: u64,
    /// Lines whose JSON payload failed to parse (record skipped)
    pub malformed_lines: u64,
    /// Scope/State structures that failed to parse (fields set to null)
    pub malformed_fields: u64,
}

impl NormalizeStats {
    pub fn parse_failures(&self) -> u64 {
        self.malformed_lines + self.malformed_fields
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Parse a nested structure that is either an object or a dict-like string
///
/// String form is read the way a Python dict repr is usually fixed up:
/// single quotes become double quotes before JSON parsing.
pub fn parse_nested(field: &'static str, value: &Value) -> Result<Map<String, Value>, ParseError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::String(raw) => {
            let fixed = raw.replace('\'', "\"");
            match serde_json::from_str::<Value>(&fixed) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(ParseError::NotAnObject { field, kind: value_kind(&other) }),
                Err(e) => Err(ParseError::MalformedJson(e.to_string())),
            }
        }
        other => Err(ParseError::NotAnObject { field, kind: value_kind(other) }),
    }
}

/// First value whose key equals `key` exactly
pub fn first_key_match<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v)
}

/// Trace id from a parsed Scope structure
pub fn extract_trace_id(scope: Option<&Map<String, Value>>) -> Option<String> {
    scope.and_then(|s| first_key_match(s, TRACE_ID_KEY)).and_then(value_to_text)
}

/// Path, status code and user agent from a parsed State structure
pub fn extract_state_fields(
    state: Option<&Map<String, Value>>,
) -> (Option<String>, Option<i64>, Option<String>) {
    let Some(state) = state else {
        return (None, None, None);
    };
    let path = first_key_match(state, PATH_KEY).and_then(value_to_text);
    let status = first_key_match(state, STATUS_CODE_KEY).and_then(value_to_status);
    let user_agent = first_key_match(state, USER_AGENT_KEY).and_then(value_to_text);
    (path, status, user_agent)
}

/// Normalize one parsed log entry into a record
///
/// Never fails: a malformed Scope or State nulls out its fields and is
/// counted in `stats.malformed_fields`.
pub fn normalize_entry(entry: &Map<String, Value>, stats: &mut NormalizeStats) -> LogRecord {
    let scope = nested_or_none(entry, SCOPE_KEY, stats);
    let state = nested_or_none(entry, STATE_KEY, stats);

    let (path, status_code, user_agent) = extract_state_fields(state.as_ref());

    LogRecord {
        timestamp: first_key_match(entry, TIMESTAMP_KEY).and_then(value_to_text),
        trace_id: extract_trace_id(scope.as_ref()),
        path,
        status_code,
        user_agent,
    }
}

/// Normalize one raw log line
///
/// `Ok(None)` when the line carries no JSON payload. The payload starts at
/// the first `{` on the line.
pub fn normalize_line(line: &str, stats: &mut NormalizeStats) -> Result<Option<LogRecord>, ParseError> {
    stats.lines_read += 1;

    let Some(start) = line.find('{') else {
        stats.lines_without_payload += 1;
        return Ok(None);
    };

    let payload = line[start..].trim();
    let entry = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            stats.malformed_lines += 1;
            return Err(ParseError::NotAnObject { field: "line", kind: value_kind(&other) });
        }
        Err(e) => {
            stats.malformed_lines += 1;
            return Err(ParseError::MalformedJson(e.to_string()));
        }
    };

    let record = normalize_entry(&entry, stats);
    stats.records += 1;
    Ok(Some(record))
}

fn nested_or_none(
    entry: &Map<String, Value>,
    key: &'static str,
    stats: &mut NormalizeStats,
) -> Option<Map<String, Value>> {
    let value = first_key_match(entry, key)?;
    if value.is_null() {
        return None;
    }
    match parse_nested(key, value) {
        Ok(map) => Some(map),
        Err(e) => {
            log::debug!("{} could not be parsed: {}", key, e);
            stats.malformed_fields += 1;
            None
        }
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn value_to_status(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => parse_status_code(s),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
