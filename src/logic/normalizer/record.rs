use serde::{Deserialize, Serialize};

/// Fill value for a missing status code before feature computation
pub const STATUS_CODE_SENTINEL: i64 = -1;

/// Fill value for a missing user agent before feature computation
pub const UNKNOWN_USER_AGENT: &str = "Unknown";

/// Coerced value for a missing path in structural features
pub const MISSING_PATH: &str = "nan";

/// One normalized request log entry
///
/// Nullable fields stay `None` here; fill policies are applied by the
/// feature extractors, never by mutating the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(rename = "Trace-id")]
    pub trace_id: Option<String>,
    #[serde(rename = "Path")]
    pub path: Option<String>,
    #[serde(rename = "HTTP Status Code")]
    pub status_code: Option<i64>,
    #[serde(rename = "User Agent")]
    pub user_agent: Option<String>,
}

impl LogRecord {
    /// Path with the "nan" coercion applied
    pub fn path_or_missing(&self) -> &str {
        self.path.as_deref().unwrap_or(MISSING_PATH)
    }

    /// Status code with the -1 sentinel applied
    pub fn status_or_sentinel(&self) -> i64 {
        self.status_code.unwrap_or(STATUS_CODE_SENTINEL)
    }

    /// User agent with the "Unknown" fill applied
    pub fn user_agent_or_unknown(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(UNKNOWN_USER_AGENT)
    }
}

/// Row of the normalized CSV as read from disk
///
/// Everything is text so a bad status cell cannot fail the whole row.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "Trace-id", default)]
    pub trace_id: Option<String>,
    #[serde(rename = "Path", default)]
    pub path: Option<String>,
    #[serde(rename = "HTTP Status Code", default)]
    pub status_code: Option<String>,
    #[serde(rename = "User Agent", default)]
    pub user_agent: Option<String>,
}

impl From<RawRow> for LogRecord {
    fn from(row: RawRow) -> Self {
        Self {
            timestamp: row.timestamp,
            trace_id: row.trace_id,
            path: row.path,
            status_code: row.status_code.as_deref().and_then(parse_status_code),
            user_agent: row.user_agent,
        }
    }
}

/// Parse a status cell: "404", "404.0" and " 404 " are accepted
pub fn parse_status_code(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(code) = trimmed.parse::<i64>() {
        return Some(code);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}
