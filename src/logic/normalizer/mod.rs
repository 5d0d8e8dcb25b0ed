//! Normalizer Module - Raw Log Lines to Tabular Records
//!
//! Turns heterogeneous log lines (JSON payload with nested `Scope` and
//! `State` structures) into uniform `LogRecord`s.
//!
//! # Architecture
//! - `record.rs`: `LogRecord`, fill policies, CSV row type
//! - `extract.rs`: first-match key extraction, `ParseError`
//! - `merge.rs`: log folder merging and CSV output
//!
//! # Failure Strategy
//! Malformed nested structure -> field set to null, counted.
//! Malformed line payload -> line skipped with a warning, counted.

pub mod record;
pub mod extract;
pub mod merge;

#[cfg(test)]
mod tests;

pub use record::{LogRecord, RawRow, MISSING_PATH, STATUS_CODE_SENTINEL, UNKNOWN_USER_AGENT};
pub use extract::{normalize_entry, normalize_line, NormalizeStats, ParseError};
pub use merge::{normalize_log_dir, write_records_csv};
