//! Report Module - Label Aggregation and Output
//!
//! ## Structure
//! - `aggregate`: `ResultAggregator`, per-record OR of source labels
//! - `writer`: per-approach anomaly CSV
//! - `summary`: run counts, JSON summary, log preview

pub mod aggregate;
pub mod writer;
pub mod summary;


pub use aggregate::{AnomalyRow, ResultAggregator, SourceFlags};
pub use writer::{anomaly_header, write_anomalies_csv, COMBINED_COLUMN, RECORD_COLUMNS};
pub use summary::{
    log_preview, status_distribution, ApproachSummary, RunSummary, ScoreStats, StatusCount,
};
