//! Request Log Anomaly Detection
//!
//! Normalizes request logs, extracts per-chunk feature matrices and flags
//! anomalies three ways: structural features, lexical + structural features,
//! and a user agent denylist.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{PipelineError, PipelineResult};
pub use logic::config::PipelineConfig;
pub use logic::pipeline::Pipeline;
