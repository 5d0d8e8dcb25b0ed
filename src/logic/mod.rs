//! Logic Module - Detection Pipeline & Engines
//!
//! ## Architecture
//! - `normalizer/` - raw log lines to `LogRecord`s
//! - `features/` - structural and lexical feature strategies
//! - `detection/` - scaler, DBSCAN, isolation forest, ensemble
//! - `signature/` - user agent denylist
//! - `report/` - label aggregation, CSV + JSON output
//! - `pipeline/` - chunked run tying it all together

pub mod config;

// Engines
pub mod normalizer;
pub mod features;
pub mod detection;
pub mod signature;

// Output + orchestration
pub mod report;
pub mod pipeline;
