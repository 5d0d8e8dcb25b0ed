//! Central Configuration Constants
//!
//! Single source of truth for all pipeline defaults.
//! `PipelineConfig::default()` is built from these values.

use crate::error::{PipelineError, PipelineResult};

/// Rows per processing chunk
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Expected anomaly fraction for the structural feature set
pub const DEFAULT_STRUCTURAL_CONTAMINATION: f64 = 0.05;

/// Expected anomaly fraction for the combined lexical + structural set
pub const DEFAULT_LEXICAL_CONTAMINATION: f64 = 0.01;

/// DBSCAN neighborhood radius (eps)
pub const DEFAULT_NEIGHBORHOOD_RADIUS: f64 = 0.5;

/// DBSCAN minimum neighborhood size, point itself included
pub const DEFAULT_MIN_NEIGHBORS: usize = 5;

/// TF-IDF vocabulary cap
pub const DEFAULT_TFIDF_VOCAB_SIZE: usize = 500;

/// Trees in the isolation forest
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Isolation tree sub-sample size (capped by chunk rows)
pub const DEFAULT_MAX_SAMPLES: usize = 256;

/// Isolation forest seed
pub const DEFAULT_RANDOM_SEED: u64 = 42;

// ============================================
// Output file names
// ============================================

pub const STRUCTURAL_OUTPUT_FILE: &str = "anomalies_detected_approach1.csv";
pub const LEXICAL_OUTPUT_FILE: &str = "anomalies_detected_approach2.csv";
pub const SIGNATURE_OUTPUT_FILE: &str = "anomalies_useragents_approach3.csv";
pub const SUMMARY_OUTPUT_FILE: &str = "anomaly_summary.json";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Read a parseable value from the environment
///
/// `Ok(None)` when unset; a value that does not parse is a config error.
pub fn env_parse<T: std::str::FromStr>(key: &str) -> PipelineResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => parse_env_value(key, &raw).map(Some),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(raw)) => Err(PipelineError::Config(format!(
            "invalid value for {}: {:?}",
            key, raw
        ))),
    }
}

/// Parse one raw env value, naming the variable on failure
pub fn parse_env_value<T: std::str::FromStr>(key: &str, raw: &str) -> PipelineResult<T> {
    raw.trim().parse().map_err(|_| {
        PipelineError::Config(format!("invalid value for {}: {:?}", key, raw))
    })
}

/// Get user agent denylist file from environment
pub fn get_user_agent_file() -> Option<std::path::PathBuf> {
    std::env::var("ANOMALY_USER_AGENT_FILE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(std::path::PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env_value::<usize>("ANOMALY_CHUNK_SIZE", " 500 ").unwrap(), 500);

        let err = parse_env_value::<usize>("ANOMALY_CHUNK_SIZE", "-5").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(err.to_string().contains("ANOMALY_CHUNK_SIZE"));
        assert!(err.to_string().contains("-5"));

        assert!(parse_env_value::<f64>("ANOMALY_CONTAMINATION", "abc").is_err());
    }
}
