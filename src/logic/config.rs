//! Pipeline Configuration
//!
//! Configuration for a detection run.
//! Layers: defaults -> JSON config file -> environment -> CLI flags.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants::{self, env_parse};
use crate::error::{PipelineError, PipelineResult};

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

/// Pipeline configuration (can be loaded from config file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rows per chunk; all statistics are chunk-local
    pub chunk_size: usize,
    /// Isolation contamination for structural features
    pub contamination: f64,
    /// Isolation contamination for combined lexical + structural features
    pub lexical_contamination: f64,
    /// DBSCAN eps
    pub neighborhood_radius: f64,
    /// DBSCAN min_samples
    pub min_neighbors: usize,
    /// TF-IDF vocabulary cap
    pub tfidf_vocab_size: usize,
    pub n_estimators: usize,
    pub max_samples: usize,
    pub random_seed: u64,
    /// Inline denylist; replaced by file contents when a file is set
    pub suspicious_user_agents: Vec<String>,
    pub suspicious_user_agent_file: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            contamination: constants::DEFAULT_STRUCTURAL_CONTAMINATION,
            lexical_contamination: constants::DEFAULT_LEXICAL_CONTAMINATION,
            neighborhood_radius: constants::DEFAULT_NEIGHBORHOOD_RADIUS,
            min_neighbors: constants::DEFAULT_MIN_NEIGHBORS,
            tfidf_vocab_size: constants::DEFAULT_TFIDF_VOCAB_SIZE,
            n_estimators: constants::DEFAULT_N_ESTIMATORS,
            max_samples: constants::DEFAULT_MAX_SAMPLES,
            random_seed: constants::DEFAULT_RANDOM_SEED,
            suspicious_user_agents: crate::logic::signature::default_signatures(),
            suspicious_user_agent_file: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    /// Load config from a JSON file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let data = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
        serde_json::from_slice(&data).map_err(|e| PipelineError::json(path, e))
    }

    /// Apply `ANOMALY_*` environment overrides; an unparseable value is fatal
    pub fn apply_env(&mut self) -> PipelineResult<()> {
        if let Some(v) = env_parse("ANOMALY_CHUNK_SIZE")? {
            self.chunk_size = v;
        }
        if let Some(v) = env_parse("ANOMALY_CONTAMINATION")? {
            self.contamination = v;
        }
        if let Some(v) = env_parse("ANOMALY_LEXICAL_CONTAMINATION")? {
            self.lexical_contamination = v;
        }
        if let Some(v) = env_parse("ANOMALY_RADIUS")? {
            self.neighborhood_radius = v;
        }
        if let Some(v) = env_parse("ANOMALY_MIN_NEIGHBORS")? {
            self.min_neighbors = v;
        }
        if let Some(v) = env_parse("ANOMALY_TFIDF_VOCAB")? {
            self.tfidf_vocab_size = v;
        }
        if let Some(v) = env_parse("ANOMALY_SEED")? {
            self.random_seed = v;
        }
        if let Some(path) = constants::get_user_agent_file() {
            self.suspicious_user_agent_file = Some(path);
        }
        Ok(())
    }

    /// Reject invalid parameters before processing starts
    pub fn validate(&self) -> PipelineResult<()> {
        if self.chunk_size == 0 {
            return Err(PipelineError::Config("chunk_size must be > 0".to_string()));
        }
        check_contamination("contamination", self.contamination)?;
        check_contamination("lexical_contamination", self.lexical_contamination)?;
        if !self.neighborhood_radius.is_finite() || self.neighborhood_radius <= 0.0 {
            return Err(PipelineError::Config(format!(
                "neighborhood_radius must be a positive number, got {}",
                self.neighborhood_radius
            )));
        }
        if self.min_neighbors == 0 {
            return Err(PipelineError::Config("min_neighbors must be >= 1".to_string()));
        }
        if self.tfidf_vocab_size == 0 {
            return Err(PipelineError::Config("tfidf_vocab_size must be >= 1".to_string()));
        }
        if self.n_estimators == 0 {
            return Err(PipelineError::Config("n_estimators must be >= 1".to_string()));
        }
        if self.max_samples < 2 {
            return Err(PipelineError::Config("max_samples must be >= 2".to_string()));
        }
        Ok(())
    }
}

fn check_contamination(name: &str, value: f64) -> PipelineResult<()> {
    if value.is_finite() && value > 0.0 && value <= 0.5 {
        Ok(())
    } else {
        Err(PipelineError::Config(format!(
            "{} must be in (0, 0.5], got {}",
            name, value
        )))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.chunk_size, 10_000);
        assert_eq!(config.contamination, 0.05);
        assert_eq!(config.lexical_contamination, 0.01);
        assert_eq!(config.neighborhood_radius, 0.5);
        assert_eq!(config.min_neighbors, 5);
        assert_eq!(config.tfidf_vocab_size, 500);
        assert_eq!(config.suspicious_user_agents.len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reject_zero_chunk_size() {
        let config = PipelineConfig { chunk_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_reject_bad_contamination() {
        for bad in [0.0, -0.1, 0.75, f64::NAN] {
            let config = PipelineConfig { contamination: bad, ..Default::default() };
            assert!(config.validate().is_err(), "contamination {} accepted", bad);
        }
        let config = PipelineConfig { lexical_contamination: 0.9, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_bad_radius() {
        let config = PipelineConfig { neighborhood_radius: -0.5, ..Default::default() };
        assert!(config.validate().is_err());
        let config = PipelineConfig { neighborhood_radius: f64::INFINITY, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"chunk_size": 500, "min_neighbors": 3}}"#).unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.min_neighbors, 3);
        assert_eq!(config.contamination, 0.05);
        assert_eq!(config.random_seed, 42);
    }

    #[test]
    fn test_invalid_env_value_is_config_error() {
        // Only test touching this variable
        std::env::set_var("ANOMALY_MIN_NEIGHBORS", "five");
        let mut config = PipelineConfig::default();
        let result = config.apply_env();
        std::env::remove_var("ANOMALY_MIN_NEIGHBORS");

        assert!(matches!(result, Err(PipelineError::Config(_))));
        assert_eq!(config.min_neighbors, 5);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = PipelineConfig::from_file(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(PipelineError::Io { .. })));
    }
}
