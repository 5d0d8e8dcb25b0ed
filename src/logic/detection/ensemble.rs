//! Detector Ensemble
//!
//! Standardizes a chunk's feature matrix once, runs both detectors on the
//! scaled copy, and combines them with OR: a row is anomalous when either
//! detector flags it. A detector that could not fit counts as "not
//! flagged" for every row.

use serde::{Deserialize, Serialize};

use super::density::DensityDetector;
use super::isolation::IsolationForest;
use super::scaler::standardize;
use super::types::{AnomalyLabel, DetectionResult, LabelSource};
use crate::logic::config::PipelineConfig;
use crate::logic::features::FeatureMatrix;

// ============================================================================
// CONFIG
// ============================================================================

/// Detector parameters for one approach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    pub neighborhood_radius: f64,
    pub min_neighbors: usize,
    pub contamination: f64,
    pub n_estimators: usize,
    pub max_samples: usize,
    pub random_seed: u64,
}

impl EnsembleConfig {
    /// Parameters for the structural feature set
    pub fn structural(config: &PipelineConfig) -> Self {
        Self::with_contamination(config, config.contamination)
    }

    /// Parameters for the combined lexical + structural feature set
    pub fn lexical(config: &PipelineConfig) -> Self {
        Self::with_contamination(config, config.lexical_contamination)
    }

    fn with_contamination(config: &PipelineConfig, contamination: f64) -> Self {
        Self {
            neighborhood_radius: config.neighborhood_radius,
            min_neighbors: config.min_neighbors,
            contamination,
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
            random_seed: config.random_seed,
        }
    }
}

// ============================================================================
// RESULT
// ============================================================================

/// Both detectors' output for one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleResult {
    pub record_ids: Vec<u64>,
    pub density: DetectionResult,
    pub isolation: DetectionResult,
}

impl EnsembleResult {
    /// OR of the two detectors; missing output counts as `false`
    pub fn consensus(&self) -> Vec<bool> {
        (0..self.record_ids.len())
            .map(|i| flag_at(&self.density, i) || flag_at(&self.isolation, i))
            .collect()
    }

    /// One label per row per computed detector, in row order
    pub fn labels(&self) -> Vec<AnomalyLabel> {
        let mut labels = Vec::with_capacity(self.record_ids.len() * 2);
        for (i, &id) in self.record_ids.iter().enumerate() {
            if let Ok(d) = &self.density {
                labels.push(AnomalyLabel::new(id, LabelSource::Density, d.flags[i]));
            }
            if let Ok(d) = &self.isolation {
                labels.push(AnomalyLabel::new(id, LabelSource::Isolation, d.flags[i]));
            }
        }
        labels
    }

    /// Isolation score of row `i`, when computed
    pub fn isolation_score(&self, i: usize) -> Option<f64> {
        self.isolation
            .as_ref()
            .ok()
            .and_then(|d| d.scores.as_ref())
            .and_then(|s| s.get(i).copied())
    }
}

fn flag_at(result: &DetectionResult, i: usize) -> bool {
    result.as_ref().map_or(false, |d| d.flags.get(i).copied().unwrap_or(false))
}

// ============================================================================
// ENSEMBLE
// ============================================================================

/// Density + isolation over one standardized matrix
#[derive(Debug, Clone, Copy)]
pub struct DetectorEnsemble {
    density: DensityDetector,
    isolation: IsolationForest,
}

impl DetectorEnsemble {
    pub fn new(config: &EnsembleConfig) -> Self {
        Self {
            density: DensityDetector::new(config.neighborhood_radius, config.min_neighbors),
            isolation: IsolationForest::new(
                config.n_estimators,
                config.max_samples,
                config.contamination,
                config.random_seed,
            ),
        }
    }

    /// Run both detectors; failures are per detector, never a panic
    pub fn run(&self, matrix: &FeatureMatrix) -> EnsembleResult {
        let record_ids = matrix.record_ids();

        let scaled = match standardize(&matrix.to_array()) {
            Ok(scaled) => scaled,
            Err(e) => {
                return EnsembleResult {
                    record_ids,
                    density: Err(e.clone()),
                    isolation: Err(e),
                };
            }
        };

        EnsembleResult {
            record_ids,
            density: self.density.detect(&scaled),
            isolation: self.isolation.detect(&scaled),
        }
    }
}
