//! Detection Types
//!
//! Core types shared by the detectors, the signature filter and the
//! aggregator. No logic here - only data structures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// LABEL SOURCE
// ============================================================================

/// Which detector produced a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSource {
    /// Density clustering (DBSCAN noise points)
    Density,
    /// Isolation forest outliers
    Isolation,
    /// User agent denylist
    Signature,
}

impl LabelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelSource::Density => "density",
            LabelSource::Isolation => "isolation",
            LabelSource::Signature => "signature",
        }
    }

    /// Output CSV column for this source
    pub fn column_name(&self) -> &'static str {
        match self {
            LabelSource::Density => "is_anomaly_density",
            LabelSource::Isolation => "is_anomaly_isolation",
            LabelSource::Signature => "is_anomaly_signature",
        }
    }
}

impl std::fmt::Display for LabelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ANOMALY LABEL
// ============================================================================

/// One source's verdict on one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyLabel {
    pub record_id: u64,
    pub source: LabelSource,
    pub is_anomaly: bool,
}

impl AnomalyLabel {
    pub fn new(record_id: u64, source: LabelSource, is_anomaly: bool) -> Self {
        Self { record_id, source, is_anomaly }
    }
}

// ============================================================================
// DETECTOR OUTPUT
// ============================================================================

/// Chunk-level detector failure; the chunk's output is "not computed"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectorError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

impl DetectorError {
    pub fn insufficient(reason: impl Into<String>) -> Self {
        DetectorError::InsufficientData(reason.into())
    }
}

/// Per-row output of one detector over one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// `true` = anomalous, row order of the input matrix
    pub flags: Vec<bool>,
    /// Raw anomaly scores when the detector has them (higher = stranger)
    pub scores: Option<Vec<f64>>,
}

impl Detection {
    pub fn from_flags(flags: Vec<bool>) -> Self {
        Self { flags, scores: None }
    }

    pub fn anomaly_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }
}

pub type DetectionResult = Result<Detection, DetectorError>;
