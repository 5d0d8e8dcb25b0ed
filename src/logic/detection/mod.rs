//! Detection Module - Unsupervised Anomaly Detector Ensemble
//!
//! ## Structure
//! - `types`: `LabelSource`, `AnomalyLabel`, `Detection`, `DetectorError`
//! - `scaler`: per-chunk standardization
//! - `density`: DBSCAN noise detector
//! - `isolation`: seeded isolation forest
//! - `ensemble`: runs both, OR consensus
//!
//! ## Usage
//! ```ignore
//! use crate::logic::detection::{DetectorEnsemble, EnsembleConfig};
//!
//! let ensemble = DetectorEnsemble::new(&EnsembleConfig::structural(&config));
//! let result = ensemble.run(&matrix);
//! let flagged = result.consensus();
//! ```

pub mod types;
pub mod scaler;
pub mod density;
pub mod isolation;
pub mod ensemble;


// Re-export main types for convenience
pub use types::{AnomalyLabel, Detection, DetectionResult, DetectorError, LabelSource};
pub use scaler::{standardize, StandardScaler};
pub use density::DensityDetector;
pub use isolation::IsolationForest;
pub use ensemble::{DetectorEnsemble, EnsembleConfig, EnsembleResult};
