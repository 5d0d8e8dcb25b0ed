//! Error handling

use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Fatal pipeline errors
///
/// Per-record parse failures and per-chunk detector failures are NOT here;
/// they are recovered where they happen (`ParseError`, `DetectorError`).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid configuration, raised before any processing starts
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error on {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two feature tables that must line up row-for-row do not
    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io { path: path.into(), source }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        PipelineError::Csv { path: path.into(), source }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PipelineError::Json { path: path.into(), source }
    }

    /// Is this error fatal for the whole run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PipelineError::SchemaMismatch(_))
    }
}
