//! Feature Layout - Column Schema Definition
//!
//! **This file controls the feature schema**
//!
//! The structural path features have a fixed layout. Status one-hot columns
//! and TF-IDF columns are chunk-local, so every matrix carries its own
//! `FeatureSchema` with a CRC32 hash of the column names. Two matrices are
//! only joined (or a vector only pushed) when the hashes agree.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FIXED LAYOUT (structural strategy)
// ============================================================================

/// Path features in exact column order
pub const PATH_FEATURE_LAYOUT: &[&str] = &[
    "path_length",               // 0: characters in the path
    "special_chars",             // 1: matches of [^a-zA-Z0-9/]
    "has_sql_keywords",          // 2: 0/1
    "has_path_traversal",        // 3: 0/1, ".." or "//"
    "has_suspicious_extensions", // 4: 0/1
];

/// Number of fixed path features
pub const PATH_FEATURE_COUNT: usize = 5;

/// Last structural column, after the status one-hot block
pub const PATH_FREQUENCY_COLUMN: &str = "path_frequency";

/// Prefix of status one-hot columns (`status_200`, `status_-1`, ...)
pub const STATUS_COLUMN_PREFIX: &str = "status_";

/// Prefix of TF-IDF term columns
pub const TFIDF_COLUMN_PREFIX: &str = "tfidf_";

// ============================================================================
// SCHEMA
// ============================================================================

/// Ordered column names plus their layout hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
    hash: u32,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        let hash = compute_layout_hash(&columns);
        Self { columns, hash }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn layout_hash(&self) -> u32 {
        self.hash
    }

    /// Get column index by name (O(n), schemas are small)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Get column name by index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// Schema of `self` followed by `other`
    pub fn concat(&self, other: &FeatureSchema) -> FeatureSchema {
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        FeatureSchema::new(columns)
    }
}

/// CRC32 over column names, NUL separated
pub fn compute_layout_hash(columns: &[String]) -> u32 {
    let mut hasher = Hasher::new();
    for name in columns {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when a feature vector doesn't match its matrix schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMismatchError {
    pub expected_hash: u32,
    pub expected_len: usize,
    pub actual_hash: u32,
    pub actual_len: usize,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Feature layout mismatch: expected {} columns (hash: {:08x}), got {} (hash: {:08x})",
            self.expected_len, self.expected_hash, self.actual_len, self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

/// Validate vector metadata against a schema
pub fn validate_layout(
    schema: &FeatureSchema,
    incoming_hash: u32,
    incoming_len: usize,
) -> Result<(), LayoutMismatchError> {
    if incoming_hash != schema.layout_hash() || incoming_len != schema.len() {
        return Err(LayoutMismatchError {
            expected_hash: schema.layout_hash(),
            expected_len: schema.len(),
            actual_hash: incoming_hash,
            actual_len: incoming_len,
        });
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
