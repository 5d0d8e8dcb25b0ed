//! Structural Feature Extraction
//!
//! Heuristic path features plus chunk-local status one-hot and
//! path frequency columns.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use super::layout::{
    FeatureSchema, PATH_FEATURE_LAYOUT, PATH_FREQUENCY_COLUMN, STATUS_COLUMN_PREFIX,
};
use super::vector::{ExtractionInput, FeatureMatrix, FeatureStrategy, FeatureVector};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::normalizer::LogRecord;

// ============================================================================
// PATTERNS
// ============================================================================

/// SQL keywords matched anywhere in the lowercased path
pub const SQL_KEYWORDS: &[&str] = &["select", "union", "delete", "drop", "insert", "exec", "update"];

/// Extensions matched at the end of the lowercased path
pub const SUSPICIOUS_EXTENSIONS: &[&str] = &["php", "asp", "aspx", "exe", "bat", "cmd"];

static SPECIAL_CHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9/]").expect("special char pattern"));

static SQL_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("({})", SQL_KEYWORDS.join("|"))).expect("sql keyword pattern")
});

static SUSPICIOUS_EXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\.({})$", SUSPICIOUS_EXTENSIONS.join("|"))).expect("extension pattern")
});

// ============================================================================
// PATH FEATURES
// ============================================================================

/// Fixed per-path features (first block of the structural layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathFeatures {
    pub path_length: usize,
    pub special_chars: usize,
    pub has_sql_keywords: bool,
    pub has_path_traversal: bool,
    pub has_suspicious_extensions: bool,
}

impl PathFeatures {
    /// Values in `PATH_FEATURE_LAYOUT` order
    pub fn to_values(&self) -> [f64; 5] {
        [
            self.path_length as f64,
            self.special_chars as f64,
            flag(self.has_sql_keywords),
            flag(self.has_path_traversal),
            flag(self.has_suspicious_extensions),
        ]
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Compute the fixed path features of one path string
pub fn extract_path_features(path: &str) -> PathFeatures {
    let lower = path.to_lowercase();
    PathFeatures {
        path_length: path.chars().count(),
        special_chars: SPECIAL_CHAR_RE.find_iter(path).count(),
        has_sql_keywords: SQL_KEYWORD_RE.is_match(&lower),
        has_path_traversal: path.contains("..") || path.contains("//"),
        has_suspicious_extensions: SUSPICIOUS_EXT_RE.is_match(&lower),
    }
}

/// Occurrences of each (coerced) path in the chunk, case-sensitive
pub fn path_frequencies(records: &[LogRecord]) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.path_or_missing()).or_insert(0) += 1;
    }
    counts
}

/// Distinct (filled) status codes of the chunk, ascending
pub fn observed_status_codes(records: &[LogRecord]) -> Vec<i64> {
    records
        .iter()
        .map(LogRecord::status_or_sentinel)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Structural schema for a given set of status codes
pub fn structural_schema(status_codes: &[i64]) -> FeatureSchema {
    let mut columns: Vec<String> = PATH_FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect();
    columns.extend(status_codes.iter().map(|c| format!("{}{}", STATUS_COLUMN_PREFIX, c)));
    columns.push(PATH_FREQUENCY_COLUMN.to_string());
    FeatureSchema::new(columns)
}

// ============================================================================
// STRATEGY
// ============================================================================

/// Path heuristics + status one-hot + path frequency
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralStrategy;

impl StructuralStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureStrategy for StructuralStrategy {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> PipelineResult<FeatureMatrix> {
        let records = input.records;
        let status_codes = observed_status_codes(records);
        let frequencies = path_frequencies(records);
        let schema = structural_schema(&status_codes);
        let mut matrix = FeatureMatrix::with_capacity(schema, records.len());

        for (pos, record) in records.iter().enumerate() {
            let path = record.path_or_missing();
            let status = record.status_or_sentinel();

            let mut values = Vec::with_capacity(matrix.n_features());
            values.extend_from_slice(&extract_path_features(path).to_values());
            values.extend(status_codes.iter().map(|&c| flag(c == status)));
            values.push(frequencies.get(path).copied().unwrap_or(0) as f64);

            let vector = FeatureVector::new(input.record_id(pos), matrix.schema(), values);
            matrix
                .push(vector)
                .map_err(|e| PipelineError::SchemaMismatch(e.to_string()))?;
        }

        Ok(matrix)
    }
}

// ============================================================================
// TESTS
// ============================================================================
