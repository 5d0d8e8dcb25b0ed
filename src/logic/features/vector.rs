//! Feature Vector & Matrix - Core data structures for detector input
//!
//! A `FeatureMatrix` owns one `FeatureSchema`; every row is a
//! `FeatureVector` stamped with that schema's layout hash and keyed to
//! exactly one record. Row order is the chunk's record order.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::layout::{validate_layout, FeatureSchema, LayoutMismatchError};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::normalizer::LogRecord;

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Feature values of one record, in schema order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Row index of the record in the whole input
    pub record_id: u64,
    /// Hash of the schema these values follow
    pub layout_hash: u32,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(record_id: u64, schema: &FeatureSchema, values: Vec<f64>) -> Self {
        Self {
            record_id,
            layout_hash: schema.layout_hash(),
            values,
        }
    }

    /// Get feature by index
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Get feature by name
    pub fn get_by_name(&self, schema: &FeatureSchema, name: &str) -> Option<f64> {
        schema.index_of(name).and_then(|i| self.get(i))
    }

    /// (name, value) pairs in schema order
    pub fn named_values<'a>(
        &'a self,
        schema: &'a FeatureSchema,
    ) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Validate that this vector belongs to `schema`
    pub fn validate(&self, schema: &FeatureSchema) -> Result<(), LayoutMismatchError> {
        validate_layout(schema, self.layout_hash, self.values.len())
    }
}

// ============================================================================
// FEATURE MATRIX
// ============================================================================

/// Ordered rows sharing one column schema
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    schema: FeatureSchema,
    rows: Vec<FeatureVector>,
}

impl FeatureMatrix {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema, rows: Vec::new() }
    }

    pub fn with_capacity(schema: FeatureSchema, rows: usize) -> Self {
        Self { schema, rows: Vec::with_capacity(rows) }
    }

    /// Append a row; rejects vectors built for another schema
    pub fn push(&mut self, vector: FeatureVector) -> Result<(), LayoutMismatchError> {
        vector.validate(&self.schema)?;
        self.rows.push(vector);
        Ok(())
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.schema.len()
    }

    pub fn record_ids(&self) -> Vec<u64> {
        self.rows.iter().map(|r| r.record_id).collect()
    }

    /// All values of one named column
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.schema.index_of(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Dense row-major copy for the detectors
    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.rows.len(), self.schema.len()), |(i, j)| {
            self.rows[i].values[j]
        })
    }

    /// Column-wise join: `self` columns first, then `other`
    ///
    /// Rows are matched positionally and must carry the same record ids.
    pub fn hconcat(&self, other: &FeatureMatrix) -> PipelineResult<FeatureMatrix> {
        if self.len() != other.len() {
            return Err(PipelineError::SchemaMismatch(format!(
                "row counts differ: {} vs {}",
                self.len(),
                other.len()
            )));
        }

        let schema = self.schema.concat(&other.schema);
        let mut joined = FeatureMatrix::with_capacity(schema, self.len());

        for (left, right) in self.rows.iter().zip(other.rows.iter()) {
            if left.record_id != right.record_id {
                return Err(PipelineError::SchemaMismatch(format!(
                    "record {} aligned with record {}",
                    left.record_id, right.record_id
                )));
            }
            let mut values = Vec::with_capacity(left.values.len() + right.values.len());
            values.extend_from_slice(&left.values);
            values.extend_from_slice(&right.values);
            let vector = FeatureVector::new(left.record_id, &joined.schema, values);
            joined
                .push(vector)
                .map_err(|e| PipelineError::SchemaMismatch(e.to_string()))?;
        }
        Ok(joined)
    }
}

// ============================================================================
// FEATURE STRATEGY TRAIT
// ============================================================================

/// Everything a strategy may read, passed explicitly
#[derive(Debug, Clone, Copy)]
pub struct ExtractionInput<'a> {
    pub records: &'a [LogRecord],
    /// Record id of `records[0]`
    pub first_record_id: u64,
    /// Precomputed numeric features for the same rows, if any
    pub numeric: Option<&'a FeatureMatrix>,
}

impl<'a> ExtractionInput<'a> {
    pub fn new(records: &'a [LogRecord], first_record_id: u64) -> Self {
        Self { records, first_record_id, numeric: None }
    }

    pub fn with_numeric(mut self, numeric: &'a FeatureMatrix) -> Self {
        self.numeric = Some(numeric);
        self
    }

    pub fn record_id(&self, position: usize) -> u64 {
        self.first_record_id + position as u64
    }
}

/// Trait for feature extraction strategies
///
/// Implementations never fail for a single malformed row; an `Err` means
/// the inputs themselves do not line up.
pub trait FeatureStrategy {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Build the chunk's feature matrix, one row per record, in order
    fn extract(&self, input: &ExtractionInput<'_>) -> PipelineResult<FeatureMatrix>;
}

// ============================================================================
// TESTS
// ============================================================================
