//! Result Aggregator
//!
//! Merges `AnomalyLabel`s from any set of sources, keyed by record id.
//! Only records flagged by at least one source are kept, in first-seen order.

use std::collections::HashMap;

use serde::Serialize;

use crate::logic::detection::{AnomalyLabel, LabelSource};
use crate::logic::normalizer::LogRecord;

// ============================================================================
// SOURCE FLAGS
// ============================================================================

/// Per-source verdicts for one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceFlags {
    pub density: bool,
    pub isolation: bool,
    pub signature: bool,
}

impl SourceFlags {
    pub fn get(&self, source: LabelSource) -> bool {
        match source {
            LabelSource::Density => self.density,
            LabelSource::Isolation => self.isolation,
            LabelSource::Signature => self.signature,
        }
    }

    /// OR a verdict in; a `true` is never cleared
    pub fn merge(&mut self, source: LabelSource, is_anomaly: bool) {
        let slot = match source {
            LabelSource::Density => &mut self.density,
            LabelSource::Isolation => &mut self.isolation,
            LabelSource::Signature => &mut self.signature,
        };
        *slot |= is_anomaly;
    }

    pub fn combined(&self) -> bool {
        self.density || self.isolation || self.signature
    }
}

// ============================================================================
// ANOMALY ROW
// ============================================================================

/// One output row: the original record plus its verdicts
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyRow {
    pub record_id: u64,
    pub record: LogRecord,
    pub flags: SourceFlags,
    pub isolation_score: Option<f64>,
}

impl AnomalyRow {
    pub fn is_anomaly_combined(&self) -> bool {
        self.flags.combined()
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Collects flagged rows for one approach
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    approach: String,
    sources: Vec<LabelSource>,
    rows: Vec<AnomalyRow>,
    index: HashMap<u64, usize>,
    rows_seen: u64,
    not_computed: HashMap<LabelSource, u64>,
}

impl ResultAggregator {
    /// `sources` fixes the output columns, in order
    pub fn new(approach: impl Into<String>, sources: &[LabelSource]) -> Self {
        Self {
            approach: approach.into(),
            sources: sources.to_vec(),
            rows: Vec::new(),
            index: HashMap::new(),
            rows_seen: 0,
            not_computed: HashMap::new(),
        }
    }

    pub fn approach(&self) -> &str {
        &self.approach
    }

    pub fn sources(&self) -> &[LabelSource] {
        &self.sources
    }

    pub fn rows(&self) -> &[AnomalyRow] {
        &self.rows
    }

    pub fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    pub fn anomaly_count(&self) -> usize {
        self.rows.len()
    }

    /// Chunks in which `source` produced no labels
    pub fn not_computed(&self, source: LabelSource) -> u64 {
        self.not_computed.get(&source).copied().unwrap_or(0)
    }

    pub fn mark_not_computed(&mut self, source: LabelSource) {
        *self.not_computed.entry(source).or_insert(0) += 1;
    }

    /// Merge one chunk's labels
    ///
    /// `records[i]` has id `first_record_id + i`; `isolation_scores`, when
    /// given, is aligned with `records`. Labels for ids outside the chunk
    /// are ignored.
    pub fn ingest(
        &mut self,
        records: &[LogRecord],
        first_record_id: u64,
        labels: &[AnomalyLabel],
        isolation_scores: Option<&[f64]>,
    ) {
        self.rows_seen += records.len() as u64;

        let mut order: Vec<u64> = Vec::new();
        let mut merged: HashMap<u64, SourceFlags> = HashMap::new();
        for label in labels {
            if !self.sources.contains(&label.source) {
                continue;
            }
            if chunk_position(label.record_id, first_record_id, records.len()).is_none() {
                log::warn!(
                    "{}: label for record {} outside chunk starting at {}",
                    self.approach,
                    label.record_id,
                    first_record_id
                );
                continue;
            }
            merged
                .entry(label.record_id)
                .or_insert_with(|| {
                    order.push(label.record_id);
                    SourceFlags::default()
                })
                .merge(label.source, label.is_anomaly);
        }

        for record_id in order {
            let flags = merged.get(&record_id).copied().unwrap_or_default();
            if !flags.combined() {
                continue;
            }
            let pos = (record_id - first_record_id) as usize;
            let score = isolation_scores.and_then(|s| s.get(pos).copied());

            match self.index.get(&record_id) {
                Some(&existing) => {
                    let row = &mut self.rows[existing];
                    for source in &self.sources {
                        row.flags.merge(*source, flags.get(*source));
                    }
                    row.isolation_score = row.isolation_score.or(score);
                }
                None => {
                    self.index.insert(record_id, self.rows.len());
                    self.rows.push(AnomalyRow {
                        record_id,
                        record: records[pos].clone(),
                        flags,
                        isolation_score: score,
                    });
                }
            }
        }
    }
}

fn chunk_position(record_id: u64, first_record_id: u64, len: usize) -> Option<usize> {
    let offset = record_id.checked_sub(first_record_id)? as usize;
    (offset < len).then_some(offset)
}
