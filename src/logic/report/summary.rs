//! Run Summary
//!
//! Counts for the whole run, one section per approach. Serialized as
//! pretty JSON with no timestamps so identical runs give identical files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::aggregate::ResultAggregator;
use crate::constants::APP_VERSION;
use crate::error::{PipelineError, PipelineResult};

/// Anomalies logged in the preview
pub const PREVIEW_ROWS: usize = 5;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    /// `None` for records without a status code
    pub status_code: Option<i64>,
    pub count: u64,
}

/// Isolation score spread over flagged rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ScoreStats {
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        Some(Self { min, max, mean })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: String,
    pub anomalies: u64,
    pub chunks_not_computed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachSummary {
    pub approach: String,
    pub output_file: String,
    pub rows_processed: u64,
    pub combined_anomalies: u64,
    pub sources: Vec<SourceCount>,
    pub status_distribution: Vec<StatusCount>,
    pub isolation_scores: Option<ScoreStats>,
}

impl ApproachSummary {
    pub fn from_aggregator(aggregator: &ResultAggregator, output_file: &str) -> Self {
        let rows = aggregator.rows();

        let sources = aggregator
            .sources()
            .iter()
            .map(|&source| SourceCount {
                source: source.as_str().to_string(),
                anomalies: rows.iter().filter(|r| r.flags.get(source)).count() as u64,
                chunks_not_computed: aggregator.not_computed(source),
            })
            .collect();

        let scores: Vec<f64> = rows.iter().filter_map(|r| r.isolation_score).collect();

        Self {
            approach: aggregator.approach().to_string(),
            output_file: output_file.to_string(),
            rows_processed: aggregator.rows_seen(),
            combined_anomalies: rows.len() as u64,
            sources,
            status_distribution: status_distribution(rows.iter().map(|r| r.record.status_code)),
            isolation_scores: ScoreStats::from_scores(&scores),
        }
    }
}

/// Status counts ordered by count desc, then code asc (missing first)
pub fn status_distribution(codes: impl Iterator<Item = Option<i64>>) -> Vec<StatusCount> {
    let mut counts: HashMap<Option<i64>, u64> = HashMap::new();
    for code in codes {
        *counts.entry(code).or_insert(0) += 1;
    }
    let mut distribution: Vec<StatusCount> = counts
        .into_iter()
        .map(|(status_code, count)| StatusCount { status_code, count })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then(a.status_code.cmp(&b.status_code)));
    distribution
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub version: String,
    pub rows_processed: u64,
    pub parse_failures: u64,
    pub chunks_processed: u64,
    pub approaches: Vec<ApproachSummary>,
}

impl RunSummary {
    pub fn new(rows_processed: u64, parse_failures: u64, chunks_processed: u64) -> Self {
        Self {
            version: APP_VERSION.to_string(),
            rows_processed,
            parse_failures,
            chunks_processed,
            approaches: Vec::new(),
        }
    }

    pub fn approach(&self, name: &str) -> Option<&ApproachSummary> {
        self.approaches.iter().find(|a| a.approach == name)
    }

    pub fn write_json(&self, path: &Path) -> PipelineResult<()> {
        let body = serde_json::to_string_pretty(self).map_err(|e| PipelineError::json(path, e))?;
        fs::write(path, body).map_err(|e| PipelineError::io(path, e))
    }

    /// Log counts at info
    pub fn log(&self) {
        log::info!(
            "Processed {} rows in {} chunks ({} parse failures)",
            self.rows_processed,
            self.chunks_processed,
            self.parse_failures
        );
        for approach in &self.approaches {
            let per_source: Vec<String> = approach
                .sources
                .iter()
                .map(|s| format!("{}={}", s.source, s.anomalies))
                .collect();
            log::info!(
                "[{}] {} anomalies ({}) -> {}",
                approach.approach,
                approach.combined_anomalies,
                per_source.join(", "),
                approach.output_file
            );
            for s in approach.sources.iter().filter(|s| s.chunks_not_computed > 0) {
                log::info!(
                    "[{}] {} not computed for {} chunk(s)",
                    approach.approach,
                    s.source,
                    s.chunks_not_computed
                );
            }
            if let Some(stats) = approach.isolation_scores {
                log::info!(
                    "[{}] isolation score of flagged rows: min {:.4}, max {:.4}, mean {:.4}",
                    approach.approach,
                    stats.min,
                    stats.max,
                    stats.mean
                );
            }
            for s in &approach.status_distribution {
                let code = s.status_code.map_or_else(|| "missing".to_string(), |c| c.to_string());
                log::info!("[{}]   status {}: {}", approach.approach, code, s.count);
            }
        }
    }
}

/// Log the first few flagged rows of an approach
pub fn log_preview(aggregator: &ResultAggregator) {
    for row in aggregator.rows().iter().take(PREVIEW_ROWS) {
        log::info!(
            "[{}] #{} {} {} {}",
            aggregator.approach(),
            row.record_id,
            row.record.path.as_deref().unwrap_or(""),
            row.record.status_code.map_or_else(String::new, |c| c.to_string()),
            row.record.user_agent.as_deref().unwrap_or("")
        );
    }
}
