use std::fs;
use std::path::Path;

use super::reader::{Chunk, ChunkedReader};
use crate::constants::{
    LEXICAL_OUTPUT_FILE, SIGNATURE_OUTPUT_FILE, STRUCTURAL_OUTPUT_FILE, SUMMARY_OUTPUT_FILE,
};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::config::PipelineConfig;
use crate::logic::detection::{
    AnomalyLabel, DetectorEnsemble, EnsembleConfig, EnsembleResult, LabelSource,
};
use crate::logic::features::{
    ExtractionInput, FeatureMatrix, FeatureStrategy, LexicalStrategy, StructuralStrategy,
};
use crate::logic::report::{
    log_preview, write_anomalies_csv, ApproachSummary, ResultAggregator, RunSummary,
};
use crate::logic::signature::SignatureFilter;

const ENSEMBLE_SOURCES: [LabelSource; 2] = [LabelSource::Density, LabelSource::Isolation];

/// Approaches 1 and 2 also carry the denylist column in their combined flag
const FEATURE_APPROACH_SOURCES: [LabelSource; 3] =
    [LabelSource::Density, LabelSource::Isolation, LabelSource::Signature];

/// Aggregators for the three approaches, in output order
#[derive(Debug, Clone)]
pub struct Approaches {
    pub structural: ResultAggregator,
    pub lexical: ResultAggregator,
    pub signature: ResultAggregator,
}

impl Approaches {
    pub fn new() -> Self {
        Self {
            structural: ResultAggregator::new("structural", &FEATURE_APPROACH_SOURCES),
            lexical: ResultAggregator::new("lexical", &FEATURE_APPROACH_SOURCES),
            signature: ResultAggregator::new("signature", &[LabelSource::Signature]),
        }
    }

    fn with_outputs(&self) -> [(&ResultAggregator, &'static str); 3] {
        [
            (&self.structural, STRUCTURAL_OUTPUT_FILE),
            (&self.lexical, LEXICAL_OUTPUT_FILE),
            (&self.signature, SIGNATURE_OUTPUT_FILE),
        ]
    }
}

impl Default for Approaches {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequential chunked detection over a normalized CSV
pub struct Pipeline {
    config: PipelineConfig,
    signatures: SignatureFilter,
    structural: StructuralStrategy,
    lexical: LexicalStrategy,
    structural_ensemble: DetectorEnsemble,
    lexical_ensemble: DetectorEnsemble,
}

impl Pipeline {
    /// Validate config and load the denylist; nothing is read yet
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        let signatures = SignatureFilter::from_config(&config)?;
        if signatures.is_empty() {
            log::warn!("User agent denylist is empty; signature approach will flag nothing");
        }

        Ok(Self {
            signatures,
            structural: StructuralStrategy::new(),
            lexical: LexicalStrategy::new(config.tfidf_vocab_size),
            structural_ensemble: DetectorEnsemble::new(&EnsembleConfig::structural(&config)),
            lexical_ensemble: DetectorEnsemble::new(&EnsembleConfig::lexical(&config)),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Detect over one chunk, merging labels into `approaches`
    ///
    /// Schema mismatches skip the affected approach for this chunk only.
    pub fn process_chunk(&self, chunk: &Chunk, approaches: &mut Approaches) -> PipelineResult<()> {
        let records = &chunk.records;
        let input = ExtractionInput::new(records, chunk.first_record_id);
        let signature_labels = self.signatures.label_chunk(records, chunk.first_record_id);

        // 1. Structural features -> approach 1
        let structural = match self.structural.extract(&input) {
            Ok(matrix) => {
                log::debug!(
                    "Chunk {}: structural layout {:08x} ({} columns)",
                    chunk.index,
                    matrix.schema().layout_hash(),
                    matrix.n_features()
                );
                let result = self.structural_ensemble.run(&matrix);
                merge_ensemble(&mut approaches.structural, chunk, &result, &signature_labels);
                Some(matrix)
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                skip_approach(&mut approaches.structural, chunk, &e, &signature_labels);
                None
            }
        };

        // 2. Lexical features joined after the structural ones -> approach 2
        match structural {
            Some(numeric) => {
                self.run_lexical(chunk, &numeric, &signature_labels, approaches)?
            }
            None => skip_approach(
                &mut approaches.lexical,
                chunk,
                &PipelineError::SchemaMismatch("no structural features for chunk".to_string()),
                &signature_labels,
            ),
        }

        // 3. Signature match -> approach 3
        approaches.signature.ingest(records, chunk.first_record_id, &signature_labels, None);
        Ok(())
    }

    fn run_lexical(
        &self,
        chunk: &Chunk,
        numeric: &FeatureMatrix,
        signature_labels: &[AnomalyLabel],
        approaches: &mut Approaches,
    ) -> PipelineResult<()> {
        let input =
            ExtractionInput::new(&chunk.records, chunk.first_record_id).with_numeric(numeric);
        match self.lexical.extract(&input) {
            Ok(matrix) => {
                log::debug!(
                    "Chunk {}: lexical layout {:08x} ({} columns)",
                    chunk.index,
                    matrix.schema().layout_hash(),
                    matrix.n_features()
                );
                let result = self.lexical_ensemble.run(&matrix);
                merge_ensemble(&mut approaches.lexical, chunk, &result, signature_labels);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => skip_approach(&mut approaches.lexical, chunk, &e, signature_labels),
        }
        Ok(())
    }

    /// Read `input`, detect, write the three CSVs and the JSON summary
    pub fn run(&self, input: &Path) -> PipelineResult<RunSummary> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|e| PipelineError::io(output_dir, e))?;

        let mut reader = ChunkedReader::open(input, self.config.chunk_size)?;
        let mut approaches = Approaches::new();
        let mut chunks = 0u64;
        let mut rows = 0u64;

        log::info!(
            "Processing {} in chunks of {} rows",
            input.display(),
            self.config.chunk_size
        );
        while let Some(chunk) = reader.next_chunk()? {
            log::info!(
                "Chunk {}: rows {}..{}",
                chunk.index,
                chunk.first_record_id,
                chunk.first_record_id + chunk.len() as u64
            );
            self.process_chunk(&chunk, &mut approaches)?;
            chunks += 1;
            rows += chunk.len() as u64;
        }

        let mut summary = RunSummary::new(rows, reader.parse_failures(), chunks);
        for (aggregator, file_name) in approaches.with_outputs() {
            write_anomalies_csv(&output_dir.join(file_name), aggregator)?;
            log_preview(aggregator);
            summary
                .approaches
                .push(ApproachSummary::from_aggregator(aggregator, file_name));
        }

        summary.write_json(&output_dir.join(SUMMARY_OUTPUT_FILE))?;
        summary.log();
        Ok(summary)
    }
}

/// Record ensemble and denylist labels; a detector that failed is "not computed"
fn merge_ensemble(
    aggregator: &mut ResultAggregator,
    chunk: &Chunk,
    result: &EnsembleResult,
    signature_labels: &[AnomalyLabel],
) {
    for (source, detection) in [
        (LabelSource::Density, &result.density),
        (LabelSource::Isolation, &result.isolation),
    ] {
        if let Err(e) = detection {
            log::warn!(
                "Chunk {}: {} {} not computed: {}",
                chunk.index,
                aggregator.approach(),
                source,
                e
            );
            aggregator.mark_not_computed(source);
        }
    }

    let scores = result.isolation.as_ref().ok().and_then(|d| d.scores.as_deref());
    let labels = with_signatures(result.labels(), signature_labels);
    aggregator.ingest(&chunk.records, chunk.first_record_id, &labels, scores);
}

/// Append denylist labels, keeping rows in input order
fn with_signatures(
    mut labels: Vec<AnomalyLabel>,
    signature_labels: &[AnomalyLabel],
) -> Vec<AnomalyLabel> {
    labels.extend_from_slice(signature_labels);
    labels.sort_by_key(|l| l.record_id);
    labels
}

/// Count a chunk as seen but not computed for both detectors of an approach
///
/// Denylist labels do not depend on features and are still recorded.
fn skip_approach(
    aggregator: &mut ResultAggregator,
    chunk: &Chunk,
    error: &PipelineError,
    signature_labels: &[AnomalyLabel],
) {
    log::warn!(
        "Chunk {}: skipping {} features: {}",
        chunk.index,
        aggregator.approach(),
        error
    );
    for source in ENSEMBLE_SOURCES {
        aggregator.mark_not_computed(source);
    }
    aggregator.ingest(&chunk.records, chunk.first_record_id, signature_labels, None);
}
