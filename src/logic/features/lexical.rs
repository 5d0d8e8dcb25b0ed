//! Lexical Feature Extraction - TF-IDF over path tokens
//!
//! The vocabulary is fit on the chunk being transformed and thrown away
//! afterwards; nothing is persisted between invocations.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::layout::{FeatureSchema, TFIDF_COLUMN_PREFIX};
use super::vector::{ExtractionInput, FeatureMatrix, FeatureStrategy, FeatureVector};
use crate::error::{PipelineError, PipelineResult};

/// Tokens: runs of 2+ word characters
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern"));

/// Lowercased tokens of one document
pub fn tokenize(doc: &str) -> Vec<String> {
    let lower = doc.to_lowercase();
    TOKEN_RE.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

// ============================================================================
// VECTORIZER
// ============================================================================

/// Fitted TF-IDF model
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfModel {
    /// Terms in column order (alphabetical)
    pub vocabulary: Vec<String>,
    /// Smoothed idf per vocabulary term
    pub idf: Vec<f64>,
}

/// TF-IDF vectorizer with a vocabulary cap
#[derive(Debug, Clone, Copy)]
pub struct TfidfVectorizer {
    max_features: usize,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Fit on `docs` and return the model plus one L2-normalised row per doc
    pub fn fit_transform(&self, docs: &[&str]) -> (TfidfModel, Vec<Vec<f64>>) {
        let tokenized: Vec<HashMap<String, usize>> = docs
            .iter()
            .map(|doc| {
                let mut counts = HashMap::new();
                for token in tokenize(doc) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        // Corpus term count and document frequency
        let mut totals: HashMap<&str, (usize, usize)> = HashMap::new();
        for counts in &tokenized {
            for (term, &n) in counts {
                let entry = totals.entry(term.as_str()).or_insert((0, 0));
                entry.0 += n;
                entry.1 += 1;
            }
        }

        // Most frequent terms win, ties alphabetical
        let mut ranked: Vec<(&str, usize, usize)> =
            totals.iter().map(|(t, &(tf, df))| (*t, tf, df)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);
        ranked.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = docs.len() as f64;
        let vocabulary: Vec<String> = ranked.iter().map(|(t, _, _)| t.to_string()).collect();
        let idf: Vec<f64> = ranked
            .iter()
            .map(|&(_, _, df)| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let rows = tokenized
            .iter()
            .map(|counts| {
                let mut row = vec![0.0; vocabulary.len()];
                for (term, &n) in counts {
                    if let Some(&col) = index.get(term.as_str()) {
                        row[col] = n as f64 * idf[col];
                    }
                }
                l2_normalize(&mut row);
                row
            })
            .collect();

        (TfidfModel { vocabulary, idf }, rows)
    }
}

fn l2_normalize(row: &mut [f64]) {
    let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in row.iter_mut() {
            *v /= norm;
        }
    }
}

// ============================================================================
// STRATEGY
// ============================================================================

/// TF-IDF path features, joined after any numeric features passed in
#[derive(Debug, Clone, Copy)]
pub struct LexicalStrategy {
    vectorizer: TfidfVectorizer,
}

impl LexicalStrategy {
    pub fn new(vocab_size: usize) -> Self {
        Self { vectorizer: TfidfVectorizer::new(vocab_size) }
    }
}

impl FeatureStrategy for LexicalStrategy {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> PipelineResult<FeatureMatrix> {
        let records = input.records;
        if let Some(numeric) = input.numeric {
            if numeric.len() != records.len() {
                return Err(PipelineError::SchemaMismatch(format!(
                    "numeric features have {} rows, chunk has {}",
                    numeric.len(),
                    records.len()
                )));
            }
        }

        let docs: Vec<&str> = records.iter().map(|r| r.path.as_deref().unwrap_or("")).collect();
        let (model, rows) = self.vectorizer.fit_transform(&docs);

        let schema = FeatureSchema::new(
            model
                .vocabulary
                .iter()
                .map(|t| format!("{}{}", TFIDF_COLUMN_PREFIX, t))
                .collect(),
        );
        let mut tfidf = FeatureMatrix::with_capacity(schema, records.len());
        for (pos, values) in rows.into_iter().enumerate() {
            let vector = FeatureVector::new(input.record_id(pos), tfidf.schema(), values);
            tfidf
                .push(vector)
                .map_err(|e| PipelineError::SchemaMismatch(e.to_string()))?;
        }

        log::debug!(
            "TF-IDF fit on {} paths, vocabulary {} terms",
            records.len(),
            model.vocabulary.len()
        );

        match input.numeric {
            Some(numeric) => numeric.hconcat(&tfidf),
            None => Ok(tfidf),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
