//! Features Module - Feature Extraction Engine
//!
//! Two interchangeable strategies over one `FeatureStrategy` contract:
//! - `structural` - path heuristics, status one-hot, path frequency
//! - `lexical` - TF-IDF over path tokens, joined after numeric features
//!
//! Status columns, path frequency and the TF-IDF vocabulary are all
//! computed per chunk, so the schema is chunk-local.

pub mod layout;
pub mod vector;
pub mod structural;
pub mod lexical;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::{FeatureSchema, LayoutMismatchError, PATH_FEATURE_LAYOUT};
pub use vector::{ExtractionInput, FeatureMatrix, FeatureStrategy, FeatureVector};
pub use structural::{extract_path_features, PathFeatures, StructuralStrategy};
pub use lexical::{LexicalStrategy, TfidfVectorizer};
