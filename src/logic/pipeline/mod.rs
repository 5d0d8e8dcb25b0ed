//! Pipeline Module - Chunked Detection Run
//!
//! # Architecture
//! ```text
//! CSV ──► ChunkedReader ──► chunk
//!                             ├─► structural features ─► ensemble ─► approach 1
//!                             │        └─► + TF-IDF ───► ensemble ─► approach 2
//!                             └─► denylist ────────────────────────► approach 3
//! ```
//!
//! Chunks are processed sequentially and independently; every statistic
//! (scaling, one-hot columns, path frequency, vocabulary) is chunk-local.

pub mod reader;
pub mod runner;

#[cfg(test)]
mod tests;

pub use reader::{Chunk, ChunkedReader};
pub use runner::{Approaches, Pipeline};
