//! Chunked CSV Reader
//!
//! Streams the normalized CSV in fixed-size chunks. Record ids are global
//! row indices (0-based, in file order), so they stay unique across chunks.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::logic::normalizer::{LogRecord, RawRow};
use crate::logic::report::RECORD_COLUMNS;

/// A contiguous run of rows
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 0-based chunk number
    pub index: u64,
    /// Record id of `records[0]`
    pub first_record_id: u64,
    pub records: Vec<LogRecord>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct ChunkedReader {
    path: PathBuf,
    reader: csv::Reader<File>,
    chunk_size: usize,
    next_record_id: u64,
    next_chunk: u64,
    parse_failures: u64,
    exhausted: bool,
}

impl ChunkedReader {
    pub fn open(path: &Path, chunk_size: usize) -> PipelineResult<Self> {
        if chunk_size == 0 {
            return Err(PipelineError::Config("chunk_size must be > 0".to_string()));
        }
        let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::csv(path, e))?;

        let headers = reader.headers().map_err(|e| PipelineError::csv(path, e))?;
        let missing: Vec<&str> = RECORD_COLUMNS
            .iter()
            .copied()
            .filter(|c| !headers.iter().any(|h| h == *c))
            .collect();
        if !missing.is_empty() {
            log::warn!(
                "{} is missing columns {:?}; they will be read as empty",
                path.display(),
                missing
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            chunk_size,
            next_record_id: 0,
            next_chunk: 0,
            parse_failures: 0,
            exhausted: false,
        })
    }

    /// Rows rejected by the CSV parser so far
    pub fn parse_failures(&self) -> u64 {
        self.parse_failures
    }

    /// Next chunk, `None` at end of file
    ///
    /// Malformed rows are skipped and counted; an IO error is fatal.
    pub fn next_chunk(&mut self) -> PipelineResult<Option<Chunk>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut records = Vec::with_capacity(self.chunk_size.min(4096));
        let mut rows = self.reader.deserialize::<RawRow>();
        while records.len() < self.chunk_size {
            match rows.next() {
                Some(Ok(raw)) => records.push(LogRecord::from(raw)),
                Some(Err(e)) if e.is_io_error() => return Err(PipelineError::csv(&self.path, e)),
                Some(Err(e)) => {
                    self.parse_failures += 1;
                    log::warn!("Skipping malformed row in {}: {}", self.path.display(), e);
                }
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }

        if records.is_empty() {
            return Ok(None);
        }

        let chunk = Chunk {
            index: self.next_chunk,
            first_record_id: self.next_record_id,
            records,
        };
        self.next_chunk += 1;
        self.next_record_id += chunk.len() as u64;
        Ok(Some(chunk))
    }
}

impl Iterator for ChunkedReader {
    type Item = PipelineResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}
