//! User Agent Denylist
//!
//! Known scanner / bot signatures. Matching is an exact, case-sensitive
//! string comparison; no normalisation is applied to either side.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::logic::config::PipelineConfig;
use crate::logic::detection::{AnomalyLabel, LabelSource};
use crate::logic::normalizer::LogRecord;

// ============================================================================
// BUILT-IN SIGNATURES
// ============================================================================

/// Built-in denylist used when nothing else is configured
pub const DEFAULT_SUSPICIOUS_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.8 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (ZZ; Linux i686; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (compatible; CensysInspect/1.1; +https://about.censys.io/)",
    "Mozilla/5.0 (compatible; InternetMeasurement/1.0; +https://internet-measurement.com/)",
    "Mozilla/4.0 (compatible; MSIE 6.0; Windows NT 5.1; SV1; .NET CLR 1.1.4322; .NET CLR 2.0.50728)",
    "Mozilla/5.0 (ZZ; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Expanse, a Palo Alto Networks company, searches across the global IPv4 space multiple times per day to identify customers&#39; presences on the Internet. If you would like to be excluded from our scans, please send IP addresses/domains to: scaninfo@paloaltonetworks.com",
];

pub fn default_signatures() -> Vec<String> {
    DEFAULT_SUSPICIOUS_USER_AGENTS.iter().map(|s| s.to_string()).collect()
}

/// Parse a denylist file body: one signature per line, `#` comments
pub fn parse_signature_lines(body: &str) -> Vec<String> {
    body.lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// FILTER
// ============================================================================

/// Exact-match user agent filter
#[derive(Debug, Clone, Default)]
pub struct SignatureFilter {
    signatures: HashSet<String>,
}

impl SignatureFilter {
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            signatures: signatures.into_iter().map(Into::into).collect(),
        }
    }

    /// Load signatures from a file; a missing list is fatal
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let body = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let signatures = parse_signature_lines(&body);
        log::info!("Loaded {} user agent signatures from {}", signatures.len(), path.display());
        Ok(Self::new(signatures))
    }

    /// File list when configured, otherwise the inline list
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        match &config.suspicious_user_agent_file {
            Some(path) => Self::from_file(path),
            None => Ok(Self::new(config.suspicious_user_agents.iter().cloned())),
        }
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn contains(&self, user_agent: &str) -> bool {
        self.signatures.contains(user_agent)
    }

    /// Missing user agents never match
    pub fn matches(&self, record: &LogRecord) -> bool {
        record.user_agent.as_deref().map_or(false, |ua| self.contains(ua))
    }

    pub fn label(&self, record_id: u64, record: &LogRecord) -> AnomalyLabel {
        AnomalyLabel::new(record_id, LabelSource::Signature, self.matches(record))
    }

    /// Labels for a chunk, in row order
    pub fn label_chunk(&self, records: &[LogRecord], first_record_id: u64) -> Vec<AnomalyLabel> {
        records
            .iter()
            .enumerate()
            .map(|(i, r)| self.label(first_record_id + i as u64, r))
            .collect()
    }

    /// Matching records, input order preserved
    pub fn filter<'a>(&self, records: &'a [LogRecord]) -> Vec<&'a LogRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
