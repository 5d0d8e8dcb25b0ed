//! Signature Module - Known-bad user agent matching
//!
//! Third detection approach: independent of the feature pipeline, a record
//! is flagged when its user agent is on the denylist.

pub mod denylist;

pub use denylist::{
    default_signatures, parse_signature_lines, SignatureFilter, DEFAULT_SUSPICIOUS_USER_AGENTS,
};
