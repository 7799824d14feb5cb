//! Core data types shared between the similarity engine and its callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Whether an image may be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Never removed; only used as a reference for duplicates
    Protected,
    /// Eligible for removal
    Candidate,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Protected => write!(f, "protected"),
            Role::Candidate => write!(f, "candidate"),
        }
    }
}

/// One resolved duplicate: `keep` survives, `delete` is handed to the handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub keep: PathBuf,
    pub delete: PathBuf,
    /// SSIM of the pair
    pub ssim: f64,
}

/// Output of the resolution engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Decisions in non-increasing SSIM order
    pub decisions: Vec<Decision>,

    /// Number of decisions keeping a file in each folder
    pub keeps_per_folder: BTreeMap<PathBuf, usize>,
}

/// Statistics for a scan run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScanStats {
    /// Files found by discovery
    pub discovered: usize,

    /// Bytes on disk across discovered files
    pub discovered_bytes: u64,

    /// Files that produced a fingerprint
    pub fingerprinted: usize,

    /// Files dropped because they could not be validated or decoded
    pub failed: usize,

    /// Pairs at or above the SSIM threshold
    pub pairs_above_threshold: usize,

    /// Decisions emitted by the resolver
    pub decisions: usize,

    /// Decisions the handler acted on
    pub handled: usize,

    /// Decisions the handler failed on
    pub handler_failures: usize,

    /// Total wall time in seconds
    pub total_seconds: f64,
}
