//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of images fingerprinted concurrently
    pub parallel_workers: usize,

    /// Supported input extensions
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: vec!["jpg".to_string(), "jpeg".to_string()],
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 20000,
            decode_timeout_ms: 10000,
        }
    }
}

/// Duplicate detection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Minimum SSIM for a pair to count as a duplicate, in (0, 1]
    pub threshold: f64,

    /// Largest allowed per-channel difference of average RGB
    pub color_tolerance: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.94,
            color_tolerance: 2.0,
        }
    }
}

/// Folders scanned when none are given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldersConfig {
    /// Folders whose images are never removed
    pub protected: Vec<PathBuf>,

    /// Folders whose images may be removed
    pub candidates: Vec<PathBuf>,
}

/// Action taken on the losing file of each decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerAction {
    /// Report only
    #[default]
    Noop,
    /// Move next to the kept file as "<name> delete (n).<ext>"
    Rename,
    /// Remove from disk
    Delete,
}

impl HandlerAction {
    /// Whether the action modifies the filesystem.
    pub fn is_destructive(self) -> bool {
        !matches!(self, HandlerAction::Noop)
    }
}

impl std::fmt::Display for HandlerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerAction::Noop => write!(f, "noop"),
            HandlerAction::Rename => write!(f, "rename"),
            HandlerAction::Delete => write!(f, "delete"),
        }
    }
}

/// Duplicate handler settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub action: HandlerAction,
}

/// Output formats for the decision list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated `keep`, `delete`, `ssim` with a header row
    #[default]
    Tsv,
    /// Single JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: OutputFormat,

    /// Pretty-print JSON output
    pub pretty: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
