//! CLI enum types for the scan command.

use clap::ValueEnum;
use lumen_core::{HandlerAction, OutputFormat as CoreOutputFormat};

/// What to do with each duplicate.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Action {
    /// Report only
    Noop,
    /// Move next to the kept file as "<name> delete (n).<ext>"
    Rename,
    /// Remove from disk
    Delete,
}

impl From<Action> for HandlerAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Noop => HandlerAction::Noop,
            Action::Rename => HandlerAction::Rename,
            Action::Delete => HandlerAction::Delete,
        }
    }
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// keep, delete and ssim separated by tabs
    Tsv,
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Tsv => CoreOutputFormat::Tsv,
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::Jsonl,
        }
    }
}
