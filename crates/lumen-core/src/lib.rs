//! Lumen Core - SSIM near-duplicate image detection.
//!
//! Lumen compares every candidate image against every protected image and
//! against every other candidate, and decides which copy of each
//! near-duplicate pair to keep.
//!
//! # Architecture
//!
//! ```text
//! Files → Validate → Decode → Fingerprint (128×128 luma, rotation-canonical)
//!       → Score pairs (SSIM ≥ threshold) → Resolve (keep/delete) → Handler
//! ```
//!
//! Protected images are never deleted. Each file takes part in at most one
//! decision, and decisions are made in descending SSIM order.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumen_core::{generate_scored_pairs, CancelToken, Config, ImageProcessor, Resolver, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let processor = ImageProcessor::new(&config);
//!     let cancel = CancelToken::new();
//!
//!     let inputs = processor.discover(&config.protected_folders(), &config.candidate_folders());
//!     let protected = processor
//!         .fingerprint_all(&inputs.protected, Role::Protected, &cancel, |_, _| {})
//!         .await?;
//!     let candidates = processor
//!         .fingerprint_all(&inputs.candidates, Role::Candidate, &cancel, |_, _| {})
//!         .await?;
//!
//!     let pairs = generate_scored_pairs(
//!         &protected.fingerprints,
//!         &candidates.fingerprints,
//!         config.similarity.threshold,
//!         &cancel,
//!     )?;
//!     let resolution = Resolver::new(config.similarity.color_tolerance).resolve(&pairs, &cancel)?;
//!     for decision in &resolution.decisions {
//!         println!("{} <- {}", decision.keep.display(), decision.delete.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod handler;
pub mod output;
pub mod pipeline;
pub mod similarity;
pub mod types;

pub use cancel::CancelToken;
pub use config::{Config, HandlerAction, OutputFormat};
pub use error::{ConfigError, PipelineError};
pub use handler::{
    apply_decisions, handler_for, DeleteHandler, DuplicateHandler, HandlerStats, NoopHandler,
    RenameHandler,
};
pub use output::{folder_summary, DecisionWriter};
pub use pipeline::{DiscoveredFile, FingerprintBatch, ImageProcessor, ScanInputs};
pub use similarity::{
    generate_scored_pairs, ssim, FileProbe, Fingerprint, FingerprintExtractor, LocalFileProbe,
    Resolver, ScoredPair,
};
pub use types::{Decision, Resolution, Role, ScanStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
