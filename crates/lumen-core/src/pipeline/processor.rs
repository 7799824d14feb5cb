//! Pipeline orchestration: discovered file → validated → decoded → fingerprint.

use futures_util::stream::{self, Stream, StreamExt};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::PipelineError;
use crate::similarity::{Fingerprint, FingerprintExtractor};
use crate::types::Role;

use super::decode::ImageDecoder;
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::validate::Validator;

/// Files to fingerprint, split by role.
#[derive(Debug, Clone, Default)]
pub struct ScanInputs {
    pub protected: Vec<DiscoveredFile>,
    pub candidates: Vec<DiscoveredFile>,
}

impl ScanInputs {
    /// Bytes on disk across both roles.
    pub fn total_bytes(&self) -> u64 {
        FileDiscovery::total_size(&self.protected) + FileDiscovery::total_size(&self.candidates)
    }
}

/// Fingerprints produced for one role.
#[derive(Debug, Default)]
pub struct FingerprintBatch {
    /// Sorted by origin path
    pub fingerprints: Vec<Arc<Fingerprint>>,
    /// Inputs that were logged and dropped
    pub failed: usize,
}

/// Turns image files into fingerprints.
pub struct ImageProcessor {
    decoder: ImageDecoder,
    validator: Validator,
    discovery: FileDiscovery,
    extractor: FingerprintExtractor,
    parallel_workers: usize,
}

impl ImageProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
            extractor: FingerprintExtractor::new(),
            parallel_workers: config.processing.parallel_workers.max(1),
        }
    }

    /// Discover protected and candidate files.
    ///
    /// Discovered paths are canonical, so a file reachable from both a
    /// protected and a candidate root, under any spelling, is treated as
    /// protected only.
    pub fn discover(&self, protected: &[PathBuf], candidates: &[PathBuf]) -> ScanInputs {
        let protected = self.discovery.discover_all(protected);
        let protected_paths: BTreeSet<&Path> = protected.iter().map(|f| f.path.as_path()).collect();

        let candidates: Vec<DiscoveredFile> = self
            .discovery
            .discover_all(candidates)
            .into_iter()
            .filter(|f| !protected_paths.contains(f.path.as_path()))
            .collect();

        ScanInputs {
            protected,
            candidates,
        }
    }

    /// Fingerprint an in-memory image.
    pub async fn fingerprint_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
        role: Role,
    ) -> Result<Fingerprint, PipelineError> {
        let decoded = self.decoder.decode_from_bytes(bytes, path).await?;
        tracing::trace!(
            "Decoded {:?} ({}x{}, {:?})",
            path,
            decoded.width,
            decoded.height,
            decoded.format
        );

        let extractor = self.extractor;
        let origin = path.to_path_buf();
        tokio::task::spawn_blocking(move || extractor.extract(&decoded.image, origin, role))
            .await
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            })
    }

    /// Validate, read and fingerprint a single file.
    pub async fn fingerprint(&self, path: &Path, role: Role) -> Result<Fingerprint, PipelineError> {
        let start = std::time::Instant::now();
        self.validator.validate(path)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read file: {}", e),
            })?;
        let fingerprint = self.fingerprint_bytes(bytes, path, role).await?;

        tracing::debug!("Fingerprinted {:?} in {:?}", path, start.elapsed());
        Ok(fingerprint)
    }

    /// Fingerprint every file, at most `parallel_workers` at a time.
    ///
    /// Files that fail validation or decoding are logged and dropped.
    /// `on_done` is called once per finished file with whether it succeeded.
    pub async fn fingerprint_all<F>(
        &self,
        files: &[DiscoveredFile],
        role: Role,
        cancel: &CancelToken,
        mut on_done: F,
    ) -> Result<FingerprintBatch, PipelineError>
    where
        F: FnMut(&Path, bool),
    {
        let results = stream::iter(files)
            .map(|file| async move {
                let result = self.fingerprint(&file.path, role).await;
                (file.path.as_path(), result)
            })
            .buffer_unordered(self.parallel_workers);

        Self::collect(results, role, cancel, &mut on_done).await
    }

    /// Fingerprint in-memory images, at most `parallel_workers` at a time.
    ///
    /// Each input carries the path its fingerprint will report as origin.
    /// Inputs that fail to decode are logged and dropped.
    pub async fn fingerprint_bytes_all(
        &self,
        inputs: Vec<(PathBuf, Vec<u8>, Role)>,
        cancel: &CancelToken,
    ) -> Result<FingerprintBatch, PipelineError> {
        let results = stream::iter(inputs)
            .map(|(path, bytes, role)| async move {
                let result = self.fingerprint_bytes(bytes, &path, role).await;
                (path, result)
            })
            .buffer_unordered(self.parallel_workers);

        Self::collect(results, "in-memory", cancel, &mut |_: &Path, _: bool| {}).await
    }

    /// Drain finished fingerprints into a batch sorted by origin.
    async fn collect<S, P>(
        results: S,
        label: impl Display,
        cancel: &CancelToken,
        on_done: &mut dyn FnMut(&Path, bool),
    ) -> Result<FingerprintBatch, PipelineError>
    where
        S: Stream<Item = (P, Result<Fingerprint, PipelineError>)>,
        P: AsRef<Path>,
    {
        let mut batch = FingerprintBatch::default();
        let mut results = std::pin::pin!(results);

        while let Some((path, result)) = results.next().await {
            let path = path.as_ref();
            match result {
                Ok(fingerprint) => {
                    on_done(path, true);
                    batch.fingerprints.push(Arc::new(fingerprint));
                }
                Err(e) => {
                    on_done(path, false);
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    batch.failed += 1;
                }
            }
            if cancel.is_cancelled() {
                break;
            }
        }
        cancel.check("fingerprinting")?;

        batch
            .fingerprints
            .sort_by(|a, b| a.origin().cmp(b.origin()));
        tracing::info!(
            "Fingerprinted {} {} image(s), {} skipped",
            batch.fingerprints.len(),
            label,
            batch.failed
        );
        Ok(batch)
    }
}
