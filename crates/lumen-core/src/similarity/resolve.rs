//! Greedy resolution of scored pairs into keep/delete decisions.
//!
//! Pairs are visited strictly in descending score order. Each file takes part
//! in at most one decision, so the best match for a file always wins and a
//! file that has been kept is never deleted by a later, weaker match.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::fingerprint::Fingerprint;
use super::pairs::ScoredPair;
use crate::cancel::CancelToken;
use crate::error::PipelineError;
use crate::types::{Decision, Resolution};

/// Filesystem queries used by the existence gate, file identity and the
/// size tie-break.
///
/// Implementations must answer from the current state of the filesystem;
/// results are never cached by the resolver.
pub trait FileProbe {
    /// Whether the file currently exists.
    fn exists(&self, path: &Path) -> bool;

    /// File size in bytes, `None` if it cannot be read.
    fn size(&self, path: &Path) -> Option<u64>;

    /// Key identifying the underlying file. Two spellings of the same file
    /// must map to the same key.
    fn identity(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// [`FileProbe`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileProbe;

impl FileProbe for LocalFileProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path).ok().map(|m| m.len())
    }

    fn identity(&self, path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Turns a descending list of scored pairs into a decision sequence.
pub struct Resolver<P: FileProbe = LocalFileProbe> {
    color_tolerance: f64,
    probe: P,
}

impl Resolver<LocalFileProbe> {
    /// Resolver that queries the local filesystem.
    pub fn new(color_tolerance: f64) -> Self {
        Self::with_probe(color_tolerance, LocalFileProbe)
    }
}

impl<P: FileProbe> Resolver<P> {
    pub fn with_probe(color_tolerance: f64, probe: P) -> Self {
        Self {
            color_tolerance,
            probe,
        }
    }

    /// Resolve `pairs`, which must be sorted by descending score.
    ///
    /// Performs no filesystem mutation. Calling it twice on the same input
    /// with an unchanged filesystem yields the same resolution.
    pub fn resolve(
        &self,
        pairs: &[ScoredPair],
        cancel: &CancelToken,
    ) -> Result<Resolution, PipelineError> {
        // A candidate that is the same file as a protected image is protected.
        let protected: HashSet<PathBuf> = pairs
            .iter()
            .flat_map(|pair| [&pair.a, &pair.b])
            .filter(|f| f.is_protected())
            .map(|f| self.probe.identity(f.origin()))
            .collect();
        let mut decided: HashSet<PathBuf> = HashSet::new();
        let mut resolution = Resolution::default();

        for pair in pairs {
            cancel.check("resolve")?;

            let (a, b) = (pair.a.as_ref(), pair.b.as_ref());

            if !self.colors_close(a, b) {
                tracing::trace!(
                    "Color gate rejected {:?} / {:?} (ssim {:.5})",
                    a.origin(),
                    b.origin(),
                    pair.score
                );
                continue;
            }
            if !(self.probe.exists(a.origin()) && self.probe.exists(b.origin())) {
                continue;
            }
            let (id_a, id_b) = (
                self.probe.identity(a.origin()),
                self.probe.identity(b.origin()),
            );
            if decided.contains(&id_a) || decided.contains(&id_b) {
                continue;
            }
            let (a_protected, b_protected) = (protected.contains(&id_a), protected.contains(&id_b));
            if id_a == id_b || (a_protected && b_protected) {
                continue;
            }

            let (keep, delete) = self.choose(a, b, a_protected, b_protected);
            tracing::debug!(
                "Keep {:?}, delete {:?} (ssim {:.5})",
                keep.origin(),
                delete.origin(),
                pair.score
            );

            decided.insert(id_a);
            decided.insert(id_b);

            let folder = keep
                .origin()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(PathBuf::new);
            *resolution.keeps_per_folder.entry(folder).or_insert(0) += 1;

            resolution.decisions.push(Decision {
                keep: keep.origin().to_path_buf(),
                delete: delete.origin().to_path_buf(),
                ssim: pair.score,
            });
        }

        Ok(resolution)
    }

    /// Whether every average-color channel differs by at most the tolerance.
    pub fn colors_close(&self, a: &Fingerprint, b: &Fingerprint) -> bool {
        a.average_color()
            .iter()
            .zip(b.average_color().iter())
            .all(|(x, y)| (x - y).abs() <= self.color_tolerance)
    }

    /// Pick `(keep, delete)`: the protected side, then the larger original
    /// image, then the larger file, then `a`.
    fn choose<'f>(
        &self,
        a: &'f Fingerprint,
        b: &'f Fingerprint,
        a_protected: bool,
        b_protected: bool,
    ) -> (&'f Fingerprint, &'f Fingerprint) {
        match (a_protected, b_protected) {
            (true, false) => return (a, b),
            (false, true) => return (b, a),
            _ => {}
        }

        let by_size = || {
            let size_a = self.probe.size(a.origin()).unwrap_or(0);
            let size_b = self.probe.size(b.origin()).unwrap_or(0);
            size_a.cmp(&size_b)
        };

        match a.pixel_area().cmp(&b.pixel_area()).then_with(by_size) {
            Ordering::Less => (b, a),
            Ordering::Greater | Ordering::Equal => (a, b),
        }
    }
}
