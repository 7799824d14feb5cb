//! All-pairs SSIM scoring across the protected and candidate collections.

use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;

use super::fingerprint::Fingerprint;
use super::ssim::ssim;
use crate::cancel::CancelToken;
use crate::error::PipelineError;

/// Two fingerprints with their precomputed SSIM.
///
/// For cross pairs `a` is the protected image; for candidate pairs `a` is the
/// candidate that appears later in the input collection.
#[derive(Debug, Clone)]
pub struct ScoredPair {
    pub a: Arc<Fingerprint>,
    pub b: Arc<Fingerprint>,
    pub score: f64,
}

impl ScoredPair {
    /// Score a pair eagerly.
    pub fn new(a: Arc<Fingerprint>, b: Arc<Fingerprint>) -> Self {
        let score = ssim(&a, &b);
        Self { a, b, score }
    }
}

/// Number of comparisons `generate_scored_pairs` will perform.
pub fn comparison_count(protected: usize, candidates: usize) -> usize {
    protected * candidates + candidates * candidates.saturating_sub(1) / 2
}

/// Score every protected×candidate pair and every unordered candidate pair,
/// keep those with `score >= threshold`, and sort them by descending score.
///
/// Protected images are never compared with each other. Equal scores are
/// ordered by origin paths so the output does not depend on thread timing.
pub fn generate_scored_pairs(
    protected: &[Arc<Fingerprint>],
    candidates: &[Arc<Fingerprint>],
    threshold: f64,
    cancel: &CancelToken,
) -> Result<Vec<ScoredPair>, PipelineError> {
    tracing::debug!(
        "Scoring {} pairs ({} protected, {} candidates)",
        comparison_count(protected.len(), candidates.len()),
        protected.len(),
        candidates.len()
    );

    let cross = protected.par_iter().flat_map_iter(|p| {
        let rows = if cancel.is_cancelled() { &[][..] } else { candidates };
        rows.iter()
            .map(move |c| ScoredPair::new(Arc::clone(p), Arc::clone(c)))
            .filter(move |pair| pair.score >= threshold)
    });

    let internal = (0..candidates.len()).into_par_iter().flat_map_iter(|i| {
        let upto = if cancel.is_cancelled() { 0 } else { i };
        candidates[..upto]
            .iter()
            .map(move |earlier| ScoredPair::new(Arc::clone(&candidates[i]), Arc::clone(earlier)))
            .filter(move |pair| pair.score >= threshold)
    });

    let mut pairs: Vec<ScoredPair> = cross.chain(internal).collect();
    cancel.check("pair scoring")?;

    pairs.par_sort_unstable_by(compare_descending);
    tracing::debug!("{} pairs at or above threshold {}", pairs.len(), threshold);
    Ok(pairs)
}

fn compare_descending(x: &ScoredPair, y: &ScoredPair) -> Ordering {
    y.score
        .total_cmp(&x.score)
        .then_with(|| x.a.origin().cmp(y.a.origin()))
        .then_with(|| x.b.origin().cmp(y.b.origin()))
}
