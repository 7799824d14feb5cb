//! Whole-image structural similarity between two fingerprints.
//!
//! This is single-window SSIM: the full 128×128 canonical field is treated as
//! one window, so each comparison is a single pass over the centred fields.
//!
//! ```text
//! ssim = (2·μa·μb + c1)(2·σab + c2) / ((μa² + μb² + c1)(σa² + σb² + c2))
//! ```

use super::fingerprint::{Fingerprint, FIELD_LEN};

const K1: f64 = 0.01;
const K2: f64 = 0.03;
/// Dynamic range of 8-bit luma.
const L: f64 = 255.0;

/// Stabilizer for the luminance term, `(K1·L)²`.
pub const C1: f64 = (K1 * L) * (K1 * L);
/// Stabilizer for the contrast/structure term, `(K2·L)²`.
pub const C2: f64 = (K2 * L) * (K2 * L);

/// SSIM from precomputed statistics.
pub fn ssim_from_stats(
    mean_a: f64,
    mean_b: f64,
    variance_a: f64,
    variance_b: f64,
    covariance: f64,
) -> f64 {
    (2.0 * mean_a * mean_b + C1) * (2.0 * covariance + C2)
        / ((mean_a * mean_a + mean_b * mean_b + C1) * (variance_a + variance_b + C2))
}

/// Population covariance of two fingerprints' luma fields.
pub fn covariance(a: &Fingerprint, b: &Fingerprint) -> f64 {
    let sum: f64 = a
        .luma_centered()
        .iter()
        .zip(b.luma_centered().iter())
        .map(|(&da, &db)| da as f64 * db as f64)
        .sum();
    sum / FIELD_LEN as f64
}

/// SSIM of two fingerprints. Pure and exactly symmetric.
pub fn ssim(a: &Fingerprint, b: &Fingerprint) -> f64 {
    ssim_from_stats(
        a.mean(),
        b.mean(),
        a.variance(),
        b.variance(),
        covariance(a, b),
    )
}
