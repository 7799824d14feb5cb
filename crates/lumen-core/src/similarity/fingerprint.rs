//! Rotation-canonical luma fingerprints.
//!
//! Every image is reduced to a fixed 128×128 luma field so that any two
//! fingerprints can be compared sample by sample regardless of the source
//! resolution. Of the four axis-aligned rotations of that field, the one
//! whose first four samples sum to the smallest value is kept, which makes
//! an image and its 90°/180°/270° rotations fingerprint identically without
//! reading orientation metadata.

use image::{imageops, DynamicImage, GenericImageView, RgbImage};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::Role;

/// Side length of the canonical fingerprint grid.
pub const FINGERPRINT_SIZE: u32 = 128;

/// Number of samples in a luma field.
pub const FIELD_LEN: usize = (FINGERPRINT_SIZE * FINGERPRINT_SIZE) as usize;

/// A fixed-length luma field, allocated once per fingerprint.
pub type LumaField = Box<[f32; FIELD_LEN]>;

/// BT.709 luma weights.
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Luma of an 8-bit RGB triple.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32
}

/// Clockwise rotations considered during canonicalization, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    /// Destination index of source sample `(x, y)` in an `n`×`n` grid.
    #[inline]
    fn index(self, n: usize, x: usize, y: usize) -> usize {
        match self {
            Rotation::R0 => y * n + x,
            Rotation::R90 => x * n + (n - 1 - y),
            Rotation::R180 => (n - 1 - y) * n + (n - 1 - x),
            Rotation::R270 => (n - 1 - x) * n + y,
        }
    }
}

/// Rotate a square luma field clockwise.
pub fn rotate_field(field: &[f32; FIELD_LEN], rotation: Rotation) -> LumaField {
    let n = FINGERPRINT_SIZE as usize;
    let mut out: LumaField = Box::new([0.0; FIELD_LEN]);
    for y in 0..n {
        for x in 0..n {
            out[rotation.index(n, x, y)] = field[y * n + x];
        }
    }
    out
}

/// Immutable per-image fingerprint.
pub struct Fingerprint {
    origin: PathBuf,
    role: Role,
    luma: LumaField,
    luma_centered: LumaField,
    mean: f64,
    variance: f64,
    average_color: [f64; 3],
    pixel_area: u64,
}

impl Fingerprint {
    /// Build a fingerprint from an already canonical luma field.
    ///
    /// Mean, variance and the centred field are derived here so they are
    /// always consistent with `luma`.
    pub fn from_luma(
        origin: impl Into<PathBuf>,
        role: Role,
        luma: LumaField,
        average_color: [f64; 3],
        pixel_area: u64,
    ) -> Self {
        let mean = luma.iter().map(|&v| v as f64).sum::<f64>() / FIELD_LEN as f64;

        let mean_f32 = mean as f32;
        let mut luma_centered: LumaField = Box::new([0.0; FIELD_LEN]);
        for (centered, &value) in luma_centered.iter_mut().zip(luma.iter()) {
            *centered = value - mean_f32;
        }

        // Same accumulation as the SSIM covariance, so ssim(a, a) is exactly 1.
        let variance = luma_centered
            .iter()
            .map(|&d| d as f64 * d as f64)
            .sum::<f64>()
            / FIELD_LEN as f64;

        Self {
            origin: origin.into(),
            role,
            luma,
            luma_centered,
            mean,
            variance,
            average_color,
            pixel_area,
        }
    }

    /// Path of the backing file.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_protected(&self) -> bool {
        self.role == Role::Protected
    }

    /// Canonical luma field.
    pub fn luma(&self) -> &[f32; FIELD_LEN] {
        &self.luma
    }

    /// Luma field minus its mean.
    pub fn luma_centered(&self) -> &[f32; FIELD_LEN] {
        &self.luma_centered
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance of the luma field.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Mean R, G, B over the scaled image.
    pub fn average_color(&self) -> [f64; 3] {
        self.average_color
    }

    /// Width × height of the original image.
    pub fn pixel_area(&self) -> u64 {
        self.pixel_area
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fingerprint")
            .field("origin", &self.origin)
            .field("role", &self.role)
            .field("mean", &self.mean)
            .field("variance", &self.variance)
            .field("average_color", &self.average_color)
            .field("pixel_area", &self.pixel_area)
            .finish()
    }
}

/// Turns decoded images into fingerprints.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintExtractor;

impl FingerprintExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Fingerprint a decoded image.
    pub fn extract(
        &self,
        image: &DynamicImage,
        origin: impl Into<PathBuf>,
        role: Role,
    ) -> Fingerprint {
        let (width, height) = image.dimensions();
        let scaled = Self::scale(image);

        let average_color = Self::average_color(&scaled);
        let field = Self::luma_field(&scaled);
        let canonical = Self::canonical_rotation(field);

        Fingerprint::from_luma(
            origin,
            role,
            canonical,
            average_color,
            width as u64 * height as u64,
        )
    }

    /// Box-filter the image onto the fixed grid.
    fn scale(image: &DynamicImage) -> RgbImage {
        let rgb = image.to_rgb8();
        if rgb.dimensions() == (FINGERPRINT_SIZE, FINGERPRINT_SIZE) {
            rgb
        } else {
            imageops::thumbnail(&rgb, FINGERPRINT_SIZE, FINGERPRINT_SIZE)
        }
    }

    fn luma_field(scaled: &RgbImage) -> LumaField {
        let mut field: LumaField = Box::new([0.0; FIELD_LEN]);
        for (sample, pixel) in field.iter_mut().zip(scaled.pixels()) {
            let [r, g, b] = pixel.0;
            *sample = luma(r, g, b);
        }
        field
    }

    fn average_color(scaled: &RgbImage) -> [f64; 3] {
        let mut sums = [0.0f64; 3];
        for pixel in scaled.pixels() {
            for (sum, &channel) in sums.iter_mut().zip(pixel.0.iter()) {
                *sum += channel as f64;
            }
        }
        let count = (scaled.width() as f64 * scaled.height() as f64).max(1.0);
        sums.map(|s| s / count)
    }

    /// Pick the rotation whose first four samples sum lowest; the earliest
    /// rotation wins ties.
    fn canonical_rotation(field: LumaField) -> LumaField {
        let mut best_key = head_sum(&field);
        let mut best = None;
        for rotation in &Rotation::ALL[1..] {
            let rotated = rotate_field(&field, *rotation);
            let key = head_sum(&rotated);
            if key < best_key {
                best_key = key;
                best = Some(rotated);
            }
        }
        best.unwrap_or(field)
    }
}

fn head_sum(field: &[f32; FIELD_LEN]) -> f32 {
    field[..4].iter().sum()
}
