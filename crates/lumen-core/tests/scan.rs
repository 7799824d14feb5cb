//! End-to-end scans over synthesized image folders.

use image::{imageops, DynamicImage, Rgb, RgbImage};
use lumen_core::{
    apply_decisions, generate_scored_pairs, CancelToken, Config, DeleteHandler, ImageProcessor,
    RenameHandler, Resolution, Resolver, Role,
};
use std::path::{Path, PathBuf};

/// Smooth gradient with a bright block; every corner differs.
fn scene() -> RgbImage {
    RgbImage::from_fn(128, 128, |x, y| {
        if (10..40).contains(&x) && (20..50).contains(&y) {
            Rgb([250, 240, 230])
        } else {
            Rgb([(x * 2) as u8, (y * 2) as u8, ((x + y) / 2) as u8])
        }
    })
}

fn stripes() -> RgbImage {
    RgbImage::from_fn(128, 128, |x, y| {
        let v = if (x / 8) % 2 == 0 { 30 } else { 220 };
        Rgb([v, v, (y % 64) as u8 + 40])
    })
}

fn noise() -> RgbImage {
    RgbImage::from_fn(128, 128, |x, y| {
        let v = ((x * 37) ^ (y * 91)) % 256;
        Rgb([v as u8, (255 - v) as u8, ((v * 3) % 256) as u8])
    })
}

fn save(img: &RgbImage, path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    img.save(path).unwrap();
    path.to_path_buf()
}

fn png_config() -> Config {
    let mut config = Config::default();
    config.processing.supported_formats = vec!["png".to_string()];
    config
}

async fn scan(config: &Config, protected: &[PathBuf], candidates: &[PathBuf]) -> Resolution {
    let processor = ImageProcessor::new(config);
    let cancel = CancelToken::new();

    let inputs = processor.discover(protected, candidates);
    let protected = processor
        .fingerprint_all(&inputs.protected, Role::Protected, &cancel, |_, _| {})
        .await
        .unwrap();
    let candidates = processor
        .fingerprint_all(&inputs.candidates, Role::Candidate, &cancel, |_, _| {})
        .await
        .unwrap();

    let pairs = generate_scored_pairs(
        &protected.fingerprints,
        &candidates.fingerprints,
        config.similarity.threshold,
        &cancel,
    )
    .unwrap();
    Resolver::new(config.similarity.color_tolerance)
        .resolve(&pairs, &cancel)
        .unwrap()
}

/// Library with one rotated copy of a protected image and one upscaled
/// duplicate among the candidates.
struct Library {
    _dir: tempfile::TempDir,
    protected: PathBuf,
    candidates: PathBuf,
    original: PathBuf,
    rotated: PathBuf,
    small: PathBuf,
    large: PathBuf,
}

fn library() -> Library {
    let dir = tempfile::tempdir().unwrap();
    // Discovery reports canonical paths; compare against the same spelling.
    let root = dir.path().canonicalize().unwrap();
    let protected = root.join("library");
    let candidates = root.join("inbox");

    let original = save(&scene(), &protected.join("original.png"));
    let rotated = save(&imageops::rotate90(&scene()), &candidates.join("rotated.png"));
    let small = save(&stripes(), &candidates.join("stripes.png"));
    let large = save(
        &imageops::resize(&stripes(), 256, 256, imageops::FilterType::Nearest),
        &candidates.join("nested").join("stripes-large.png"),
    );
    save(&noise(), &candidates.join("noise.png"));

    Library {
        _dir: dir,
        protected,
        candidates,
        original,
        rotated,
        small,
        large,
    }
}

#[tokio::test]
async fn test_scan_finds_rotated_and_rescaled_duplicates() {
    let lib = library();
    let resolution = scan(
        &png_config(),
        &[lib.protected.clone()],
        &[lib.candidates.clone()],
    )
    .await;

    let mut pairs: Vec<(PathBuf, PathBuf)> = resolution
        .decisions
        .iter()
        .map(|d| (d.keep.clone(), d.delete.clone()))
        .collect();
    pairs.sort();
    let mut expected = vec![
        (lib.original.clone(), lib.rotated.clone()),
        (lib.large.clone(), lib.small.clone()),
    ];
    expected.sort();
    assert_eq!(pairs, expected);

    for window in resolution.decisions.windows(2) {
        assert!(window[0].ssim >= window[1].ssim);
    }
    assert!(resolution.decisions.iter().all(|d| d.ssim >= 0.94));
    let rotated = resolution
        .decisions
        .iter()
        .find(|d| d.delete == lib.rotated)
        .unwrap();
    assert!((rotated.ssim - 1.0).abs() < 1e-9);

    assert_eq!(resolution.keeps_per_folder.len(), 2);
    assert_eq!(resolution.keeps_per_folder[&lib.protected], 1);
    assert_eq!(resolution.keeps_per_folder[&lib.candidates.join("nested")], 1);
}

#[tokio::test]
async fn test_rename_handler_moves_duplicates_beside_kept_files() {
    let lib = library();
    let resolution = scan(
        &png_config(),
        &[lib.protected.clone()],
        &[lib.candidates.clone()],
    )
    .await;

    let stats = apply_decisions(&resolution.decisions, &RenameHandler, &CancelToken::new());
    assert_eq!(stats.handled, 2);
    assert_eq!(stats.failed, 0);

    assert!(!lib.rotated.exists());
    assert!(!lib.small.exists());
    assert!(lib.original.exists());
    assert!(lib.large.exists());
    assert!(lib.protected.join("original delete (1).png").exists());
    assert!(lib
        .candidates
        .join("nested")
        .join("stripes-large delete (1).png")
        .exists());

    // The moved duplicates now live in scanned folders; a second scan with
    // renamed files present must still never touch the protected original.
    let again = scan(
        &png_config(),
        &[lib.protected.clone()],
        &[lib.candidates.clone()],
    )
    .await;
    assert!(again.decisions.iter().all(|d| d.delete != lib.original));
}

#[tokio::test]
async fn test_delete_handler_removes_only_losers() {
    let lib = library();
    let resolution = scan(
        &png_config(),
        &[lib.protected.clone()],
        &[lib.candidates.clone()],
    )
    .await;

    let stats = apply_decisions(&resolution.decisions, &DeleteHandler, &CancelToken::new());
    assert_eq!(stats.handled, 2);
    assert!(!lib.rotated.exists());
    assert!(!lib.small.exists());
    assert!(lib.original.exists());
    assert!(lib.large.exists());
    assert!(lib.candidates.join("noise.png").exists());
}

#[tokio::test]
async fn test_protected_file_under_aliased_candidate_root_survives_delete() {
    let lib = library();
    let alias = lib.protected.join("..").join("library");
    let resolution = scan(
        &png_config(),
        &[lib.protected.clone()],
        &[alias, lib.candidates.clone()],
    )
    .await;

    assert!(resolution.decisions.iter().all(|d| d.delete != lib.original));
    assert!(resolution.decisions.iter().all(|d| d.keep != d.delete));

    let stats = apply_decisions(&resolution.decisions, &DeleteHandler, &CancelToken::new());
    assert_eq!(stats.handled, 2);
    assert!(lib.original.exists());
    assert!(!lib.rotated.exists());
}

#[tokio::test]
async fn test_protected_root_rescanned_as_candidate_yields_no_decisions() {
    let lib = library();
    let alias = lib.candidates.join("..").join("library");
    let resolution = scan(&png_config(), &[lib.protected.clone()], &[alias]).await;
    assert!(resolution.decisions.is_empty());

    apply_decisions(&resolution.decisions, &DeleteHandler, &CancelToken::new());
    assert!(lib.original.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_candidate_root_never_deletes_protected() {
    let lib = library();
    let link = lib.candidates.join("linked-library");
    std::os::unix::fs::symlink(&lib.protected, &link).unwrap();

    let resolution = scan(
        &png_config(),
        &[lib.protected.clone()],
        &[lib.candidates.clone()],
    )
    .await;
    assert!(resolution.decisions.iter().all(|d| d.delete != lib.original));

    let stats = apply_decisions(&resolution.decisions, &DeleteHandler, &CancelToken::new());
    assert_eq!(stats.failed, 0);
    assert!(lib.original.exists());
    assert!(lib.large.exists());
}

#[tokio::test]
async fn test_overlapping_candidate_roots_count_each_file_once() {
    let lib = library();
    let resolution = scan(
        &png_config(),
        &[lib.protected.clone()],
        &[lib.candidates.clone(), lib.candidates.join("nested")],
    )
    .await;

    assert_eq!(resolution.decisions.len(), 2);
    assert!(resolution.decisions.iter().all(|d| d.keep != d.delete));
    let stats = apply_decisions(&resolution.decisions, &DeleteHandler, &CancelToken::new());
    assert_eq!(stats.failed, 0);
    assert!(lib.large.exists());
    assert!(lib.original.exists());
}

#[tokio::test]
async fn test_protected_duplicates_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let protected = dir.path().join("library");
    let candidates = dir.path().join("inbox");
    save(&scene(), &protected.join("a.png"));
    save(&scene(), &protected.join("b.png"));
    save(&noise(), &candidates.join("noise.png"));

    let resolution = scan(&png_config(), &[protected], &[candidates]).await;
    assert!(resolution.decisions.is_empty());
    assert!(resolution.keeps_per_folder.is_empty());
}

#[tokio::test]
async fn test_color_tolerance_blocks_tinted_copy() {
    let dir = tempfile::tempdir().unwrap();
    let candidates = dir.path().join("inbox");
    save(&scene(), &candidates.join("a.png"));

    // Same structure, blue channel shifted well past the tolerance.
    let mut tinted = scene();
    for pixel in tinted.pixels_mut() {
        pixel.0[2] = pixel.0[2].saturating_add(20);
    }
    save(&tinted, &candidates.join("b.png"));

    let resolution = scan(&png_config(), &[], &[candidates.clone()]).await;
    assert!(resolution.decisions.is_empty());

    let mut loose = png_config();
    loose.similarity.color_tolerance = 50.0;
    let resolution = scan(&loose, &[], &[candidates]).await;
    assert_eq!(resolution.decisions.len(), 1);
}

#[tokio::test]
async fn test_unreadable_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let candidates = dir.path().join("inbox");
    save(&scene(), &candidates.join("a.png"));
    save(&scene(), &candidates.join("b.png"));
    std::fs::write(candidates.join("broken.png"), b"\x89PNG\r\n\x1a\nnot really").unwrap();

    let config = png_config();
    let processor = ImageProcessor::new(&config);
    let inputs = processor.discover(&[], &[candidates.clone()]);
    let batch = processor
        .fingerprint_all(&inputs.candidates, Role::Candidate, &CancelToken::new(), |_, _| {})
        .await
        .unwrap();
    assert_eq!(batch.fingerprints.len(), 2);
    assert_eq!(batch.failed, 1);

    let resolution = scan(&config, &[], &[candidates]).await;
    assert_eq!(resolution.decisions.len(), 1);
}

#[test]
fn test_dynamic_image_roundtrip_matches_saved_file() {
    let img = DynamicImage::ImageRgb8(scene());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.png");
    img.save(&path).unwrap();
    let loaded = image::open(&path).unwrap().to_rgb8();
    assert_eq!(loaded, scene());
}
