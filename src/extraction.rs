//! Extract star points from an RGB image by brightness thresholding.
//!
//! This is a deliberately simple scan, not a photometric pipeline:
//! 1. Weight every pixel as `0.3 r + 0.3 g + 0.4 b`
//! 2. For each threshold on a ladder, label connected components of
//!    pixels above it and centroid each component
//! 3. Keep the threshold whose star count is in the preferred band and
//!    closest to the target count, falling back to lower thresholds
//! 4. Merge detections closer than a fraction of the image size
//!
//! Requires the `image` feature to be enabled.
//!
//! # Example
//!
//! ```no_run
//! use stellar::extraction::{extract_points, ExtractionConfig};
//!
//! let result = extract_points("night_sky.jpg", &ExtractionConfig::default()).unwrap();
//! println!("Found {} stars", result.points.len());
//! ```

use std::collections::HashMap;

use anyhow::{Context, Result};
use image::GenericImageView;
use tracing::debug;

use crate::{Point, PointSet};

/// Configuration for threshold extraction.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Thresholds tried in order, on the 0..255 weighted scale.
    /// Default: [180, 190, 200, 210]
    pub thresholds: Vec<f64>,

    /// Inclusive star-count band a ladder threshold must produce.
    /// Default: (5, 15)
    pub preferred_count: (usize, usize),

    /// Within the band, the count closest to this wins. Earlier thresholds
    /// win ties.
    /// Default: 8
    pub target_count: usize,

    /// `(threshold, brightness multiplier)` pairs tried in order when no
    /// ladder threshold lands in the band. The first producing at least
    /// `min_stars` is used.
    /// Default: [(180, 0.9), (150, 0.8)]
    pub fallbacks: Vec<(f64, f64)>,

    /// 8-connectivity (true) or 4-connectivity (false) for labeling.
    /// Default: true
    pub use_8_connectivity: bool,

    /// Detections closer than this fraction of `min(width, height)` are
    /// merged, keeping the brighter.
    /// Default: 0.02
    pub min_separation_fraction: f64,

    /// Fewer stars than this cannot be matched.
    /// Default: 3
    pub min_stars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            thresholds: vec![180.0, 190.0, 200.0, 210.0],
            preferred_count: (5, 15),
            target_count: 8,
            fallbacks: vec![(180.0, 0.9), (150.0, 0.8)],
            use_8_connectivity: true,
            min_separation_fraction: 0.02,
            min_stars: 3,
        }
    }
}

/// Result of threshold extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Detected stars, brightest first, in pixel coordinates (+Y down).
    pub points: PointSet,

    pub image_width: u32,
    pub image_height: u32,

    /// Threshold that produced `points`.
    pub threshold: f64,

    /// Brightness multiplier applied at that threshold (1.0 on the ladder).
    pub brightness_multiplier: f64,

    /// Components found at `threshold` before merging.
    pub num_blobs_raw: usize,

    /// Minimum stars required for matching, copied from the config.
    pub min_stars: usize,
}

impl ExtractionResult {
    /// Fewer stars than the configured minimum.
    pub fn is_too_few(&self) -> bool {
        self.points.len() < self.min_stars
    }
}

/// Extract star points from an image file.
pub fn extract_points(
    path: impl AsRef<std::path::Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult> {
    let img = image::open(path.as_ref())
        .with_context(|| format!("Failed to open image: {}", path.as_ref().display()))?;
    extract_points_from_image(&img, config)
}

/// Extract star points from an already-loaded [`image::DynamicImage`].
pub fn extract_points_from_image(
    img: &image::DynamicImage,
    config: &ExtractionConfig,
) -> Result<ExtractionResult> {
    let (width, height) = img.dimensions();
    let rgb = img.to_rgb8();
    extract_points_from_rgb(rgb.as_raw(), width, height, config)
}

/// Extract star points from raw interleaved RGB bytes (row-major, 3 bytes
/// per pixel).
pub fn extract_points_from_rgb(
    rgb: &[u8],
    width: u32,
    height: u32,
    config: &ExtractionConfig,
) -> Result<ExtractionResult> {
    let n = width as usize * height as usize;
    anyhow::ensure!(
        rgb.len() == n * 3,
        "RGB data length ({}) does not match width*height*3 ({}x{}x3={})",
        rgb.len(),
        width,
        height,
        n * 3
    );
    anyhow::ensure!(
        !config.thresholds.is_empty() || !config.fallbacks.is_empty(),
        "Extraction config has no thresholds"
    );

    let weights: Vec<f64> = rgb.chunks_exact(3).map(weighted_brightness).collect();

    // ── Threshold ladder ──
    let (lo, hi) = config.preferred_count;
    let mut best: Option<(f64, Vec<Point>)> = None;
    for &threshold in &config.thresholds {
        let stars = detect_at_threshold(&weights, width, height, threshold, 1.0, config);
        debug!("Threshold {}: {} stars", threshold, stars.len());
        if stars.len() < lo || stars.len() > hi {
            continue;
        }
        let off = stars.len().abs_diff(config.target_count);
        let better = match &best {
            Some((_, b)) => off < b.len().abs_diff(config.target_count),
            None => true,
        };
        if better {
            best = Some((threshold, stars));
        }
    }

    let (threshold, multiplier, raw) = match best {
        Some((t, stars)) => (t, 1.0, stars),
        None => fallback_detection(&weights, width, height, config),
    };
    debug!(
        "Using threshold {} (x{}): {} raw stars",
        threshold,
        multiplier,
        raw.len()
    );

    let num_blobs_raw = raw.len();
    let min_separation = width.min(height) as f64 * config.min_separation_fraction;
    let refined: Vec<Point> = merge_close(raw, min_separation)
        .into_iter()
        .map(Point::with_defaults)
        .collect();

    Ok(ExtractionResult {
        points: PointSet::new(refined),
        image_width: width,
        image_height: height,
        threshold,
        brightness_multiplier: multiplier,
        num_blobs_raw,
        min_stars: config.min_stars,
    })
}

// ─── Internal helpers ──────────────────────────────────────────────────────

#[inline]
fn weighted_brightness(px: &[u8]) -> f64 {
    0.3 * px[0] as f64 + 0.3 * px[1] as f64 + 0.4 * px[2] as f64
}

/// Try the fallback thresholds in order. If none yields enough stars the
/// last attempt is returned as is.
fn fallback_detection(
    weights: &[f64],
    width: u32,
    height: u32,
    config: &ExtractionConfig,
) -> (f64, f64, Vec<Point>) {
    let mut last = (0.0, 1.0, Vec::new());
    for &(threshold, multiplier) in &config.fallbacks {
        let stars = detect_at_threshold(weights, width, height, threshold, multiplier, config);
        debug!("Fallback threshold {}: {} stars", threshold, stars.len());
        let enough = stars.len() >= config.min_stars;
        last = (threshold, multiplier, stars);
        if enough {
            break;
        }
    }
    last
}

/// Centroid every connected component of pixels strictly above `threshold`.
///
/// Components come out in raster order of their first pixel. Brightness is
/// the component's peak weighted value over 255, times `multiplier`.
fn detect_at_threshold(
    weights: &[f64],
    width: u32,
    height: u32,
    threshold: f64,
    multiplier: f64,
    config: &ExtractionConfig,
) -> Vec<Point> {
    let mask: Vec<bool> = weights.iter().map(|&v| v > threshold).collect();
    let labels = label_connected_components(&mask, width, height, config.use_8_connectivity);
    let num_labels = labels.iter().copied().max().unwrap_or(0) as usize;

    struct Blob {
        sum_x: f64,
        sum_y: f64,
        sum_w: f64,
        peak: f64,
        pixels: usize,
    }
    let mut blobs: Vec<Blob> = (0..num_labels)
        .map(|_| Blob {
            sum_x: 0.0,
            sum_y: 0.0,
            sum_w: 0.0,
            peak: 0.0,
            pixels: 0,
        })
        .collect();

    let w = width as usize;
    for (idx, (&label, &v)) in labels.iter().zip(weights.iter()).enumerate() {
        if label == 0 {
            continue;
        }
        let b = &mut blobs[label as usize - 1];
        let (col, row) = ((idx % w) as f64, (idx / w) as f64);
        b.sum_x += v * col;
        b.sum_y += v * row;
        b.sum_w += v;
        b.peak = b.peak.max(v);
        b.pixels += 1;
    }

    blobs
        .into_iter()
        .filter(|b| b.pixels > 0 && b.sum_w > 0.0)
        .map(|b| {
            let mut p = Point::new(
                b.sum_x / b.sum_w,
                b.sum_y / b.sum_w,
                (b.peak / 255.0 * multiplier).clamp(0.0, 1.0),
            );
            // Equivalent-circle diameter.
            p.size = Some(2.0 * (b.pixels as f64 / std::f64::consts::PI).sqrt());
            p
        })
        .collect()
}

/// Drop detections within `min_distance` of an earlier kept one. When the
/// later detection is brighter it replaces the kept one in place.
fn merge_close(stars: Vec<Point>, min_distance: f64) -> Vec<Point> {
    let mut kept: Vec<Point> = Vec::with_capacity(stars.len());
    for star in stars {
        match kept.iter_mut().find(|k| k.distance(&star) < min_distance) {
            Some(existing) => {
                if star.brightness > existing.brightness {
                    *existing = star;
                }
            }
            None => kept.push(star),
        }
    }
    kept
}

/// Two-pass union-find labeling. Labels are 1-based and numbered in raster
/// order of each component's first pixel; 0 is background.
fn label_connected_components(
    mask: &[bool],
    width: u32,
    height: u32,
    use_8_connectivity: bool,
) -> Vec<u32> {
    let w = width as usize;
    let h = height as usize;

    let mut labels = vec![0u32; w * h];
    // parent[0] is the background.
    let mut parent: Vec<u32> = vec![0];
    let mut next_label = 1u32;

    fn find(parent: &mut [u32], mut x: u32) -> u32 {
        while parent[x as usize] != x {
            parent[x as usize] = parent[parent[x as usize] as usize];
            x = parent[x as usize];
        }
        x
    }

    fn union(parent: &mut [u32], a: u32, b: u32) {
        let ra = find(parent, a);
        let rb = find(parent, b);
        if ra < rb {
            parent[rb as usize] = ra;
        } else if rb < ra {
            parent[ra as usize] = rb;
        }
    }

    for row in 0..h {
        for col in 0..w {
            let idx = row * w + col;
            if !mask[idx] {
                continue;
            }

            let mut neighbors = [0u32; 4];
            let mut count = 0;
            let mut push = |label: u32| {
                if label > 0 {
                    neighbors[count] = label;
                    count += 1;
                }
            };
            if col > 0 {
                push(labels[idx - 1]);
            }
            if row > 0 {
                push(labels[idx - w]);
                if use_8_connectivity {
                    if col > 0 {
                        push(labels[idx - w - 1]);
                    }
                    if col + 1 < w {
                        push(labels[idx - w + 1]);
                    }
                }
            }

            match neighbors[..count].iter().copied().min() {
                None => {
                    parent.push(next_label);
                    labels[idx] = next_label;
                    next_label += 1;
                }
                Some(min_label) => {
                    labels[idx] = min_label;
                    for &nl in &neighbors[..count] {
                        union(&mut parent, min_label, nl);
                    }
                }
            }
        }
    }

    // Flatten to sequential labels.
    let mut root_map: HashMap<u32, u32> = HashMap::new();
    let mut seq = 1u32;
    for label in labels.iter_mut() {
        if *label > 0 {
            let root = find(&mut parent, *label);
            *label = *root_map.entry(root).or_insert_with(|| {
                let s = seq;
                seq += 1;
                s
            });
        }
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Black RGB canvas with square "stars" of side `r` at the given
    /// (col, row, grey level) positions.
    fn canvas(w: u32, h: u32, stars: &[(u32, u32, u8)], r: u32) -> Vec<u8> {
        let mut rgb = vec![0u8; (w * h * 3) as usize];
        for &(cx, cy, v) in stars {
            for row in cy..(cy + r).min(h) {
                for col in cx..(cx + r).min(w) {
                    let i = ((row * w + col) * 3) as usize;
                    rgb[i..i + 3].copy_from_slice(&[v, v, v]);
                }
            }
        }
        rgb
    }

    #[test]
    fn test_connected_components_4conn() {
        let mask = vec![
            false, true, true, false, false, // row 0
            false, true, false, false, false, // row 1
            false, false, false, false, false, // row 2
            false, false, false, true, true, // row 3
            false, false, true, false, false, // row 4
        ];
        let labels = label_connected_components(&mask, 5, 5, false);
        assert_eq!(labels[1], 1);
        assert_eq!(labels[2], 1);
        assert_eq!(labels[6], 1);
        assert_eq!(labels[18], 2);
        assert_eq!(labels[19], 2);
        // diagonal only: separate under 4-connectivity
        assert_eq!(labels[22], 3);

        let labels8 = label_connected_components(&mask, 5, 5, true);
        assert_eq!(labels8[22], labels8[18]);
    }

    #[test]
    fn test_u_shape_merges() {
        // Two arms joined at the bottom get one label.
        let mask = vec![
            true, false, true, //
            true, false, true, //
            true, true, true, //
        ];
        let labels = label_connected_components(&mask, 3, 3, false);
        assert!(labels.iter().all(|&l| l == 1 || l == 0));
    }

    #[test]
    fn test_ladder_prefers_target_count() {
        // Six bright stars; all ladder thresholds see the same six.
        let stars: Vec<(u32, u32, u8)> = (0..6).map(|i| (10 + i * 30, 20 + (i % 2) * 40, 250)).collect();
        let rgb = canvas(200, 100, &stars, 3);
        let res = extract_points_from_rgb(&rgb, 200, 100, &ExtractionConfig::default()).unwrap();
        assert_eq!(res.points.len(), 6);
        assert_eq!(res.threshold, 180.0);
        assert_eq!(res.brightness_multiplier, 1.0);
        assert!(!res.is_too_few());
        let p = &res.points[0];
        assert!((p.brightness - 250.0 / 255.0).abs() < 1e-9);
        assert!(p.spectral_type.is_some());
        // centroid of a 3x3 square at (10, 20) is (11, 21)
        assert!(res
            .points
            .iter()
            .any(|p| (p.x - 11.0).abs() < 1e-9 && (p.y - 21.0).abs() < 1e-9));
    }

    #[test]
    fn test_fallback_threshold() {
        // Three stars bright enough for the ladder, too few for the band.
        let rgb = canvas(100, 100, &[(10, 10, 220), (50, 50, 220), (80, 20, 220)], 2);
        let res = extract_points_from_rgb(&rgb, 100, 100, &ExtractionConfig::default()).unwrap();
        assert_eq!(res.threshold, 180.0);
        assert_eq!(res.brightness_multiplier, 0.9);
        assert_eq!(res.points.len(), 3);
        assert!((res.points[0].brightness - 220.0 / 255.0 * 0.9).abs() < 1e-9);

        // Dim stars only show up at 150.
        let rgb = canvas(100, 100, &[(10, 10, 160), (50, 50, 160), (80, 20, 160)], 2);
        let res = extract_points_from_rgb(&rgb, 100, 100, &ExtractionConfig::default()).unwrap();
        assert_eq!(res.threshold, 150.0);
        assert_eq!(res.brightness_multiplier, 0.8);
        assert_eq!(res.points.len(), 3);
    }

    #[test]
    fn test_too_few_reported() {
        let rgb = canvas(50, 50, &[(10, 10, 255)], 2);
        let res = extract_points_from_rgb(&rgb, 50, 50, &ExtractionConfig::default()).unwrap();
        assert!(res.is_too_few());
        assert_eq!(res.points.len(), 1);
    }

    #[test]
    fn test_merge_close_keeps_brighter() {
        let stars = vec![
            Point::new(10.0, 10.0, 0.5),
            Point::new(11.0, 10.0, 0.9),
            Point::new(40.0, 10.0, 0.7),
        ];
        let merged = merge_close(stars, 2.0);
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].x, merged[0].brightness), (11.0, 0.9));
    }

    #[test]
    fn test_rgb_length_checked() {
        let err = extract_points_from_rgb(&[0u8; 10], 2, 2, &ExtractionConfig::default()).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }
}
