//! Mock point sources.
//!
//! Sample images are recognised by name and yield their template's stars
//! with small perturbations. Uploaded images whose name still identifies a
//! template yield a degraded copy (jitter, dropped stars, noise stars).
//! Anything else falls back to a substring lookup and finally to random
//! points. None of this looks at pixels; see the `extraction` module for
//! the pixel-threshold scan.

use rand::Rng;
use tracing::debug;

use crate::matcher::{ImageSource, Template, TemplateLibrary};
use crate::{Point, PointSet};

/// Perturbation applied to template stars.
#[derive(Debug, Clone)]
pub struct PerturbationConfig {
    /// Full width of the uniform positional jitter for sample input (pixels).
    /// Default 10.
    pub sample_jitter: f64,
    /// Full width of the jitter for uploaded input (pixels). Default 25.
    pub uploaded_jitter: f64,
    /// Range `[lo, hi)` of the brightness multiplier drawn once per set.
    /// Default [0.9, 1.1).
    pub brightness_factor: (f64, f64),
    /// Fraction of stars dropped from uploaded input, `[lo, hi)`.
    /// Default [0.1, 0.3).
    pub drop_fraction: (f64, f64),
    /// Noise stars added to uploaded input, inclusive range. Default 2..=6.
    pub noise_stars: (usize, usize),
    /// Field noise stars are scattered over (width, height). Default 600x400.
    pub field: (f64, f64),
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            sample_jitter: 10.0,
            uploaded_jitter: 25.0,
            brightness_factor: (0.9, 1.1),
            drop_fraction: (0.1, 0.3),
            noise_stars: (2, 6),
            field: (600.0, 400.0),
        }
    }
}

/// How a set of mock points was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointOrigin {
    /// The `*.png` stem named this template exactly.
    Template(String),
    /// The template's name appears somewhere in the reference.
    Substring(String),
    /// Nothing matched; synthetic stars.
    Random,
}

impl PointOrigin {
    pub fn template_name(&self) -> Option<&str> {
        match self {
            PointOrigin::Template(n) | PointOrigin::Substring(n) => Some(n),
            PointOrigin::Random => None,
        }
    }
}

/// Points produced for an image reference.
#[derive(Debug, Clone)]
pub struct MockPoints {
    pub points: PointSet,
    pub origin: PointOrigin,
    pub source: ImageSource,
}

// ── Reference parsing ───────────────────────────────────────────────────────

/// Alphabetic stem directly before the first `.png` that has one.
///
/// `"img/Orion.png"` and `"x/my2Leo.png?v=1"` give `Orion` and `Leo`.
pub fn png_hint(reference: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(off) = reference[search_from..].find(".png") {
        let end = search_from + off;
        let start = reference[..end]
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_alphabetic())
            .last()
            .map(|(i, _)| i);
        if let Some(start) = start {
            return Some(&reference[start..end]);
        }
        search_from = end + ".png".len();
    }
    None
}

/// True for bundled sample paths: `.../<letters>.png` at the very end.
pub fn is_sample_reference(reference: &str) -> bool {
    let Some(rest) = reference.strip_suffix(".png") else {
        return false;
    };
    match rest.rfind('/') {
        Some(slash) => {
            let stem = &rest[slash + 1..];
            !stem.is_empty() && stem.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

/// Uploaded if flagged, or if the reference is not a sample path.
pub fn classify_reference(reference: &str, uploaded: bool) -> ImageSource {
    if uploaded || !is_sample_reference(reference) {
        ImageSource::Uploaded
    } else {
        ImageSource::Sample
    }
}

// ── Point generation ────────────────────────────────────────────────────────

/// Resolve a reference to mock points.
///
/// The `*.png` stem is tried as an exact template name first, then every
/// template name as a case-insensitive substring of the reference, then
/// random points.
pub fn points_for_reference<R: Rng + ?Sized>(
    library: &TemplateLibrary,
    reference: &str,
    source: ImageSource,
    config: &PerturbationConfig,
    rng: &mut R,
) -> MockPoints {
    if let Some(t) = png_hint(reference).and_then(|h| library.get(h)) {
        debug!("Using template data for {}", t.name);
        return MockPoints {
            points: perturbed_template_points(t, source, config, rng),
            origin: PointOrigin::Template(t.name.clone()),
            source,
        };
    }

    if let Some(t) = library.find_in_reference(reference) {
        debug!("Reference '{}' mentions {}", reference, t.name);
        // Substring matches always get sample-grade jitter and keep every star.
        return MockPoints {
            points: perturb(t, config.sample_jitter, false, config, rng),
            origin: PointOrigin::Substring(t.name.clone()),
            source,
        };
    }

    debug!("No template for '{}', generating random stars", reference);
    MockPoints {
        points: random_points(rng),
        origin: PointOrigin::Random,
        source,
    }
}

/// Copy a template's raw stars with source-dependent perturbation.
///
/// Every star is jittered in position. Brightness is scaled by one factor
/// shared by the whole set, so the template's brightness order (and with
/// it the anchor and reference) survives. Uploaded input also loses
/// 10-30 % of its stars and gains unnamed noise stars.
pub fn perturbed_template_points<R: Rng + ?Sized>(
    template: &Template,
    source: ImageSource,
    config: &PerturbationConfig,
    rng: &mut R,
) -> PointSet {
    match source {
        ImageSource::Sample => perturb(template, config.sample_jitter, false, config, rng),
        ImageSource::Uploaded => perturb(template, config.uploaded_jitter, true, config, rng),
    }
}

fn perturb<R: Rng + ?Sized>(
    template: &Template,
    jitter: f64,
    degrade: bool,
    config: &PerturbationConfig,
    rng: &mut R,
) -> PointSet {
    let mut stars: Vec<Point> = template.points.points().to_vec();

    if degrade {
        let fraction = uniform(rng, config.drop_fraction);
        let drop = (stars.len() as f64 * fraction).floor() as usize;
        for _ in 0..drop {
            if stars.is_empty() {
                break;
            }
            let idx = rng.random_range(0..stars.len());
            stars.remove(idx);
        }

        let (lo, hi) = config.noise_stars;
        let noise = if hi > lo { rng.random_range(lo..=hi) } else { lo };
        for _ in 0..noise {
            let mut p = Point::new(
                uniform(rng, (0.0, config.field.0)),
                uniform(rng, (0.0, config.field.1)),
                uniform(rng, (0.5, 1.0)),
            );
            p.size = Some(uniform(rng, (2.0, 5.0)));
            stars.push(p);
        }
    }

    let half = jitter / 2.0;
    let factor = uniform(rng, config.brightness_factor);
    let perturbed = stars
        .into_iter()
        .map(|s| {
            let size = s.size.unwrap_or_else(|| uniform(rng, (3.0, 5.0)));
            Point {
                x: s.x + uniform(rng, (-half, half)),
                y: s.y + uniform(rng, (-half, half)),
                brightness: (s.brightness * factor).clamp(0.0, 1.0),
                size: Some(size),
                spectral_type: None,
                magnitude: None,
                ..s
            }
            .with_defaults()
        })
        .collect();

    PointSet::new(perturbed)
}

/// 5-9 synthetic stars scattered ±100 px around (300, 200), brightness
/// stepping down by 0.1.
pub fn random_points<R: Rng + ?Sized>(rng: &mut R) -> PointSet {
    let count: usize = rng.random_range(5..=9);
    let points = (0..count)
        .map(|i| {
            let mut p = Point::named(
                300.0 + uniform(rng, (-100.0, 100.0)),
                200.0 + uniform(rng, (-100.0, 100.0)),
                1.0 - i as f64 * 0.1,
                &format!("Star {}", i + 1),
            );
            p.size = Some(uniform(rng, (3.0, 5.0)));
            p.with_defaults()
        })
        .collect();
    PointSet::new(points)
}

/// Uniform draw from `[lo, hi)`, or `lo` for an empty range.
fn uniform<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_png_hint() {
        assert_eq!(png_hint("images/Orion.png"), Some("Orion"));
        assert_eq!(png_hint("x/my2Leo.png?v=1"), Some("Leo"));
        assert_eq!(png_hint("uploads/42.png"), None);
        assert_eq!(png_hint("/a/123.png/Vela.png"), Some("Vela"));
        assert_eq!(png_hint("photo.jpg"), None);
    }

    #[test]
    fn test_classify_reference() {
        assert_eq!(classify_reference("images/Orion.png", false), ImageSource::Sample);
        assert_eq!(classify_reference("images/Orion.png", true), ImageSource::Uploaded);
        assert_eq!(classify_reference("images/orion_2.png", false), ImageSource::Uploaded);
        assert_eq!(classify_reference("Orion.png", false), ImageSource::Uploaded);
        assert_eq!(classify_reference("data:image/jpeg;base64,AAAA", false), ImageSource::Uploaded);
    }

    #[test]
    fn test_sample_perturbation_bounds() {
        let lib = TemplateLibrary::builtin();
        let orion = lib.get("Orion").unwrap();
        let cfg = PerturbationConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let pts = perturbed_template_points(orion, ImageSource::Sample, &cfg, &mut rng);
        assert_eq!(pts.len(), orion.star_count());
        for p in pts.iter() {
            let name = p.name.as_deref().unwrap();
            let orig = orion.points.iter().find(|o| o.name.as_deref() == Some(name)).unwrap();
            assert!((p.x - orig.x).abs() <= 5.0);
            assert!((p.y - orig.y).abs() <= 5.0);
            assert!(p.brightness <= 1.0);
            assert!(p.brightness >= orig.brightness * 0.9 - 1e-12);
            assert!(p.spectral_type.is_some() && p.magnitude.is_some() && p.size.is_some());
        }
        // still sorted brightest-first
        assert!(pts.points().windows(2).all(|w| w[0].brightness >= w[1].brightness));
    }

    #[test]
    fn test_perturbation_keeps_template_order() {
        let lib = TemplateLibrary::builtin();
        let cfg = PerturbationConfig::default();
        let mut rng = StdRng::seed_from_u64(17);
        for t in lib.iter() {
            let expected: Vec<&str> = t.points.iter().filter_map(|p| p.name.as_deref()).collect();
            for _ in 0..50 {
                let pts = perturbed_template_points(t, ImageSource::Sample, &cfg, &mut rng);
                let names: Vec<&str> = pts.iter().filter_map(|p| p.name.as_deref()).collect();
                assert_eq!(names, expected, "{}", t.name);

                // Dropped stars aside, survivors keep their relative order.
                let pts = perturbed_template_points(t, ImageSource::Uploaded, &cfg, &mut rng);
                let mut remaining = expected.iter();
                for name in pts.iter().filter_map(|p| p.name.as_deref()) {
                    assert!(remaining.any(|&e| e == name), "{}: {} out of order", t.name, name);
                }
            }
        }
    }

    #[test]
    fn test_uploaded_perturbation_drops_and_adds() {
        let lib = TemplateLibrary::builtin();
        let orion = lib.get("Orion").unwrap();
        let cfg = PerturbationConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let pts = perturbed_template_points(orion, ImageSource::Uploaded, &cfg, &mut rng);
            let named = pts.iter().filter(|p| p.name.is_some()).count();
            let noise = pts.len() - named;
            // 9 stars: floor(0.9..2.7) = 0..2 dropped
            assert!((7..=9).contains(&named), "{named}");
            assert!((2..=6).contains(&noise), "{noise}");
        }
    }

    #[test]
    fn test_points_for_reference_origins() {
        let lib = TemplateLibrary::builtin();
        let cfg = PerturbationConfig::default();
        let mut rng = StdRng::seed_from_u64(5);

        let m = points_for_reference(&lib, "samples/Leo.png", ImageSource::Sample, &cfg, &mut rng);
        assert_eq!(m.origin, PointOrigin::Template("Leo".into()));
        assert_eq!(m.points.len(), 6);

        let m = points_for_reference(&lib, "my-cygnus-and-vela.jpg", ImageSource::Uploaded, &cfg, &mut rng);
        assert_eq!(m.origin, PointOrigin::Substring("Vela".into()));
        assert_eq!(m.points.len(), lib.get("Vela").unwrap().star_count());

        let m = points_for_reference(&lib, "IMG_0001.jpg", ImageSource::Uploaded, &cfg, &mut rng);
        assert_eq!(m.origin, PointOrigin::Random);
        assert!((5..=9).contains(&m.points.len()));
        assert_eq!(m.points[0].name.as_deref(), Some("Star 1"));
    }
}
