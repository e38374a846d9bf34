//! End-to-end detection: obtain points, normalize, select a template, and
//! annotate the result for presentation.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info};

use crate::lines::lines_for;
use crate::matcher::normalize::is_degenerate;
use crate::matcher::{
    normalize, ConfidenceModel, DeterministicConfidence, ImageSource, MatchConfig, MatchQuery,
    MatchResult, MatchStatus, Template, TemplateLibrary,
};
use crate::source::{classify_reference, png_hint, points_for_reference, PerturbationConfig, PointOrigin};
use crate::star_info::describe_spectral_type;
use crate::PointSet;

/// Configuration for the detection pipeline.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub match_config: MatchConfig,
    pub perturbation: PerturbationConfig,
    #[cfg(feature = "image")]
    pub extraction: crate::extraction::ExtractionConfig,
    /// Base distance in normalized units for pairing template stars with
    /// detected stars in [`MatchedStar`] details. Default 0.05.
    pub detail_distance: f64,
    /// Multiplier on `detail_distance` for sample input. Default 2.0.
    pub sample_detail_factor: f64,
    /// Multiplier on `detail_distance` for uploaded input. Default 1.5.
    pub uploaded_detail_factor: f64,
    /// Fraction of template stars reported for sample input. Default 0.8.
    pub sample_detail_fraction: f64,
    /// Fraction of template stars reported for uploaded input. Default 0.6.
    pub uploaded_detail_fraction: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            perturbation: PerturbationConfig::default(),
            #[cfg(feature = "image")]
            extraction: crate::extraction::ExtractionConfig::default(),
            detail_distance: 0.05,
            sample_detail_factor: 2.0,
            uploaded_detail_factor: 1.5,
            sample_detail_fraction: 0.8,
            uploaded_detail_fraction: 0.6,
        }
    }
}

/// A template star paired with a detected star.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedStar {
    pub name: String,
    /// Template brightness.
    pub brightness: f64,
    /// Index into the template's points.
    pub template_index: usize,
    /// Index into the detected points.
    pub detected_index: usize,
    /// Distance in normalized units.
    pub distance: f64,
    pub spectral_type: Option<String>,
    pub magnitude: Option<f64>,
    /// Colour and luminosity class, e.g. "blue-white star main sequence".
    pub description: String,
}

/// Everything produced by one detection request.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub match_result: MatchResult,
    /// Detected points, brightest first.
    pub points: PointSet,
    /// `points` after normalization.
    pub normalized: PointSet,
    /// Line figure over `points`.
    pub lines: Vec<[usize; 2]>,
    /// Named template stars found among the detected points. Empty unless
    /// a template was selected.
    pub matched_stars: Vec<MatchedStar>,
    pub source: ImageSource,
    /// How mock points were obtained; `None` for caller-supplied points or
    /// pixel extraction.
    pub origin: Option<PointOrigin>,
    /// Wall-clock time spent in the pipeline.
    pub elapsed: Duration,
}

impl DetectionResult {
    pub fn is_success(&self) -> bool {
        self.match_result.is_success()
    }

    pub fn constellation(&self) -> Option<&str> {
        self.match_result.constellation.as_deref()
    }

    pub fn processing_time_s(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Line figure as coordinate pairs.
    pub fn line_coordinates(&self) -> Vec<[(f64, f64); 2]> {
        crate::lines::line_coordinates(&self.points, &self.lines)
    }
}

/// Detection pipeline over a fixed template library.
///
/// The confidence model is the only mutable state; everything else is
/// read-only after construction.
pub struct Detector<C: ConfidenceModel = DeterministicConfidence> {
    library: TemplateLibrary,
    config: DetectorConfig,
    confidence: C,
}

impl Detector<DeterministicConfidence> {
    /// Detector over the built-in constellations with reproducible
    /// confidence.
    pub fn builtin() -> Self {
        Self::new(
            TemplateLibrary::builtin(),
            DetectorConfig::default(),
            DeterministicConfidence::default(),
        )
    }
}

impl<C: ConfidenceModel> Detector<C> {
    pub fn new(library: TemplateLibrary, config: DetectorConfig, confidence: C) -> Self {
        info!("Detector ready with {} templates", library.len());
        Self {
            library,
            config,
            confidence,
        }
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Match caller-supplied points.
    ///
    /// `hint` biases selection toward a template and, when it names one,
    /// lets that template's line figure be reused.
    pub fn detect_points(
        &mut self,
        points: PointSet,
        source: ImageSource,
        hint: Option<&str>,
    ) -> DetectionResult {
        self.run(points, source, hint, hint, None, Instant::now())
    }

    /// Match mock points generated for an image reference.
    ///
    /// The reference is uploaded if `uploaded` is set or it is not a bundled
    /// sample path. Its `*.png` stem is used as the selection hint.
    pub fn detect_reference<R: Rng + ?Sized>(
        &mut self,
        reference: &str,
        uploaded: bool,
        rng: &mut R,
    ) -> DetectionResult {
        let t0 = Instant::now();
        let source = classify_reference(reference, uploaded);
        debug!(
            "Detecting '{}' as {} input",
            reference,
            if source.is_uploaded() { "uploaded" } else { "sample" }
        );
        let mock = points_for_reference(
            &self.library,
            reference,
            source,
            &self.config.perturbation,
            rng,
        );
        let line_template = mock.origin.template_name().map(str::to_string);
        self.run(
            mock.points,
            source,
            png_hint(reference),
            line_template.as_deref(),
            Some(mock.origin),
            t0,
        )
    }

    /// Extract points from an image file by thresholding and match them.
    ///
    /// Image input is always scored as uploaded. A `*.png` stem in the path
    /// is still used as a hint.
    #[cfg(feature = "image")]
    pub fn detect_image(
        &mut self,
        path: impl AsRef<std::path::Path>,
    ) -> anyhow::Result<DetectionResult> {
        let t0 = Instant::now();
        let path = path.as_ref();
        let extracted = crate::extraction::extract_points(path, &self.config.extraction)?;
        let reference = path.to_string_lossy();
        let hint = png_hint(&reference);

        if extracted.is_too_few() {
            debug!(
                "Only {} stars extracted from {}",
                extracted.points.len(),
                path.display()
            );
            let normalized = normalize(&extracted.points);
            return Ok(DetectionResult {
                match_result: MatchResult::failure(MatchStatus::TooFew, Vec::new()),
                points: extracted.points,
                normalized,
                lines: Vec::new(),
                matched_stars: Vec::new(),
                source: ImageSource::Uploaded,
                origin: None,
                elapsed: t0.elapsed(),
            });
        }

        Ok(self.run(extracted.points, ImageSource::Uploaded, hint, None, None, t0))
    }

    fn run(
        &mut self,
        points: PointSet,
        source: ImageSource,
        hint: Option<&str>,
        line_template: Option<&str>,
        origin: Option<PointOrigin>,
        t0: Instant,
    ) -> DetectionResult {
        let normalized = normalize(&points);

        let match_result = if is_degenerate(&points) {
            debug!("{} points cannot be normalized", points.len());
            MatchResult::failure(MatchStatus::TooFew, Vec::new())
        } else {
            self.library.select_best_match(
                &normalized,
                MatchQuery { hint, source },
                &self.config.match_config,
                &mut self.confidence,
            )
        };

        let lines = lines_for(&points, line_template.and_then(|n| self.library.get(n)));

        let matched_stars = match match_result
            .constellation
            .as_deref()
            .and_then(|n| self.library.get(n))
        {
            Some(t) => matched_star_details(t, &normalized, source, &self.config),
            None => Vec::new(),
        };

        let elapsed = t0.elapsed();
        match &match_result.constellation {
            Some(name) => info!(
                "Detected {} ({}% confidence) in {:.1} ms",
                name,
                match_result.confidence_score.unwrap_or(0),
                elapsed.as_secs_f64() * 1000.0
            ),
            None => info!("No constellation detected ({:?})", match_result.status),
        }

        DetectionResult {
            match_result,
            points,
            normalized,
            lines,
            matched_stars,
            source,
            origin,
            elapsed,
        }
    }
}

/// Pair named template stars with the nearest detected star in normalized
/// space.
///
/// A pair counts when closer than `detail_distance` times the source
/// factor. The brightest pairs are kept, up to `ceil(fraction * size)`.
pub fn matched_star_details(
    template: &Template,
    normalized: &PointSet,
    source: ImageSource,
    config: &DetectorConfig,
) -> Vec<MatchedStar> {
    let (factor, fraction) = match source {
        ImageSource::Sample => (config.sample_detail_factor, config.sample_detail_fraction),
        ImageSource::Uploaded => (
            config.uploaded_detail_factor,
            config.uploaded_detail_fraction,
        ),
    };
    let threshold = config.detail_distance * factor;
    let limit = (template.star_count() as f64 * fraction).ceil() as usize;

    let mut matched: Vec<MatchedStar> = Vec::new();
    for (ti, (tp, raw)) in template
        .normalized
        .iter()
        .zip(template.points.iter())
        .enumerate()
    {
        let Some(name) = raw.name.as_deref() else {
            continue;
        };
        let nearest = normalized
            .iter()
            .enumerate()
            .map(|(di, dp)| (di, tp.distance(dp)))
            .fold(None, |best: Option<(usize, f64)>, (di, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((di, d)),
            });
        if let Some((di, d)) = nearest.filter(|&(_, d)| d < threshold) {
            let annotated = raw.clone().with_defaults();
            let spectral_type = annotated.spectral_type;
            matched.push(MatchedStar {
                name: name.to_string(),
                brightness: raw.brightness,
                template_index: ti,
                detected_index: di,
                distance: d,
                description: spectral_type
                    .as_deref()
                    .map(describe_spectral_type)
                    .unwrap_or_default(),
                spectral_type,
                magnitude: annotated.magnitude,
            });
        }
    }

    matched.sort_by(|a, b| {
        b.brightness
            .partial_cmp(&a.brightness)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matched.truncate(limit);
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::DampedConfidence;
    use crate::Point;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn init_logging() {
        let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
    }

    #[test]
    fn test_detect_exact_orion_points() {
        init_logging();
        let mut det = Detector::builtin();
        let orion = det.library().get("Orion").unwrap().points.clone();
        let res = det.detect_points(orion, ImageSource::Sample, Some("Orion"));
        assert!(res.is_success());
        assert_eq!(res.constellation(), Some("Orion"));
        assert_eq!(res.lines.len(), 10);
        // 9 named stars, ceil(0.8 * 9) = 8 reported, brightest first
        assert_eq!(res.matched_stars.len(), 8);
        assert_eq!(res.matched_stars[0].name, "Betelgeuse");
        assert!(res.matched_stars.iter().all(|m| m.distance < 1e-9));
        assert!(res.matched_stars[0].description.contains("blue-white"));
    }

    #[test]
    fn test_too_few_points() {
        let mut det = Detector::builtin();
        let one = PointSet::new(vec![Point::new(1.0, 1.0, 1.0)]);
        let res = det.detect_points(one, ImageSource::Sample, None);
        assert_eq!(res.match_result.status, MatchStatus::TooFew);
        assert!(res.matched_stars.is_empty());

        let stacked = PointSet::new(vec![Point::new(1.0, 1.0, 1.0), Point::new(1.0, 1.0, 0.5)]);
        let res = det.detect_points(stacked, ImageSource::Sample, None);
        assert_eq!(res.match_result.status, MatchStatus::TooFew);
    }

    #[test]
    fn test_detect_sample_reference() {
        init_logging();
        let mut det = Detector::builtin();
        let mut rng = StdRng::seed_from_u64(42);
        let res = det.detect_reference("images/Orion.png", false, &mut rng);
        assert_eq!(res.source, ImageSource::Sample);
        assert_eq!(res.origin, Some(PointOrigin::Template("Orion".into())));
        assert_eq!(res.points.len(), 9);
        assert_eq!(res.points[0].name.as_deref(), Some("Betelgeuse"));
        assert_eq!(res.constellation(), Some("Orion"));
        assert!(res.match_result.confidence_score.unwrap() <= 98);
    }

    #[test]
    fn test_uploaded_reference_bounds() {
        let lib = TemplateLibrary::builtin();
        let mut det = Detector::new(
            lib,
            DetectorConfig::default(),
            DampedConfidence::new(StdRng::seed_from_u64(9)),
        );
        let mut rng = StdRng::seed_from_u64(10);
        for reference in ["uploads/Leo.png", "IMG_2231.jpg", "my_vela_shot.jpeg"] {
            let res = det.detect_reference(reference, true, &mut rng);
            assert_eq!(res.source, ImageSource::Uploaded);
            if res.is_success() {
                assert!(res.match_result.confidence_score.unwrap() <= 90);
                let total = res.match_result.total_stars.unwrap();
                let shown = res.match_result.matched_stars.unwrap();
                assert!(shown <= total);
                assert!(res.matched_stars.len() <= (total as f64 * 0.6).ceil() as usize);
            }
        }
    }

    #[test]
    fn test_matched_star_details_threshold() {
        let lib = TemplateLibrary::builtin();
        let leo = lib.get("Leo").unwrap();
        let cfg = DetectorConfig::default();
        // Shift every normalized point by 0.09: inside the sample radius
        // (0.1) but outside the uploaded one (0.075).
        let shifted = PointSet::new(
            leo.normalized
                .iter()
                .map(|p| Point::new(p.x + 0.09, p.y, p.brightness))
                .collect(),
        );
        let sample = matched_star_details(leo, &shifted, ImageSource::Sample, &cfg);
        assert_eq!(sample.len(), 5); // ceil(0.8 * 6)
        let uploaded = matched_star_details(leo, &shifted, ImageSource::Uploaded, &cfg);
        assert!(uploaded.is_empty());
    }
}
