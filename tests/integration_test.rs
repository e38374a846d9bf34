//! Integration tests: normalize and match synthetic star patterns against
//! small hand-built libraries and the built-in constellations.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use stellar::catalogs::parse_catalog;
use stellar::matcher::similarity::match_threshold;
use stellar::{
    normalize, similarity, Assignment, ConfidenceInputs, ConfidenceModel, DampedConfidence,
    DetectorConfig, Detector, DeterministicConfidence, ImageSource, MatchConfig, MatchQuery,
    MatchStatus, Point, PointSet, SuspectPolicy, Template, TemplateLibrary,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
}

fn ranked(coords: &[(f64, f64)]) -> Vec<Point> {
    coords
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| Point::new(x, y, 1.0 - i as f64 * 0.1))
        .collect()
}

/// Rotate by `theta`, scale by `s`, then translate by (tx, ty).
fn transform(points: &PointSet, theta: f64, s: f64, tx: f64, ty: f64) -> PointSet {
    let (sin, cos) = theta.sin_cos();
    PointSet::new(
        points
            .iter()
            .map(|p| {
                Point::new(
                    s * (cos * p.x - sin * p.y) + tx,
                    s * (sin * p.x + cos * p.y) + ty,
                    p.brightness,
                )
            })
            .collect(),
    )
}

// ── Concrete scenarios ──────────────────────────────────────────────────────

#[test]
fn test_orion_triangle_scenario() {
    init_logging();
    let orion = Template::new(
        "Orion",
        vec![
            Point::new(0.0, 0.0, 1.0),
            Point::new(10.0, 0.0, 0.9),
            Point::new(5.0, 8.0, 0.8),
        ],
        &[],
    );
    let library = TemplateLibrary::from_templates(vec![orion.clone()]);

    // Shifted by (+100, +50) and scaled x2.
    let test = PointSet::new(vec![
        Point::new(100.0, 50.0, 1.0),
        Point::new(120.0, 50.0, 0.9),
        Point::new(110.0, 66.0, 0.8),
    ]);
    let normalized = normalize(&test);
    for (a, b) in normalized.iter().zip(orion.normalized.iter()) {
        assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
    }

    let cfg = MatchConfig::default();
    let sim = similarity(&normalized, &orion.normalized, 3, &cfg);
    assert_eq!(sim.match_count, 3);
    assert_eq!(sim.match_ratio, 1.0);

    let result = library.select_best_match(
        &normalized,
        MatchQuery::default(),
        &cfg,
        &mut DeterministicConfidence::default(),
    );
    assert_eq!(result.status, MatchStatus::MatchFound);
    assert_eq!(result.constellation.as_deref(), Some("Orion"));
    assert!(result.match_count.unwrap() > 2);
    assert_eq!(result.total_stars, Some(3));
    assert_eq!(result.matched_stars, Some(3));
}

#[test]
fn test_empty_test_set_is_structured_failure() {
    let library = TemplateLibrary::builtin();
    let cfg = MatchConfig::default();
    let empty = PointSet::default();

    for t in library.iter() {
        let sim = similarity(&empty, &t.normalized, t.star_count(), &cfg);
        assert_eq!(sim.match_count, 0);
        assert_eq!(sim.error, 1e10);
    }

    let result = library.select_best_match(
        &empty,
        MatchQuery::default(),
        &cfg,
        &mut DeterministicConfidence::default(),
    );
    assert!(!result.is_success());
    assert_eq!(result.status, MatchStatus::NoMatch);
    assert!(result.constellation.is_none());
    assert!(result.confidence_score.is_none());
}

#[test]
fn test_exact_match_beats_non_matching_template() {
    let shape = ranked(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0), (2.0, -6.0)]);
    let elsewhere = ranked(&[(0.0, 0.0), (10.0, 0.0), (-30.0, 40.0), (60.0, 60.0)]);
    // Identical star count, only the shape differs.
    let library = TemplateLibrary::from_templates(vec![
        Template::new("Elsewhere", elsewhere, &[]),
        Template::new("Shape", shape.clone(), &[]),
    ]);
    let test = transform(&PointSet::new(shape), 1.2, 3.0, -40.0, 17.0);

    let result = library.select_best_match(
        &normalize(&test),
        MatchQuery::default(),
        &MatchConfig::default(),
        &mut DeterministicConfidence::default(),
    );
    assert_eq!(result.constellation.as_deref(), Some("Shape"));
    let elsewhere_score = &result.candidates[0];
    assert!(elsewhere_score.match_count <= 2);
}

#[test]
fn test_suspect_scores_excluded_on_request() {
    let shape = ranked(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)]);
    let library = TemplateLibrary::from_templates(vec![Template::new("Shape", shape.clone(), &[])]);
    let test = normalize(&PointSet::new(shape));

    let strict = MatchConfig {
        suspect_policy: SuspectPolicy::Exclude,
        ..Default::default()
    };
    let result = library.select_best_match(
        &test,
        MatchQuery::default(),
        &strict,
        &mut DeterministicConfidence::default(),
    );
    // An exact copy scores far beyond the plausibility ceiling.
    assert!(result.candidates[0].suspect);
    assert_eq!(result.status, MatchStatus::NoMatch);
}

// ── Properties ──────────────────────────────────────────────────────────────

#[test]
fn test_normalization_invariant_under_similarity_transforms() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..200 {
        let n = rng.random_range(3..12);
        let mut pts: Vec<Point> = (0..n)
            .map(|i| {
                Point::new(
                    rng.random_range(0.0..600.0),
                    rng.random_range(0.0..400.0),
                    1.0 - i as f64 * 0.05,
                )
            })
            .collect();
        // Keep the reference well away from the anchor so rounding is the
        // only source of disagreement.
        pts[1].x = pts[0].x + rng.random_range(50.0..150.0);
        let base = PointSet::new(pts);

        let theta = rng.random_range(-3.1..3.1);
        let scale = rng.random_range(0.2..5.0);
        let moved = transform(&base, theta, scale, rng.random_range(-500.0..500.0), 3.0);

        let a = normalize(&base);
        let b = normalize(&moved);
        assert_eq!((a[0].x, a[0].y), (0.0, 0.0));
        assert_eq!((a[1].x, a[1].y), (1.0, 0.0));
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert!((pa.x - pb.x).abs() <= 0.0101, "{} vs {}", pa.x, pb.x);
            assert!((pa.y - pb.y).abs() <= 0.0101, "{} vs {}", pa.y, pb.y);
        }
    }
}

#[test]
fn test_every_builtin_template_self_matches() {
    let cfg = MatchConfig::default();
    for t in TemplateLibrary::builtin().iter() {
        let sim = similarity(&t.normalized, &t.normalized, t.star_count(), &cfg);
        assert_eq!(sim.match_count as usize, t.star_count(), "{}", t.name);
        assert_eq!(sim.match_ratio, 1.0);
        assert!(sim.error > 0.0);
    }
}

#[test]
fn test_threshold_never_decreases() {
    let cfg = MatchConfig::default();
    let thresholds: Vec<f64> = (0..50).map(|n| match_threshold(n, &cfg)).collect();
    assert!(thresholds.windows(2).all(|w| w[0] <= w[1]));
    assert!(thresholds.iter().all(|&t| t <= 0.1));
}

#[test]
fn test_confidence_bounded_for_all_inputs() {
    let mut model = DampedConfidence::new(StdRng::seed_from_u64(99));
    let mut rng = StdRng::seed_from_u64(100);
    for _ in 0..2000 {
        let source = if rng.random_bool(0.5) {
            ImageSource::Sample
        } else {
            ImageSource::Uploaded
        };
        let inputs = ConfidenceInputs {
            match_ratio: rng.random_range(0.0..=1.0),
            match_count: rng.random_range(0..40),
            template_size: rng.random_range(0..40),
            source,
        };
        let c = model.confidence(&inputs);
        match source {
            ImageSource::Sample => assert!(c <= 98),
            ImageSource::Uploaded => assert!(c <= 90),
        }
    }
}

#[test]
fn test_hinted_orion_with_gaussian_jitter() {
    init_logging();
    let library = TemplateLibrary::builtin();
    let orion = library.get("Orion").unwrap();
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let mut model = DampedConfidence::new(StdRng::seed_from_u64(8));

    for _ in 0..25 {
        let jittered = PointSet::new(
            orion
                .points
                .iter()
                .map(|p| Point {
                    x: p.x + noise.sample(&mut rng),
                    y: p.y + noise.sample(&mut rng),
                    ..p.clone()
                })
                .collect(),
        );
        let result = library.select_best_match(
            &normalize(&jittered),
            MatchQuery {
                hint: Some("Orion"),
                source: ImageSource::Sample,
            },
            &MatchConfig::default(),
            &mut model,
        );
        assert_eq!(result.constellation.as_deref(), Some("Orion"));
        assert_eq!(result.match_count, Some(9));
        assert!(result.confidence_score.unwrap() <= 98);
    }
}

#[test]
fn test_one_to_one_assignment_limits_reuse() {
    // Four test points, two of them crowding the same template star.
    let template = Template::new(
        "Pair",
        ranked(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0), (0.0, 8.0)]),
        &[],
    );
    let library = TemplateLibrary::from_templates(vec![template]);
    let test = normalize(&PointSet::new(ranked(&[
        (0.0, 0.0),
        (10.0, 0.0),
        (5.0, 8.0),
        (5.2, 8.1),
    ])));

    let reuse = library.score_candidates(&test, None, &MatchConfig::default());
    assert_eq!(reuse[0].match_count, 4);

    let strict = MatchConfig {
        assignment: Assignment::OneToOne,
        ..Default::default()
    };
    let unique = library.score_candidates(&test, None, &strict);
    assert_eq!(unique[0].match_count, 3);
}

// ── Catalogs and detection ──────────────────────────────────────────────────

#[test]
fn test_text_catalog_to_detection() {
    let catalog = "\
# a kite and a line
star|Kite|K1|0|0|1.0
star|Kite|K2|40|0|0.9
star|Kite|K3|20|30|0.8
star|Kite|K4|20|-15|0.7
line|Kite|0|2
line|Kite|2|1
line|Kite|1|3
line|Kite|3|0
star|Line|L1|0|0|1.0
star|Line|L2|10|0|0.9
star|Line|L3|20|0|0.8
star|Line|L4|30|0|0.7
";
    let records = parse_catalog(catalog).unwrap();
    let library = TemplateLibrary::from_records(&records);
    assert_eq!(library.names().collect::<Vec<_>>(), vec!["Kite", "Line"]);

    let kite = library.get("Kite").unwrap().points.clone();
    let moved = transform(&kite, -0.4, 1.7, 250.0, 120.0);
    let mut detector = Detector::new(library, DetectorConfig::default(), DeterministicConfidence::default());
    let res = detector.detect_points(moved, ImageSource::Sample, None);
    assert!(res.is_success());
    assert_eq!(res.constellation(), Some("Kite"));
    // Unnamed detected points: no template line survives, so a chain is drawn.
    assert_eq!(res.lines.len(), 3);
    assert_eq!(res.matched_stars.len(), 4);
}

#[test]
fn test_library_file_roundtrip() {
    let library = TemplateLibrary::builtin();
    let path = std::env::temp_dir().join(format!("stellar_lib_{}.rkyv", std::process::id()));
    library.save_to_file(&path).unwrap();
    let loaded = TemplateLibrary::load_from_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.len(), library.len());
    for (a, b) in loaded.iter().zip(library.iter()) {
        assert_eq!(a, b);
    }
}

#[test]
fn test_builtin_detector_on_sample_references() {
    init_logging();
    let mut detector = Detector::builtin();
    let mut rng = StdRng::seed_from_u64(31);
    let names = [
        "CanisMajor",
        "Capricornus",
        "Cetus",
        "Orion",
        "Pisces",
        "Puppis",
        "UrsaMinor",
        "Vela",
    ];
    for _ in 0..10 {
        for name in names {
            let reference = format!("images/{name}.png");
            let res = detector.detect_reference(&reference, false, &mut rng);
            let template = detector.library().get(name).unwrap();
            assert_eq!(res.source, ImageSource::Sample);
            assert_eq!(res.points.len(), template.star_count());
            assert_eq!(res.points[0].name, template.points[0].name);
            assert_eq!(res.points[1].name, template.points[1].name);

            assert_eq!(res.constellation(), Some(name));
            assert!(res.match_result.confidence_score.unwrap() <= 98);
            assert!(res.match_result.matched_stars.unwrap() <= res.match_result.total_stars.unwrap());
            assert!(!res.lines.is_empty());
        }
    }
}
