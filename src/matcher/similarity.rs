//! Greedy nearest-neighbour similarity between two normalized point sets.
//!
//! All template/test pairs are ranked by distance and consumed greedily.
//! In the default [`Assignment::TestUnique`] mode only test points are
//! consumed, so a single template point may pair with several test points.
//! [`Assignment::OneToOne`] additionally consumes template points.

use crate::PointSet;

use super::{Assignment, MatchConfig};

/// Outcome of comparing one test set against one template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    /// Number of test points paired within the threshold.
    pub match_count: u32,
    /// Adjusted error; always > 0. Lower is better.
    pub error: f64,
    /// `match_count / template_size`, clamped to [0, 1].
    pub match_ratio: f64,
}

impl Similarity {
    /// Sentinel for an empty test or template set.
    pub fn no_match(config: &MatchConfig) -> Self {
        Self {
            match_count: 0,
            error: config.empty_error,
            match_ratio: 0.0,
        }
    }
}

/// Pairing tolerance for a template of `template_size` stars.
///
/// `min(cap, base + per_star * template_size)`: larger templates get a
/// looser tolerance, never above the cap.
pub fn match_threshold(template_size: usize, config: &MatchConfig) -> f64 {
    (config.threshold_base + config.threshold_per_star * template_size as f64)
        .min(config.threshold_cap)
}

/// Compare a normalized test set against a normalized template.
///
/// `template_size` is the template's nominal star count (normally
/// `template.len()`). Never fails: empty inputs yield [`Similarity::no_match`].
pub fn similarity(
    test: &PointSet,
    template: &PointSet,
    template_size: usize,
    config: &MatchConfig,
) -> Similarity {
    if test.is_empty() || template.is_empty() {
        return Similarity::no_match(config);
    }

    // Full cross product: (distance, template_idx, test_idx).
    let mut candidates: Vec<(f64, usize, usize)> =
        Vec::with_capacity(template.len() * test.len());
    for (ti, tp) in template.iter().enumerate() {
        for (si, sp) in test.iter().enumerate() {
            candidates.push((tp.distance(sp), ti, si));
        }
    }

    // Stable, so equal distances keep template-major order.
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    let threshold = match_threshold(template_size, config);

    let mut used_test = vec![false; test.len()];
    let mut used_template = vec![false; template.len()];
    let mut match_count = 0u32;
    let mut error_sum = config.error_seed;

    for &(dist, ti, si) in &candidates {
        // A NaN coordinate never pairs.
        if dist.is_nan() {
            continue;
        }
        // Sorted ascending: nothing further can be within threshold.
        if dist >= threshold {
            break;
        }
        if used_test[si] {
            continue;
        }
        if config.assignment == Assignment::OneToOne && used_template[ti] {
            continue;
        }
        used_test[si] = true;
        used_template[ti] = true;
        match_count += 1;
        error_sum += dist;
    }

    let match_ratio = if template_size > 0 {
        (match_count as f64 / template_size as f64).min(1.0)
    } else {
        0.0
    };

    let n_template = template.len() as f64;
    let n_test = test.len() as f64;
    let size_diff_penalty = (n_template - n_test).abs() / n_template.max(n_test);

    Similarity {
        match_count,
        error: error_sum * (1.0 + size_diff_penalty) / (1.0 + match_ratio),
        match_ratio,
    }
}
