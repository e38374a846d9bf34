//! Presentation confidence for a selected template.
//!
//! The percentage shown to users is a heuristic: the match ratio plus
//! bonuses for absolute match count and template size, damped by a factor
//! that depends on where the input came from, then clamped to a
//! source-dependent ceiling. It is not a calibrated probability.
//!
//! The damping step is isolated behind [`ConfidenceModel`] so the noisy
//! variant ([`DampedConfidence`]) can be swapped for a reproducible one
//! ([`DeterministicConfidence`]).

use rand::Rng;

use super::ImageSource;

/// Constants for confidence synthesis.
#[derive(Debug, Clone)]
pub struct ConfidenceConfig {
    /// Bonus points per matched star. Default 2.
    pub match_count_bonus: f64,
    /// Cap on the match-count bonus. Default 20.
    pub match_count_bonus_cap: f64,
    /// Cap on the template-size (distinctiveness) bonus. Default 15.
    pub distinctiveness_cap: f64,
    /// Damping range `[lo, hi)` for sample input. Default [0.9, 1.0).
    pub sample_damping: (f64, f64),
    /// Damping range `[lo, hi)` for uploaded input. Default [0.8, 0.9).
    pub uploaded_damping: (f64, f64),
    /// Ceiling for sample input. Default 98.
    pub sample_ceiling: u8,
    /// Ceiling for uploaded input. Default 90.
    pub uploaded_ceiling: u8,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            match_count_bonus: 2.0,
            match_count_bonus_cap: 20.0,
            distinctiveness_cap: 15.0,
            sample_damping: (0.9, 1.0),
            uploaded_damping: (0.8, 0.9),
            sample_ceiling: 98,
            uploaded_ceiling: 90,
        }
    }
}

impl ConfidenceConfig {
    pub fn damping_range(&self, source: ImageSource) -> (f64, f64) {
        match source {
            ImageSource::Sample => self.sample_damping,
            ImageSource::Uploaded => self.uploaded_damping,
        }
    }

    pub fn ceiling(&self, source: ImageSource) -> u8 {
        match source {
            ImageSource::Sample => self.sample_ceiling,
            ImageSource::Uploaded => self.uploaded_ceiling,
        }
    }
}

/// What the confidence heuristic sees of a selected template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
    pub match_ratio: f64,
    pub match_count: u32,
    /// Star count of the selected template.
    pub template_size: usize,
    pub source: ImageSource,
}

/// Turns match statistics into a bounded percentage.
pub trait ConfidenceModel {
    /// Confidence in `[0, ceiling(source)]`.
    fn confidence(&mut self, inputs: &ConfidenceInputs) -> u8;
}

/// Undamped score: `ratio * 100 + min(cap, count * bonus) + min(cap, size)`.
pub fn raw_confidence(inputs: &ConfidenceInputs, config: &ConfidenceConfig) -> f64 {
    let base = inputs.match_ratio * 100.0;
    let count_bonus =
        (inputs.match_count as f64 * config.match_count_bonus).min(config.match_count_bonus_cap);
    let size_bonus = (inputs.template_size as f64).min(config.distinctiveness_cap);
    base + count_bonus + size_bonus
}

/// Apply a damping factor and clamp to the source ceiling.
pub fn damp(inputs: &ConfidenceInputs, config: &ConfidenceConfig, factor: f64) -> u8 {
    let ceiling = config.ceiling(inputs.source) as f64;
    let value = (raw_confidence(inputs, config) * factor).round();
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, ceiling) as u8
}

/// Star count shown alongside the confidence.
///
/// `max(3, floor(total * (ratio * 0.95 + 0.05)))` for sample input and
/// `max(3, floor(total * (ratio * 0.9 + 0.1)))` for uploaded input,
/// never more than `total`.
pub fn presentation_match_count(total: u32, match_ratio: f64, source: ImageSource) -> u32 {
    let (scale, offset) = match source {
        ImageSource::Sample => (0.95, 0.05),
        ImageSource::Uploaded => (0.9, 0.1),
    };
    let ratio = match_ratio.clamp(0.0, 1.0);
    let shown = (total as f64 * (ratio * scale + offset)).floor() as u32;
    shown.max(3).min(total)
}

// ── Models ──────────────────────────────────────────────────────────────────

/// Random damping drawn uniformly from the source's range.
#[derive(Debug, Clone)]
pub struct DampedConfidence<R: Rng> {
    rng: R,
    pub config: ConfidenceConfig,
}

impl<R: Rng> DampedConfidence<R> {
    pub fn new(rng: R) -> Self {
        Self::with_config(rng, ConfidenceConfig::default())
    }

    pub fn with_config(rng: R, config: ConfidenceConfig) -> Self {
        Self { rng, config }
    }
}

impl<R: Rng> ConfidenceModel for DampedConfidence<R> {
    fn confidence(&mut self, inputs: &ConfidenceInputs) -> u8 {
        let (lo, hi) = self.config.damping_range(inputs.source);
        let factor = if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            lo
        };
        damp(inputs, &self.config, factor)
    }
}

/// Fixed damping at the midpoint of the source's range.
#[derive(Debug, Clone, Default)]
pub struct DeterministicConfidence {
    pub config: ConfidenceConfig,
}

impl DeterministicConfidence {
    pub fn new(config: ConfidenceConfig) -> Self {
        Self { config }
    }
}

impl ConfidenceModel for DeterministicConfidence {
    fn confidence(&mut self, inputs: &ConfidenceInputs) -> u8 {
        let (lo, hi) = self.config.damping_range(inputs.source);
        damp(inputs, &self.config, 0.5 * (lo + hi))
    }
}
