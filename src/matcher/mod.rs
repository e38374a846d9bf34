//! Point-pattern matcher: identify which constellation template a set of
//! detected stars most resembles.
//!
//! The pipeline is stateless and runs once per request:
//!
//! 1. **Normalization**: the detected set is mapped into a canonical frame
//!    (anchor at the origin, reference at (1, 0)).
//! 2. **Similarity**: the normalized set is compared against every template's
//!    normalized points with a greedy nearest-neighbour pairing.
//! 3. **Selection**: each template gets a composite score; the best
//!    plausible candidate wins, optionally biased toward a trusted hint.
//! 4. **Confidence**: a bounded, presentation-only percentage is synthesized
//!    through a swappable [`ConfidenceModel`].

pub mod confidence;
pub mod library;
pub mod normalize;
pub mod select;
pub mod similarity;

pub use confidence::{
    ConfidenceConfig, ConfidenceInputs, ConfidenceModel, DampedConfidence,
    DeterministicConfidence,
};
pub use library::{Template, TemplateLibrary};
pub use normalize::normalize;
pub use select::CandidateScore;
pub use similarity::{similarity, Similarity};

// ── Status codes ────────────────────────────────────────────────────────────

/// Outcome of a match attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// A template was selected.
    MatchFound,
    /// No template reached the minimum match count.
    NoMatch,
    /// Too few points to normalize (fewer than 2, or anchor == reference).
    TooFew,
}

/// Where the detected points came from. Uploaded input is scored more
/// conservatively than the bundled samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSource {
    #[default]
    Sample,
    Uploaded,
}

impl ImageSource {
    pub fn is_uploaded(self) -> bool {
        self == ImageSource::Uploaded
    }
}

/// How greedy pairing consumes points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assignment {
    /// Each test point pairs at most once; template points may be reused.
    #[default]
    TestUnique,
    /// Both test and template points pair at most once.
    OneToOne,
}

/// What to do when every qualifying template scores at or above
/// [`MatchConfig::suspect_score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuspectPolicy {
    /// Suspect scores never win. If nothing else qualifies the result is
    /// [`MatchStatus::NoMatch`].
    Exclude,
    /// Suspect scores rank below every plausible score but may still win
    /// when no plausible candidate exists.
    #[default]
    Fallback,
}

// ── Configuration for matching ──────────────────────────────────────────────

/// Parameters controlling similarity and template selection.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Pairing threshold for an empty template. Default 0.05.
    pub threshold_base: f64,
    /// Threshold increase per template star. Default 0.01.
    pub threshold_per_star: f64,
    /// Upper bound on the pairing threshold. Default 0.1.
    pub threshold_cap: f64,
    /// Error reported when either set is empty. Default 1e10.
    pub empty_error: f64,
    /// Initial value of the matched-distance sum. Keeps the error strictly
    /// positive. Default 1e-10.
    pub error_seed: f64,
    /// Minimum matched points for a template to be a candidate. Default 3.
    pub min_match_count: u32,
    /// Scores at or above this are treated as implausible. Default 1000.
    pub suspect_score: f64,
    /// Handling of implausible scores. Default [`SuspectPolicy::Fallback`].
    pub suspect_policy: SuspectPolicy,
    /// Score multiplier for the hinted template. Default 1.5.
    pub hint_boost: f64,
    /// The hinted template replaces the best if its score exceeds this
    /// fraction of the best score. Default 0.8.
    pub hint_ratio: f64,
    /// Lenient fraction used when the best template is a known confusion
    /// for the hinted one. Default 0.7.
    pub confused_ratio: f64,
    /// Point consumption mode. Default [`Assignment::TestUnique`].
    pub assignment: Assignment,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold_base: 0.05,
            threshold_per_star: 0.01,
            threshold_cap: 0.1,
            empty_error: 1e10,
            error_seed: 1e-10,
            min_match_count: 3,
            suspect_score: 1000.0,
            suspect_policy: SuspectPolicy::Fallback,
            hint_boost: 1.5,
            hint_ratio: 0.8,
            confused_ratio: 0.7,
            assignment: Assignment::TestUnique,
        }
    }
}

/// Per-request inputs to template selection besides the points themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchQuery<'a> {
    /// Trusted label (e.g. derived from a file name) to bias selection toward.
    pub hint: Option<&'a str>,
    /// Origin of the detected points.
    pub source: ImageSource,
}

// ── Match result ────────────────────────────────────────────────────────────

/// Result of a match attempt.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Outcome status.
    pub status: MatchStatus,
    /// Name of the selected template.
    pub constellation: Option<String>,
    /// Presentation confidence percentage, bounded by source.
    pub confidence_score: Option<u8>,
    /// Presentation match count shown to users (at least 3, at most
    /// `total_stars`).
    pub matched_stars: Option<u32>,
    /// Star count of the selected template.
    pub total_stars: Option<u32>,
    /// Raw greedy match count for the selected template.
    pub match_count: Option<u32>,
    /// Raw match ratio for the selected template.
    pub match_ratio: Option<f64>,
    /// Composite score of the selected template.
    pub score: Option<f64>,
    /// Whether a hint override changed the nominal best.
    pub hint_applied: bool,
    /// Scores of every template, in library order.
    pub candidates: Vec<CandidateScore>,
}

impl MatchResult {
    /// Create a failure result with the given status.
    pub(crate) fn failure(status: MatchStatus, candidates: Vec<CandidateScore>) -> Self {
        Self {
            status,
            constellation: None,
            confidence_score: None,
            matched_stars: None,
            total_stars: None,
            match_count: None,
            match_ratio: None,
            score: None,
            hint_applied: false,
            candidates,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == MatchStatus::MatchFound
    }
}
