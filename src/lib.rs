//! # stellar
//!
//! Identify which **constellation** a set of detected stars most resembles.
//!
//! Detected stars are reduced to a brightness-ordered point set, mapped into
//! a canonical frame that removes translation, scale and rotation, and
//! compared against a library of constellation templates with a greedy
//! nearest-neighbour pairing. The best template is reported together with a
//! bounded, presentation-only confidence percentage.
//!
//! ## Features
//!
//! - **Invariant matching**: anchor on the brightest star, scale and rotate
//!   on the second brightest
//! - **Template library**: 20 built-in constellations, a plain-text catalog
//!   format for custom ones, and [rkyv](https://docs.rs/rkyv) persistence
//! - **Hint-aware selection**: a trusted label (e.g. from a file name) can
//!   tip close calls toward the expected template
//! - **Swappable confidence**: the damping heuristic sits behind
//!   [`ConfidenceModel`], with a reproducible implementation
//! - **Mock sources and threshold extraction**: template lookups by name,
//!   and (with the `image` feature) a brightness-threshold scan of real pixels
//! - **History and session state** as injected stores rather than globals
//!
//! ## Example
//!
//! ```
//! use stellar::{
//!     normalize, DeterministicConfidence, ImageSource, MatchConfig, MatchQuery, MatchStatus,
//!     Point, PointSet, Template, TemplateLibrary,
//! };
//!
//! let library = TemplateLibrary::from_templates(vec![Template::new(
//!     "Triangle",
//!     vec![
//!         Point::named(0.0, 0.0, 1.0, "A"),
//!         Point::named(10.0, 0.0, 0.9, "B"),
//!         Point::named(5.0, 8.0, 0.8, "C"),
//!     ],
//!     &[[0, 1], [1, 2], [2, 0]],
//! )]);
//!
//! // Same shape, moved and doubled in size
//! let detected = PointSet::new(vec![
//!     Point::new(100.0, 50.0, 1.0),
//!     Point::new(120.0, 50.0, 0.9),
//!     Point::new(110.0, 66.0, 0.8),
//! ]);
//!
//! let result = library.select_best_match(
//!     &normalize(&detected),
//!     MatchQuery { hint: None, source: ImageSource::Sample },
//!     &MatchConfig::default(),
//!     &mut DeterministicConfidence::default(),
//! );
//! assert_eq!(result.status, MatchStatus::MatchFound);
//! assert_eq!(result.constellation.as_deref(), Some("Triangle"));
//! assert_eq!(result.match_count, Some(3));
//! ```
//!
//! ## Pipeline overview
//!
//! 1. **Points**: from caller data, a mock [`source`], or [`extraction`]
//! 2. **Normalization**: anchor to the origin, reference to (1, 0), round to
//!    2 decimals
//! 3. **Similarity**: greedy pairing of all template/test pairs below an
//!    adaptive threshold
//! 4. **Selection**: composite score with ratio and size bonuses, a ceiling
//!    on implausible scores, and hint overrides
//! 5. **Presentation**: confidence, displayed match count, line figure and
//!    per-star details via [`Detector`]

pub mod catalogs;
pub mod detector;
#[cfg(feature = "image")]
pub mod extraction;
pub mod history;
pub mod lines;
pub mod matcher;
mod point;
pub mod session;
pub mod source;
pub mod star_info;

pub use detector::{DetectionResult, Detector, DetectorConfig, MatchedStar};
#[cfg(feature = "image")]
pub use extraction::{
    extract_points, extract_points_from_image, extract_points_from_rgb, ExtractionConfig,
    ExtractionResult,
};
pub use history::{
    ConstellationPerformance, FileHistory, HistoryConfig, HistoryEntry, HistoryStats,
    HistoryStore, InMemoryHistory, Trend,
};
pub use matcher::{
    normalize, similarity, Assignment, CandidateScore, ConfidenceConfig, ConfidenceInputs,
    ConfidenceModel, DampedConfidence, DeterministicConfidence, ImageSource, MatchConfig,
    MatchQuery, MatchResult, MatchStatus, Similarity, SuspectPolicy, Template, TemplateLibrary,
};
pub use point::*;
pub use session::{CredentialTier, MemoryTier, SessionContext};
pub use source::PerturbationConfig;
