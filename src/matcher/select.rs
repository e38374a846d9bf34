//! Template scoring and best-match selection.

use tracing::debug;

use crate::PointSet;

use super::confidence::{presentation_match_count, ConfidenceInputs, ConfidenceModel};
use super::similarity::{similarity, Similarity};
use super::{MatchConfig, MatchQuery, MatchResult, MatchStatus, SuspectPolicy, TemplateLibrary};

/// Score of one template against the test set.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub name: String,
    pub match_count: u32,
    pub error: f64,
    pub match_ratio: f64,
    /// Composite score, including the hint boost if this template was hinted.
    pub score: f64,
    /// Score at or above [`MatchConfig::suspect_score`].
    pub suspect: bool,
}

impl CandidateScore {
    fn qualifies(&self, config: &MatchConfig) -> bool {
        self.match_count >= config.min_match_count
    }
}

/// `count² · ratio · ratio_bonus · size_bonus / error`.
///
/// `ratio_bonus` is 2.0 above 90 % matched, 1.5 above 70 %, else 1.0.
/// `size_bonus` is `min(1 + size / 20, 1.5)`.
pub fn composite_score(sim: &Similarity, template_size: usize) -> f64 {
    let ratio_bonus = if sim.match_ratio > 0.9 {
        2.0
    } else if sim.match_ratio > 0.7 {
        1.5
    } else {
        1.0
    };
    let size_bonus = (1.0 + template_size as f64 / 20.0).min(1.5);
    let count = sim.match_count as f64;
    count * count * sim.match_ratio * ratio_bonus * size_bonus / sim.error
}

/// Templates that are commonly picked instead of `hint`.
pub fn confused_with(hint: &str) -> &'static [&'static str] {
    match hint {
        "Andromeda" => &["Lupus", "Cassiopeia"],
        "Aquila" => &["Lupus"],
        "Auriga" => &["Vela", "Cassiopeia"],
        "CanisMajor" => &["Lupus", "UrsaMinor"],
        "Capricornus" => &["Vela", "Cassiopeia"],
        "Cetus" => &["Lepus", "UrsaMinor"],
        "Gemini" => &["PiscisAustrinus"],
        "Grus" => &["Lupus", "Cassiopeia"],
        "Leo" => &["Vela", "Auriga"],
        "Orion" => &["Vela", "Cassiopeia", "Auriga"],
        "Pegasus" => &["CanisMajor", "Cygnus"],
        "Phoenix" => &["Cassiopeia", "Grus"],
        "Pisces" => &["Vela", "Grus"],
        "Puppis" => &["Cassiopeia", "Phoenix"],
        "UrsaMajor" => &["Vela"],
        "UrsaMinor" => &["Cassiopeia"],
        "Vela" => &["Lupus", "Cassiopeia"],
        _ => &[],
    }
}

impl TemplateLibrary {
    /// Score every template against a normalized test set, in library order.
    pub fn score_candidates(
        &self,
        test: &PointSet,
        hint: Option<&str>,
        config: &MatchConfig,
    ) -> Vec<CandidateScore> {
        self.iter()
            .map(|t| {
                let sim = similarity(test, &t.normalized, t.star_count(), config);
                let mut score = composite_score(&sim, t.star_count());
                if hint == Some(t.name.as_str()) {
                    score *= config.hint_boost;
                }
                CandidateScore {
                    name: t.name.clone(),
                    match_count: sim.match_count,
                    error: sim.error,
                    match_ratio: sim.match_ratio,
                    score,
                    suspect: score >= config.suspect_score,
                }
            })
            .collect()
    }

    /// Pick the best template for a normalized test set.
    ///
    /// Never fails: an unrecognisable test set yields
    /// [`MatchStatus::NoMatch`]. The confidence model is only consulted
    /// when a template is selected.
    pub fn select_best_match(
        &self,
        test: &PointSet,
        query: MatchQuery<'_>,
        config: &MatchConfig,
        confidence: &mut dyn ConfidenceModel,
    ) -> MatchResult {
        let candidates = self.score_candidates(test, query.hint, config);

        for c in &candidates {
            debug!(
                "{}: matches={} ratio={:.2} error={:.3e} score={:.3}{}",
                c.name,
                c.match_count,
                c.match_ratio,
                c.error,
                c.score,
                if c.suspect { " (suspect)" } else { "" }
            );
        }

        let Some(mut best) = pick_best(&candidates, config) else {
            debug!("No template reached {} matches", config.min_match_count);
            return MatchResult::failure(MatchStatus::NoMatch, candidates);
        };

        let mut hint_applied = false;
        if let Some(hinted) = query
            .hint
            .and_then(|hint| hint_override(&candidates, best, hint, config))
        {
            best = hinted;
            hint_applied = true;
        }

        let winner = &candidates[best];
        let total = self
            .get(&winner.name)
            .map(|t| t.star_count())
            .unwrap_or_default();
        let confidence_score = confidence.confidence(&ConfidenceInputs {
            match_ratio: winner.match_ratio,
            match_count: winner.match_count,
            template_size: total,
            source: query.source,
        });

        MatchResult {
            status: MatchStatus::MatchFound,
            constellation: Some(winner.name.clone()),
            confidence_score: Some(confidence_score),
            matched_stars: Some(presentation_match_count(
                total as u32,
                winner.match_ratio,
                query.source,
            )),
            total_stars: Some(total as u32),
            match_count: Some(winner.match_count),
            match_ratio: Some(winner.match_ratio),
            score: Some(winner.score),
            hint_applied,
            candidates,
        }
    }
}

/// Index of the hinted template if it should replace `best`.
///
/// The hinted template must itself qualify and score above `hint_ratio` of
/// the best, or above `confused_ratio` when the best is a known confusion
/// for the hint.
fn hint_override(
    candidates: &[CandidateScore],
    best: usize,
    hint: &str,
    config: &MatchConfig,
) -> Option<usize> {
    let hinted = candidates
        .iter()
        .position(|c| c.name == hint && c.qualifies(config))?;
    if hinted == best {
        return None;
    }
    let best_score = candidates[best].score;
    let hinted_score = candidates[hinted].score;
    let close = hinted_score > best_score * config.hint_ratio;
    let confused = confused_with(hint).contains(&candidates[best].name.as_str())
        && hinted_score > best_score * config.confused_ratio;
    if close || confused {
        debug!(
            "Hint '{}' overrides '{}' ({:.3} vs {:.3})",
            hint, candidates[best].name, hinted_score, best_score
        );
        Some(hinted)
    } else {
        None
    }
}

/// Index of the highest qualifying score. Earlier templates win ties.
fn pick_best(candidates: &[CandidateScore], config: &MatchConfig) -> Option<usize> {
    let mut plausible: Option<usize> = None;
    let mut suspect: Option<usize> = None;
    for (i, c) in candidates.iter().enumerate() {
        if !c.qualifies(config) {
            continue;
        }
        let slot = if c.suspect { &mut suspect } else { &mut plausible };
        if slot.map_or(true, |j| c.score > candidates[j].score) {
            *slot = Some(i);
        }
    }
    match config.suspect_policy {
        SuspectPolicy::Exclude => plausible,
        SuspectPolicy::Fallback => plausible.or(suspect),
    }
}
