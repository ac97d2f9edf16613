use std::cmp::Ordering;

use tagwise_core::{Correction, MatchType};

/// Tests a stored rule against a live description. Only case is folded on
/// the description; its digits are kept.
pub fn is_match(rule: &Correction, description: &str) -> bool {
    matches_uppercased(rule, &description.to_uppercase())
}

fn matches_uppercased(rule: &Correction, text: &str) -> bool {
    match rule.match_type {
        MatchType::Exact => text == rule.pattern,
        MatchType::Contains => text.contains(rule.pattern.as_str()),
    }
}

/// Picks the rule that applies to `description`, if any.
///
/// Candidates must match and have `confidence >= min_confidence`. Among
/// those, an exact rule beats a contains rule, then higher confidence wins,
/// then the most recently updated rule.
pub fn find_match<'a>(
    candidates: &'a [Correction],
    description: &str,
    min_confidence: f64,
) -> Option<&'a Correction> {
    let text = description.to_uppercase();
    best_match(candidates, &text, min_confidence)
}

/// Returns indices + winning rules for every description that matched, in
/// input order.
pub fn match_all<'a, S: AsRef<str>>(
    candidates: &'a [Correction],
    descriptions: &[S],
    min_confidence: f64,
) -> Vec<(usize, &'a Correction)> {
    descriptions
        .iter()
        .enumerate()
        .filter_map(|(idx, desc)| {
            let text = desc.as_ref().to_uppercase();
            best_match(candidates, &text, min_confidence).map(|c| (idx, c))
        })
        .collect()
}

fn best_match<'a>(
    candidates: &'a [Correction],
    text: &str,
    min_confidence: f64,
) -> Option<&'a Correction> {
    candidates
        .iter()
        .filter(|c| c.confidence >= min_confidence && matches_uppercased(c, text))
        .max_by(|a, b| precedence(a, b))
}

fn specificity(match_type: MatchType) -> u8 {
    match match_type {
        MatchType::Exact => 1,
        MatchType::Contains => 0,
    }
}

// Greater means preferred. The trailing created_at/id keys only make the
// choice deterministic when everything else ties.
fn precedence(a: &Correction, b: &Correction) -> Ordering {
    specificity(a.match_type)
        .cmp(&specificity(b.match_type))
        .then(a.confidence.total_cmp(&b.confidence))
        .then(a.updated_at.cmp(&b.updated_at))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}
