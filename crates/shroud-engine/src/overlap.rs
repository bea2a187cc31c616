//! Score-then-length greedy overlap resolution.
//!
//! Candidates from all layers arrive as one uniform span list. The floor
//! is applied first, then candidates are ranked and kept greedily so that
//! accepted spans are pairwise non-overlapping.

use std::cmp::Ordering;

use shroud_core::EntitySpan;

/// Resolve overlaps among candidates.
///
/// Ranking is `(-score, -length, start, entity tag)`: higher score first,
/// then longer span, then earlier start, then alphabetical entity type for
/// exact same-extent candidates. A candidate is kept only if it overlaps
/// no already-kept span. The result is sorted left-to-right.
///
/// A threshold of 1.0 rejects every candidate, including ones whose
/// boosted score reached exactly 1.0.
pub fn resolve(candidates: Vec<EntitySpan>, score_threshold: f64) -> Vec<EntitySpan> {
    let mut ranked: Vec<EntitySpan> = candidates
        .into_iter()
        .filter(|span| admits(score_threshold, span.score) && !span.is_empty())
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.start.cmp(&b.start))
            .then_with(|| a.entity_type.cmp(&b.entity_type))
    });

    let mut kept: Vec<EntitySpan> = Vec::with_capacity(ranked.len());
    for candidate in ranked {
        if !kept.iter().any(|k| k.overlaps(&candidate)) {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|span| span.start);
    kept
}

/// The floor admits `score >= threshold`, except that 1.0 is a reject-all
/// sentinel (a boosted score can itself be capped at exactly 1.0).
fn admits(threshold: f64, score: f64) -> bool {
    threshold < 1.0 && score >= threshold
}
