//! RedactionEngine: orchestrates the full detection pipeline.
//!
//! One `redact` call runs: prune sessions → pattern + neural candidates →
//! threshold → overlap resolution → per-type validation → optional
//! generative review (merged under the same overlap/validation rules) →
//! placeholder assignment → right-to-left substitution → session record.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use serde::Serialize;
use shroud_core::errors::EngineError;
use shroud_core::traits::{IReviewer, ITagger};
use shroud_core::{DetectionSource, EngineConfig, EntitySpan, EntityType};
use tracing::{debug, warn};

use crate::recognizers::RecognizerRegistry;
use crate::reviewer::OllamaReviewer;
use crate::session::SessionStore;
use crate::{neural, overlap, validate};

/// Fixed confidence assigned to accepted generative-review spans.
const REVIEWER_SCORE: f64 = 0.7;

/// One accepted entity in a redaction result. Offsets refer to the input
/// text; the document layer depends on them.
#[derive(Debug, Clone, Serialize)]
pub struct RedactedEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub original_start: usize,
    pub original_end: usize,
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedactionOutcome {
    pub redacted_text: String,
    pub session_id: String,
    pub entities_found: usize,
    /// Left-to-right list of accepted entities.
    pub entities: Vec<RedactedEntity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnredactionOutcome {
    pub original_text: String,
    pub entities_restored: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
    /// Partial mask of the original substring, never the full value.
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub entities: Vec<AnalyzedEntity>,
}

/// The detection-and-redaction engine.
///
/// Safe to share across threads: the session store and the mutable
/// configuration (registry, threshold, disabled set) are internally locked,
/// and each call is otherwise stateless.
pub struct RedactionEngine {
    registry: RwLock<RecognizerRegistry>,
    sessions: SessionStore,
    tagger: Option<Box<dyn ITagger>>,
    reviewer: Option<Box<dyn IReviewer>>,
    score_threshold: RwLock<f64>,
    disabled: RwLock<HashSet<EntityType>>,
}

impl RedactionEngine {
    /// Engine with built-in recognizers. The generative reviewer is
    /// attached only when the configured endpoint advertises the model.
    pub fn new(config: EngineConfig) -> Self {
        let reviewer: Option<Box<dyn IReviewer>> = if config.use_reviewer {
            let reviewer = OllamaReviewer::new(&config.reviewer);
            if reviewer.is_available() {
                Some(Box::new(reviewer))
            } else {
                debug!("generative reviewer endpoint not available; layer disabled");
                None
            }
        } else {
            None
        };

        Self {
            registry: RwLock::new(RecognizerRegistry::with_builtins()),
            sessions: SessionStore::new(config.session_ttl_secs),
            tagger: None,
            reviewer,
            score_threshold: RwLock::new(config.score_threshold.clamp(0.0, 1.0)),
            disabled: RwLock::new(HashSet::new()),
        }
    }

    /// Attach a zero-shot tagger (layer 2).
    pub fn with_tagger(mut self, tagger: Box<dyn ITagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    /// Attach (or replace) a generative reviewer (layer 3).
    pub fn with_reviewer(mut self, reviewer: Box<dyn IReviewer>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn score_threshold(&self) -> f64 {
        *self.score_threshold.read().expect("threshold lock poisoned")
    }

    pub fn set_score_threshold(&self, value: f64) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(EngineError::InvalidThreshold { value });
        }
        *self.score_threshold.write().expect("threshold lock poisoned") = value;
        Ok(())
    }

    /// Register a runtime pattern; it joins overlap resolution on equal
    /// footing with the built-ins.
    pub fn add_custom_pattern(&self, name: &str, pattern: &str, score: f64) -> Result<(), EngineError> {
        self.registry
            .write()
            .expect("registry lock poisoned")
            .add_custom(name, pattern, score)
    }

    /// Replace the set of disabled entity types. Disabled types are
    /// excluded from detection entirely.
    pub fn set_disabled_entities(&self, tags: &[String]) {
        let disabled = tags.iter().map(|t| EntityType::from_tag(t)).collect();
        *self.disabled.write().expect("disabled lock poisoned") = disabled;
    }

    /// Sorted tags of entity types currently participating in detection.
    pub fn active_entities(&self) -> Vec<String> {
        let disabled = self.disabled.read().expect("disabled lock poisoned");
        self.registry
            .read()
            .expect("registry lock poisoned")
            .supported_entities()
            .into_iter()
            .filter(|tag| !disabled.contains(&EntityType::from_tag(tag)))
            .collect()
    }

    pub fn reviewer_available(&self) -> bool {
        self.reviewer.as_ref().is_some_and(|r| r.is_available())
    }

    /// Redact `text`, optionally restricted to `entity_types`.
    pub fn redact(&self, text: &str, entity_types: Option<&[EntityType]>) -> RedactionOutcome {
        self.sessions.prune_expired();

        let threshold = self.score_threshold();
        let mut accepted = self.detect(text, entity_types, threshold);

        if let Some(reviewer) = &self.reviewer {
            accepted = self.merge_review(reviewer.as_ref(), text, accepted, threshold);
        }

        // Final spans are left-to-right; counters are dense per type in
        // that order.
        let mut counters: HashMap<String, usize> = HashMap::new();
        let mut entities = Vec::with_capacity(accepted.len());
        for span in &accepted {
            let tag = span.entity_type.as_tag().to_string();
            let counter = counters.entry(tag.clone()).or_insert(0);
            *counter += 1;
            entities.push(RedactedEntity {
                placeholder: format!("[{tag}_{counter}]"),
                entity_type: tag,
                original_start: span.start,
                original_end: span.end,
            });
        }

        // Substitute right-to-left so earlier offsets stay valid while the
        // text shrinks or grows.
        let mut redacted_text = text.to_string();
        for (span, entity) in accepted.iter().zip(entities.iter()).rev() {
            redacted_text.replace_range(span.start..span.end, &entity.placeholder);
        }

        let session_id = self.sessions.create();
        for (span, entity) in accepted.iter().zip(entities.iter()) {
            self.sessions
                .add(&session_id, &entity.placeholder, &text[span.start..span.end]);
        }

        RedactionOutcome {
            redacted_text,
            session_id,
            entities_found: entities.len(),
            entities,
        }
    }

    /// Restore placeholders from a previous `redact` call.
    pub fn unredact(
        &self,
        redacted_text: &str,
        session_id: &str,
    ) -> Result<UnredactionOutcome, EngineError> {
        let mappings = self
            .sessions
            .get(session_id)
            .ok_or_else(|| EngineError::SessionMissing {
                session_id: session_id.to_string(),
            })?;

        let mut original_text = redacted_text.to_string();
        let mut entities_restored = 0;
        for (placeholder, original) in &mappings {
            if original_text.contains(placeholder.as_str()) {
                original_text = original_text.replace(placeholder.as_str(), original);
                entities_restored += 1;
            }
        }

        Ok(UnredactionOutcome {
            original_text,
            entities_restored,
        })
    }

    /// Detect without mutating text or creating a session.
    pub fn analyze(&self, text: &str, entity_types: Option<&[EntityType]>) -> AnalysisOutcome {
        let threshold = self.score_threshold();
        let accepted = self.detect(text, entity_types, threshold);
        let entities = accepted
            .iter()
            .map(|span| AnalyzedEntity {
                entity_type: span.entity_type.as_tag().to_string(),
                start: span.start,
                end: span.end,
                score: (span.score * 100.0).round() / 100.0,
                text: partial_mask(&text[span.start..span.end]),
            })
            .collect();
        AnalysisOutcome { entities }
    }

    /// L1 + L2 candidates, thresholded, overlap-resolved, validated.
    /// Returns accepted spans sorted left-to-right.
    fn detect(
        &self,
        text: &str,
        entity_types: Option<&[EntityType]>,
        threshold: f64,
    ) -> Vec<EntitySpan> {
        let allowed: Option<HashSet<EntityType>> =
            entity_types.map(|types| types.iter().cloned().collect());
        let disabled = self.disabled.read().expect("disabled lock poisoned").clone();

        let mut candidates = self
            .registry
            .read()
            .expect("registry lock poisoned")
            .scan(text, allowed.as_ref(), &disabled);

        if let Some(tagger) = &self.tagger {
            match tagger.tag(text, &neural::tagger_labels()) {
                Ok(tagged) => {
                    for span in tagged {
                        let Some(entity_type) = neural::entity_for_label(&span.label) else {
                            continue;
                        };
                        if disabled.contains(&entity_type) {
                            continue;
                        }
                        if let Some(allowed) = &allowed {
                            if !allowed.contains(&entity_type) {
                                continue;
                            }
                        }
                        if !span_in_bounds(text, span.start, span.end) {
                            continue;
                        }
                        candidates.push(EntitySpan::new(
                            span.start,
                            span.end,
                            entity_type,
                            span.score,
                            DetectionSource::Neural,
                        ));
                    }
                }
                Err(err) => warn!(%err, "neural tagger failed; continuing without it"),
            }
        }

        let resolved = overlap::resolve(candidates, threshold);
        validate::retain_valid(resolved, text)
    }

    /// Run the generative reviewer over text minus already-found spans and
    /// merge survivors under the same overlap and validation rules.
    fn merge_review(
        &self,
        reviewer: &dyn IReviewer,
        text: &str,
        accepted: Vec<EntitySpan>,
        threshold: f64,
    ) -> Vec<EntitySpan> {
        let already_found: Vec<String> = accepted
            .iter()
            .map(|span| text[span.start..span.end].to_string())
            .collect();

        let candidates = reviewer.review(text, &already_found);
        if candidates.is_empty() {
            return accepted;
        }

        let mut merged = accepted;
        let mut added = 0usize;
        for candidate in candidates {
            if !span_in_bounds(text, candidate.start, candidate.end) {
                continue;
            }
            let span = EntitySpan::new(
                candidate.start,
                candidate.end,
                EntityType::from_tag(&candidate.entity_type),
                REVIEWER_SCORE,
                DetectionSource::Generative,
            );
            if merged.iter().any(|kept| kept.overlaps(&span)) {
                continue;
            }
            merged.push(span);
            added += 1;
        }

        if added == 0 {
            return merged;
        }
        debug!(added, "generative reviewer proposed additional spans");
        let resolved = overlap::resolve(merged, threshold);
        validate::retain_valid(resolved, text)
    }
}

fn span_in_bounds(text: &str, start: usize, end: usize) -> bool {
    start < end
        && end <= text.len()
        && text.is_char_boundary(start)
        && text.is_char_boundary(end)
}

/// Mask all but the first and last `max(1, len/4)` characters. Strings of
/// four characters or fewer are fully masked.
fn partial_mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    if len <= 4 {
        return "*".repeat(len);
    }
    let visible = (len / 4).max(1);
    let mut masked = String::with_capacity(len);
    masked.extend(&chars[..visible]);
    masked.extend(std::iter::repeat('*').take(len - 2 * visible));
    masked.extend(&chars[len - visible..]);
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_mask_short_values_fully_masked() {
        assert_eq!(partial_mask("abcd"), "****");
        assert_eq!(partial_mask("ab"), "**");
        assert_eq!(partial_mask(""), "");
    }

    #[test]
    fn partial_mask_keeps_quarter_each_side() {
        let masked = partial_mask("john@example.com");
        assert_eq!(masked, "john********.com");
        assert_eq!(masked.chars().count(), 16);
    }

    #[test]
    fn partial_mask_length_five() {
        assert_eq!(partial_mask("abcde"), "a***e");
    }
}
