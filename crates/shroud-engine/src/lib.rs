//! # shroud-engine
//!
//! Multi-layer PII detection and reversible redaction.
//!
//! Three detection layers feed one pipeline: deterministic pattern
//! recognizers (L1), an optional zero-shot neural tagger (L2), and an
//! optional generative reviewer (L3). Candidates from every layer are the
//! same span record; overlap resolution and per-type validation decide what
//! survives. Accepted spans become indexed placeholders (`[EMAIL_ADDRESS_1]`)
//! and the reverse mapping is held in a TTL-scoped session store so callers
//! can restore the original text.

pub mod engine;
pub mod neural;
pub mod overlap;
pub mod recognizers;
pub mod reviewer;
pub mod session;
pub mod validate;

pub use engine::{
    AnalysisOutcome, AnalyzedEntity, RedactedEntity, RedactionEngine, RedactionOutcome,
    UnredactionOutcome,
};
pub use recognizers::RecognizerRegistry;
pub use reviewer::OllamaReviewer;
pub use session::SessionStore;
