//! Engine configuration.

use serde::{Deserialize, Serialize};

mod defaults {
    pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.4;
    pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
    pub const DEFAULT_REVIEWER_BASE_URL: &str = "http://localhost:11434";
    pub const DEFAULT_REVIEWER_MODEL: &str = "llama3.1";
    pub const DEFAULT_REVIEWER_TIMEOUT_SECS: u64 = 30;
}

/// Detection engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum candidate score admitted into overlap resolution.
    /// 0.0 admits everything; 1.0 rejects everything.
    pub score_threshold: f64,
    /// Session time-to-live in seconds. Expiry is checked lazily.
    pub session_ttl_secs: u64,
    /// Whether to attach the generative review layer when it is reachable.
    pub use_reviewer: bool,
    pub reviewer: ReviewerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            score_threshold: defaults::DEFAULT_SCORE_THRESHOLD,
            session_ttl_secs: defaults::DEFAULT_SESSION_TTL_SECS,
            use_reviewer: true,
            reviewer: ReviewerConfig::default(),
        }
    }
}

/// Generative reviewer (L3) endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewerConfig {
    /// Base URL of the Ollama-compatible endpoint.
    pub base_url: String,
    pub model: String,
    /// Hard cap on a single review request. On timeout the reviewer
    /// contributes no spans.
    pub timeout_secs: u64,
}

impl Default for ReviewerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DEFAULT_REVIEWER_BASE_URL.to_string(),
            model: defaults::DEFAULT_REVIEWER_MODEL.to_string(),
            timeout_secs: defaults::DEFAULT_REVIEWER_TIMEOUT_SECS,
        }
    }
}
