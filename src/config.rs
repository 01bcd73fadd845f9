//! Session configuration.

use serde::{Deserialize, Serialize};

/// Default number of applied transactions retained by the history.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default confidence assigned to edits recovered via the code-block
/// fallback. Envelope edits always get 1.0.
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.75;

/// Configuration for an edit session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of applied transactions kept in history.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Source tag stamped on proposed edits and transactions.
    #[serde(default = "default_source")]
    pub source: String,
    /// Confidence assigned to code-block-fallback edits.
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_source() -> String {
    "ai-edit".to_string()
}

fn default_fallback_confidence() -> f64 {
    DEFAULT_FALLBACK_CONFIDENCE
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            source: default_source(),
            fallback_confidence: default_fallback_confidence(),
        }
    }
}

impl SessionConfig {
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_fallback_confidence(mut self, confidence: f64) -> Self {
        self.fallback_confidence = confidence.clamp(0.0, 1.0);
        self
    }
}
