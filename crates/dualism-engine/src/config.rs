//! Engine configuration.
//!
//! One small TOML-backed struct covering the remote generation endpoint and
//! the session defaults. Everything has a default so an empty file (or no
//! file at all) yields a working local-dev setup:
//!
//! ```toml
//! endpoint = "http://localhost:3000/i/generate"
//! request_timeout_secs = 120
//! chunk_timeout_secs = 30
//! default_lang = "TypeScript"
//! ```

use std::path::Path;
use std::time::Duration;

use dualism_core::Language;
use serde::{Deserialize, Serialize};

use crate::Result;

fn default_endpoint() -> String {
    "http://localhost:3000/i/generate".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_chunk_timeout() -> u64 {
    30
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Generation service URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Cap on a whole generation request, send to stream close.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Cap on the gap between consecutive stream reads.
    #[serde(default = "default_chunk_timeout")]
    pub chunk_timeout_secs: u64,

    /// Language a new notebook starts in.
    #[serde(default)]
    pub default_lang: Language,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout(),
            chunk_timeout_secs: default_chunk_timeout(),
            default_lang: Language::default(),
        }
    }
}

impl EngineConfig {
    /// Config with a specific endpoint and defaults elsewhere.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set the per-chunk timeout.
    pub fn with_chunk_timeout(mut self, secs: u64) -> Self {
        self.chunk_timeout_secs = secs;
        self
    }

    /// Set the starting language.
    pub fn with_default_lang(mut self, lang: Language) -> Self {
        self.default_lang = lang;
        self
    }

    /// Parse from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Chunk timeout as a [`Duration`].
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }
}
