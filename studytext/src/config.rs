//! Optional TOML configuration for the study service.
//!
//! ```toml
//! model = "gemini-2.5-flash"
//! fallback_models = ["gemini-2.0-flash"]
//! cache_capacity = 64
//! language = "telugu"
//! transliteration_scheme = "tel_Telu"
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 500
//! cooldown_secs = 60
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::generate::RetryPolicy;
use crate::prompt::Language;
use crate::transliterate::DEFAULT_SCHEME;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub cooldown_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            cooldown_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    pub model: String,
    pub fallback_models: Vec<String>,
    /// Generated responses kept in memory; 0 disables caching.
    pub cache_capacity: usize,
    pub retry: RetryConfig,
    pub language: Language,
    pub transliteration_scheme: String,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            fallback_models: Vec::new(),
            cache_capacity: 64,
            retry: RetryConfig::default(),
            language: Language::default(),
            transliteration_scheme: DEFAULT_SCHEME.to_string(),
        }
    }
}

impl StudyConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse study configuration")
    }

    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            cooldown: Duration::from_secs(self.retry.cooldown_secs),
            fallback_models: self.fallback_models.clone(),
        }
    }
}
