//! The text-generation collaborator and its retry/cooldown wrapper.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Classified generator failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generator is rate limited")]
    RateLimited,
    #[error("generator is overloaded or unavailable")]
    Unavailable,
    #[error("generation failed: {0}")]
    Unknown(String),
}

impl GenerationError {
    /// Rate limits and overloads are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::RateLimited | GenerationError::Unavailable)
    }
}

/// A black-box text generator: a prompt and a model identifier in, text out.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError>;
}

impl<G: TextGenerator + ?Sized> TextGenerator for Box<G> {
    fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt, model)
    }
}

/// How [`RetryingGenerator`] retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per model, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub base_delay: Duration,
    /// How long to fail fast after every model was rate limited.
    pub cooldown: Duration,
    /// Models tried in order after the requested one is exhausted.
    pub fallback_models: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            cooldown: Duration::from_secs(60),
            fallback_models: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Cooldown {
    Idle,
    Until(Instant),
    /// The cooldown end is past what `Instant` can represent.
    Indefinite,
}

/// Wraps a generator with exponential backoff, model fallback and a
/// rate-limit cooldown.
#[derive(Debug)]
pub struct RetryingGenerator<G> {
    inner: G,
    policy: RetryPolicy,
    cooldown: Mutex<Cooldown>,
}

impl<G: TextGenerator> RetryingGenerator<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            cooldown: Mutex::new(Cooldown::Idle),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// True while calls fail fast after rate-limit exhaustion.
    pub fn is_cooling_down(&self) -> bool {
        let cooldown = *self.cooldown.lock().unwrap_or_else(PoisonError::into_inner);
        match cooldown {
            Cooldown::Idle => false,
            Cooldown::Until(t) => Instant::now() < t,
            Cooldown::Indefinite => true,
        }
    }

    fn start_cooldown(&self) {
        let mut cooldown = self.cooldown.lock().unwrap_or_else(PoisonError::into_inner);
        *cooldown = match Instant::now().checked_add(self.policy.cooldown) {
            Some(until) => Cooldown::Until(until),
            None => Cooldown::Indefinite,
        };
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.policy
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl<G: TextGenerator> TextGenerator for RetryingGenerator<G> {
    fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError> {
        if self.is_cooling_down() {
            debug!("generator cooling down, failing fast");
            return Err(GenerationError::RateLimited);
        }

        let mut models = vec![model];
        for fallback in &self.policy.fallback_models {
            if !models.contains(&fallback.as_str()) {
                models.push(fallback);
            }
        }

        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = GenerationError::Unknown("no model attempted".to_string());
        for model in models {
            for attempt in 0..attempts {
                match self.inner.generate(prompt, model) {
                    Ok(text) => return Ok(text),
                    Err(e) if e.is_retryable() => {
                        warn!(model, attempt = attempt + 1, error = %e, "generation failed, retrying");
                        last_error = e;
                        if attempt + 1 < attempts {
                            thread::sleep(self.delay(attempt));
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
            warn!(model, "model exhausted");
        }

        if last_error == GenerationError::RateLimited {
            self.start_cooldown();
        }
        Err(last_error)
    }
}
