//! Runtime configuration for the classifier, resolver and retry wrapper.
//!
//! Nothing in the resolution pipeline reads the process environment. Callers
//! build these values (usually through `from_env` plus CLI overrides) and hand
//! them to the components at construction time.

use crate::error::{AisleError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gemma2-9b-it";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_ENDPOINT: &str = "AISLE_FINDER_ENDPOINT";
pub const ENV_MODEL: &str = "AISLE_FINDER_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "AISLE_FINDER_TIMEOUT_SECS";

/// Connection settings for the hosted classification endpoint
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Full chat-completions URL
    pub endpoint_url: String,
    /// Bearer token; `None` means every classification fails without a call
    pub api_key: Option<String>,
    pub model: String,
    /// Bound on a single request, connect through body
    pub timeout: Duration,
    pub temperature: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            temperature: 0.0,
        }
    }
}

impl ClassifierConfig {
    pub fn new(endpoint_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            api_key,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Build from `GROQ_API_KEY` and the `AISLE_FINDER_*` variables, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.api_key = std::env::var(ENV_API_KEY)
            .ok()
            .filter(|key| !key.trim().is_empty());

        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            config.endpoint_url = endpoint;
        }
        if let Ok(model) = std::env::var(ENV_MODEL) {
            config.model = model;
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            config.timeout = parse_timeout_secs(&raw)?;
        }

        Ok(config)
    }
}

pub fn parse_timeout_secs(raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        AisleError::Config(format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, raw))
    })?;
    if secs == 0 {
        return Err(AisleError::Config(format!("{} must be greater than zero", ENV_TIMEOUT_SECS)));
    }
    Ok(Duration::from_secs(secs))
}

/// Which check wins when an input is both blacklisted and a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Precedence {
    #[default]
    BlacklistFirst,
    CatalogFirst,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverPolicy {
    pub precedence: Precedence,
}

pub const MAX_RETRY_ATTEMPTS: u32 = 10;
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Backoff schedule for [`crate::retry::RetryingClassifier`]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_RETRY_ATTEMPTS),
            ..Self::default()
        }
    }

    /// `max_attempts` bounded to `1..=MAX_RETRY_ATTEMPTS`
    pub fn attempt_limit(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_RETRY_ATTEMPTS)
    }

    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    /// Never exceeds `MAX_BACKOFF`; overflowing or negative schedules fall
    /// back to it.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_RETRY_ATTEMPTS) as i32;
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map(|delay| delay.min(MAX_BACKOFF))
            .unwrap_or(MAX_BACKOFF)
    }
}
