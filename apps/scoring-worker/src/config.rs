//! Environment configuration for the scoring worker.
//!
//! Required variables are collected in a single pass so a misconfigured
//! deployment reports every missing name at once instead of failing on the
//! first one. Empty values count as missing.

use core_config::{env_nonempty, ConfigError};
use queue_worker::DEFAULT_PREFETCH;

/// Settings for the real scoring API.
#[derive(Debug, Clone)]
pub struct ScoringApiSettings {
    pub base_url: String,
    pub api_key: String,
    pub account_key: String,
}

/// Processor selection with its mode-specific settings.
#[derive(Debug, Clone)]
pub enum ScoringMode {
    /// Drive jobs through the scoring API.
    Real(ScoringApiSettings),
    /// Deterministic local scoring, no external calls.
    Mock,
}

impl ScoringMode {
    /// Mode name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ScoringMode::Real(_) => "real",
            ScoringMode::Mock => "mock",
        }
    }
}

/// Scoring worker settings loaded from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub amqp_url: String,
    pub request_queue: String,
    pub response_queue: String,
    pub prefetch: u16,
    pub mode: ScoringMode,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// `SCORING_MODE=mock` (any casing) selects the mock processor and drops
    /// the scoring API variables from the required set; any other value or
    /// no value at all means real mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mock = env_nonempty("SCORING_MODE")
            .map(|v| v.to_lowercase() == "mock")
            .unwrap_or(false);

        let mut missing = Vec::new();
        let mut require = |key: &str| -> String {
            match env_nonempty(key) {
                Some(value) => value,
                None => {
                    missing.push(key.to_string());
                    String::new()
                }
            }
        };

        let amqp_url = require("AMQP_URL");
        let request_queue = require("SCORING_REQUEST_QUEUE");
        let response_queue = require("SCORING_RESPONSE_QUEUE");

        let mode = if mock {
            ScoringMode::Mock
        } else {
            ScoringMode::Real(ScoringApiSettings {
                base_url: require("SCORING_API_URL"),
                api_key: require("SCORING_API_KEY"),
                account_key: require("SCORING_ACCOUNT_KEY"),
            })
        };

        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVars(missing));
        }

        let prefetch = match env_nonempty("SCORING_PREFETCH") {
            Some(value) => value.parse().map_err(|e| ConfigError::ParseError {
                key: "SCORING_PREFETCH".to_string(),
                details: format!("{e}"),
            })?,
            None => DEFAULT_PREFETCH,
        };

        Ok(Self {
            amqp_url,
            request_queue,
            response_queue,
            prefetch,
            mode,
        })
    }
}
