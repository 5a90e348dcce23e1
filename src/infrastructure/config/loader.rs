use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid min_test_cases: {0}. Must be at least 1")]
    InvalidMinTestCases(usize),

    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    #[error("Invalid top_n: {0}. Must be at least 1")]
    InvalidTopN(usize),

    #[error("Invalid ranking weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid repeat_runs: {0}. Must be at least 2")]
    InvalidRepeatRuns(u32),

    #[error("Invalid max_concurrency: {0}. Must be between 1 and 32")]
    InvalidMaxConcurrency(usize),

    #[error("Invalid timeout for {0}: must be positive")]
    InvalidTimeout(&'static str),

    #[error("Invalid judge name for {0}: cannot be empty")]
    EmptyJudgeName(&'static str),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .playtest/config.yaml (project config)
    /// 3. .playtest/local.yaml (project local overrides, optional)
    /// 4. Environment variables (PLAYTEST_* prefix, `__` separates nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".playtest/config.yaml"))
            .merge(Yaml::file(".playtest/local.yaml"))
            .merge(Env::prefixed("PLAYTEST_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring environment overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("PLAYTEST_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.inspection.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("inspection.timeout_ms"));
        }

        let generation = &config.generation;
        if generation.min_test_cases == 0 {
            return Err(ConfigError::InvalidMinTestCases(generation.min_test_cases));
        }
        if generation.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(generation.max_attempts));
        }
        if generation.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("generation.timeout_ms"));
        }

        let ranking = &config.ranking;
        if ranking.top_n == 0 {
            return Err(ConfigError::InvalidTopN(ranking.top_n));
        }
        let weights = [
            ranking.priority_weight,
            ranking.detection_weight,
            ranking.coverage_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::InvalidWeights(
                "weights must be finite and non-negative".to_string(),
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::InvalidWeights(
                "weights must not all be zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&ranking.default_detection_confidence) {
            return Err(ConfigError::InvalidWeights(format!(
                "default_detection_confidence {} is outside 0..1",
                ranking.default_detection_confidence
            )));
        }

        let execution = &config.execution;
        if execution.repeat_runs < 2 {
            return Err(ConfigError::InvalidRepeatRuns(execution.repeat_runs));
        }
        if execution.max_concurrency == 0 || execution.max_concurrency > 32 {
            return Err(ConfigError::InvalidMaxConcurrency(execution.max_concurrency));
        }
        if execution.driver_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("execution.driver_timeout_ms"));
        }
        if execution.judge_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("execution.judge_timeout_ms"));
        }
        if execution.primary_judge.trim().is_empty() {
            return Err(ConfigError::EmptyJudgeName("execution.primary_judge"));
        }
        if execution.cross_agent_judge.trim().is_empty() {
            return Err(ConfigError::EmptyJudgeName("execution.cross_agent_judge"));
        }

        if config.knowledge.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("knowledge.timeout_ms"));
        }

        let rps = config.rate_limit.requests_per_second;
        if rps.is_nan() || rps <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(rps));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}
