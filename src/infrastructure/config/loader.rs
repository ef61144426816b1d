//! Configuration loading with hierarchical merging.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("No personas configured; the town needs at least one inhabitant")]
    NoPersonas,

    #[error("Duplicate persona id: {0}")]
    DuplicatePersona(String),

    #[error("Meeting agent {0} is not a configured persona")]
    UnknownMeetingAgent(String),

    #[error("Invalid wait budget: {0} ms. Must be at least 1")]
    InvalidWaitBudget(u64),

    #[error("Invalid max_memories: {0}. Must be at least 1")]
    InvalidMaxMemories(usize),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid temperature: {0}. Must be within 0.0..=2.0")]
    InvalidTemperature(f32),
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .yunmeng/config.yaml (project config)
    /// 3. .yunmeng/local.yaml (local overrides, optional)
    /// 4. Environment variables (YUNMENG_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".yunmeng/config.yaml"))
            .merge(Yaml::file(".yunmeng/local.yaml"))
            .merge(Env::prefixed("YUNMENG_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.simulation.personas.is_empty() {
            return Err(ConfigError::NoPersonas);
        }
        for persona in &config.simulation.personas {
            let count = config
                .simulation
                .personas
                .iter()
                .filter(|p| p.id == persona.id)
                .count();
            if count > 1 {
                return Err(ConfigError::DuplicatePersona(persona.id.clone()));
            }
        }

        for id in &config.simulation.meeting.agent_ids {
            if config.persona(id).is_none() {
                return Err(ConfigError::UnknownMeetingAgent(id.clone()));
            }
        }

        if config.server.wait_budget_ms == 0 {
            return Err(ConfigError::InvalidWaitBudget(config.server.wait_budget_ms));
        }

        if config.simulation.max_memories == 0 {
            return Err(ConfigError::InvalidMaxMemories(config.simulation.max_memories));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        for temperature in [config.llm.gemini.temperature, config.llm.deepseek.temperature] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidTemperature(temperature));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = Config::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn rejects_bad_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn rejects_unknown_meeting_agent() {
        let mut config = Config::default();
        config.simulation.meeting.agent_ids = vec!["du_fu".to_string()];
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::UnknownMeetingAgent(_))
        ));
    }

    #[test]
    fn rejects_zero_wait_budget() {
        let mut config = Config::default();
        config.server.wait_budget_ms = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidWaitBudget(0))
        ));
    }

    #[test]
    fn rejects_inverted_backoff() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = 60_000;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(_, _))
        ));
    }
}
