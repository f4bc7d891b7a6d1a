//! Process configuration loaded from TOML.

use derive_getters::Getters;
use rolebot_engine::EngineTiming;
use rolebot_error::{ConfigError, RolebotResult};
use rolebot_social::CommandConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rolebot process configuration.
///
/// Every field has a default, so an empty file is a valid configuration.
/// Secrets (`DISCORD_TOKEN`, `DATABASE_URL`) come from the environment,
/// never from this file.
///
/// ```toml
/// command_prefix = "rb!"
/// feedback_ttl_secs = 10
/// log_json = false
///
/// [timing]
/// settle_delay_ms = 1500
/// join_role_grace_ms = 5000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RolebotConfig {
    /// Operator command settings
    #[serde(flatten)]
    commands: CommandConfig,

    /// Emit JSON log lines instead of human-readable text
    #[serde(default)]
    log_json: bool,

    /// Reconciliation delays
    #[serde(default)]
    timing: EngineTiming,
}

impl RolebotConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> RolebotResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> RolebotResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let prefix = self.commands.command_prefix();
        if prefix.trim().is_empty() || prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::new(format!(
                "command_prefix must be non-empty and contain no whitespace, got {:?}",
                prefix
            )));
        }
        if *self.commands.feedback_ttl_secs() == 0 {
            return Err(ConfigError::new("feedback_ttl_secs must be at least 1"));
        }
        Ok(())
    }
}

/// Read a required secret from the environment.
pub fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::new(format!("{} not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolebot_error::RolebotErrorKind;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = RolebotConfig::from_toml("").unwrap();
        assert_eq!(config, RolebotConfig::default());
        assert_eq!(config.commands().command_prefix(), "rb!");
        assert_eq!(*config.timing().settle_delay_ms(), 1500);
        assert!(!*config.log_json());
    }

    #[test]
    fn test_partial_override() {
        let config = RolebotConfig::from_toml(
            r#"
            command_prefix = "!rr"
            log_json = true

            [timing]
            join_role_grace_ms = 8000
            "#,
        )
        .unwrap();

        assert_eq!(config.commands().command_prefix(), "!rr");
        assert_eq!(*config.commands().feedback_ttl_secs(), 10);
        assert!(*config.log_json());
        assert_eq!(*config.timing().settle_delay_ms(), 1500);
        assert_eq!(*config.timing().join_role_grace_ms(), 8000);
    }

    #[test]
    fn test_rejects_blank_prefix() {
        let err = RolebotConfig::from_toml(r#"command_prefix = "  ""#).unwrap_err();
        assert!(matches!(err.kind(), RolebotErrorKind::Config(_)));
    }

    #[test]
    fn test_rejects_zero_ttl() {
        assert!(RolebotConfig::from_toml("feedback_ttl_secs = 0").is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = RolebotConfig::from_toml("command_prefix = ").unwrap_err();
        assert!(format!("{}", err).contains("Failed to parse config"));
    }
}
