//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and environment variables. Each sub-module represents a
//! logical configuration section.

pub mod app;
pub mod assistant;
pub mod logging;
pub mod pubsub;
pub mod relay;

use std::path::Path;

use secrecy::ExposeSecret;
use serde::Deserialize;

use self::app::ServerConfig;
use self::assistant::AssistantConfig;
use self::logging::LoggingConfig;
use self::pubsub::PubSubConfig;
use self::relay::RelayConfig;

use crate::error::AppError;

/// Environment variables kept from the first deployment, mapped onto
/// their configuration keys.
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("LLM_SECRET_KEY", "relay.controller_secret"),
    ("UNITY_CLIENT_KEY", "relay.device_secret"),
    ("REDIS_URL", "pubsub.redis.url"),
    ("LOG_LEVEL", "logging.level"),
];

/// Root application configuration.
///
/// Top-level deserialization target for the merged configuration
/// (default.toml + environment overlay + environment variables).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Relay identity and credential settings.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Pub/sub transport settings.
    #[serde(default)]
    pub pubsub: PubSubConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Controller-side assistant settings.
    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default`, the `config/{env}` overlay and environment
    /// variables prefixed with `RELAYHUB__`, then applies the legacy
    /// variable names on top.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from(Path::new("config"), env)
    }

    /// Same as [`AppConfig::load`], reading the TOML files from `dir`.
    pub fn load_from(dir: &Path, env: &str) -> Result<Self, AppError> {
        let default_file = dir.join("default");
        let env_file = dir.join(env);

        let mut builder = config::Config::builder()
            .add_source(config::File::from(default_file).required(false))
            .add_source(config::File::from(env_file).required(false))
            .add_source(
                config::Environment::with_prefix("RELAYHUB")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in LEGACY_ENV_OVERRIDES {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        let config = builder
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Checks the settings the relay cannot start without.
    pub fn validate(&self) -> Result<(), AppError> {
        let missing = |secret: &Option<secrecy::SecretString>| {
            secret
                .as_ref()
                .is_none_or(|s| s.expose_secret().is_empty())
        };

        if missing(&self.relay.controller_secret) || missing(&self.relay.device_secret) {
            return Err(AppError::configuration(
                "Security keys are missing (relay.controller_secret / relay.device_secret)",
            ));
        }

        if self.relay.controller_id.is_empty() {
            return Err(AppError::configuration("relay.controller_id must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.relay.controller_id, "LLM");
        assert_eq!(config.relay.auth_header, "x-auth-token");
        assert_eq!(config.pubsub.provider, pubsub::PubSubProvider::Redis);
        assert_eq!(config.assistant.max_history, 6);
    }

    #[test]
    fn test_validate_requires_both_secrets() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err());

        config.relay.controller_secret = Some(SecretString::new("llm-key".to_string()));
        assert!(config.validate().is_err());

        config.relay.device_secret = Some(SecretString::new(String::new()));
        assert!(config.validate().is_err());

        config.relay.device_secret = Some(SecretString::new("unity-key".to_string()));
        assert!(config.validate().is_ok());
    }

    // The only test in this crate that touches the process environment.
    #[test]
    fn test_load_layers_files_and_environment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 9000\n\n[logging]\nlevel = \"warn\"\nformat = \"pretty\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("staging.toml"),
            "[logging]\nformat = \"json\"\n",
        )
        .unwrap();

        let vars = [
            ("LLM_SECRET_KEY", "legacy-llm"),
            ("UNITY_CLIENT_KEY", "legacy-unity"),
            ("REDIS_URL", "redis://cache:6380"),
            ("LOG_LEVEL", "debug"),
            ("RELAYHUB__RELAY__CONTROLLER_ID", "brain"),
        ];
        // SAFETY: no other test in this crate asserts on the keys these set.
        unsafe {
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
        }

        let loaded = AppConfig::load_from(dir.path(), "staging");

        unsafe {
            for (key, _) in vars {
                std::env::remove_var(key);
            }
        }

        let config = loaded.unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.relay.controller_id, "brain");
        assert_eq!(config.pubsub.redis.url, "redis://cache:6380");
        assert_eq!(
            config.relay.controller_secret.unwrap().expose_secret(),
            "legacy-llm"
        );
        assert_eq!(
            config.relay.device_secret.unwrap().expose_secret(),
            "legacy-unity"
        );
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path(), "missing").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.relay.auth_header, "x-auth-token");
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let mut config = AppConfig::default();
        config.relay.controller_secret = Some(SecretString::new("hunter2".to_string()));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
