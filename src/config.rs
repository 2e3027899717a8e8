//! Listener configuration
//!
//! Loaded from YAML, with `.env` / environment overrides for values that
//! differ per deployment.

use notifysockets::config::{
    validate_endpoint, DEFAULT_CONNECT_TIMEOUT, DEFAULT_ENDPOINT, DEFAULT_MAX_RECONNECT_ATTEMPTS,
    DEFAULT_RECONNECT_DELAY,
};
use notifysockets::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable overriding the YAML endpoint
pub const ENDPOINT_ENV_VAR: &str = "NOTIFICATIONS_WS_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Notification listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// WebSocket endpoint of the notification server
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Wait between reconnection attempts, in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Reconnection attempts before giving up
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: usize,
    /// Time allowed for opening the connection, in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY.as_millis() as u64
}

fn default_max_reconnect_attempts() -> usize {
    DEFAULT_MAX_RECONNECT_ATTEMPTS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            connect_timeout_secs: default_connect_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl NotificationsConfig {
    /// Load configuration from YAML file and .env
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: NotificationsConfig = serde_yaml::from_str(&yaml_content)?;

        // Don't fail if .env doesn't exist
        dotenv::dotenv().ok();

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV_VAR) {
            info!("Overriding endpoint from environment variable");
            config.endpoint = endpoint;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.endpoint)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "reconnect_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }

    /// Settings for the connection manager
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.endpoint.clone())
            .with_reconnect_delay(Duration::from_millis(self.reconnect_delay_ms))
            .with_max_reconnect_attempts(self.max_reconnect_attempts)
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Endpoint: {}", self.endpoint);
        info!("  Reconnect delay: {} ms", self.reconnect_delay_ms);
        info!("  Max reconnect attempts: {}", self.max_reconnect_attempts);
        info!("  Connect timeout: {} seconds", self.connect_timeout_secs);
        info!("  Log level: {}", self.log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: NotificationsConfig = serde_yaml::from_str("log_level: debug\n").unwrap();

        assert_eq!(config.endpoint, "ws://localhost:8000/ws/notifications");
        assert_eq!(config.reconnect_delay_ms, 3000);
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.log_level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_config_conversion() {
        let config = NotificationsConfig {
            endpoint: "wss://notify.example.com/ws".to_string(),
            reconnect_delay_ms: 1500,
            max_reconnect_attempts: 2,
            connect_timeout_secs: 4,
            log_level: "info".to_string(),
        };

        assert_eq!(
            config.client_config(),
            ClientConfig::new("wss://notify.example.com/ws")
                .with_reconnect_delay(Duration::from_millis(1500))
                .with_max_reconnect_attempts(2)
                .with_connect_timeout(Duration::from_secs(4))
        );
    }

    #[test]
    fn test_default_matches_client_defaults() {
        assert_eq!(NotificationsConfig::default().client_config(), ClientConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = NotificationsConfig::default();
        config.endpoint = "http://localhost:8000".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = NotificationsConfig::default();
        config.reconnect_delay_ms = 0;
        assert!(config.validate().is_err());

        let mut config = NotificationsConfig::default();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }
}
