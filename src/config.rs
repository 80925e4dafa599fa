//! Configuration management for Velarium
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{Result, VelariumError};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote store connection configuration
    pub store: StoreConfig,

    /// Credentials used to establish a session against the store
    pub credentials: CredentialsConfig,

    /// Command issuance tuning
    pub commands: CommandsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,
}

/// Remote store connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the realtime database (no trailing slash)
    pub database_url: String,

    /// Web API key of the project hosting the record
    pub api_key: String,

    /// Path of the shared awning record inside the database
    pub record_path: String,

    /// Seconds to wait before re-establishing a dropped change stream
    pub stream_retry_secs: u64,
}

/// Email/password credentials for the store session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Account email
    pub email: String,

    /// Account password - kept out of serialized output
    #[serde(skip_serializing)]
    pub password: String,
}

/// Command issuance tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Delay between the duration write and the status write for open/close.
    /// Lets the duration propagate first; an ordering hint, not a guarantee.
    pub settle_delay_ms: u64,

    /// Movement duration used before the first record notification arrives
    pub default_duration_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file (or directory for daily rotation)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Whether the HTTP surface is served at all
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "https://awning-default-rtdb.europe-west1.firebasedatabase.app"
                .to_string(),
            api_key: String::new(),
            record_path: "awning".to_string(),
            stream_retry_secs: 5,
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100,
            default_duration_ms: 30_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/velarium.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
            enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            credentials: CredentialsConfig::default(),
            commands: CommandsConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        let default_paths = [
            "velarium.yaml",
            "/data/velarium.yaml",
            "/etc/velarium/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.store.database_url.is_empty() {
            return Err(VelariumError::validation(
                "store.database_url",
                "Database URL cannot be empty",
            ));
        }

        if !self.store.database_url.starts_with("http") {
            return Err(VelariumError::validation(
                "store.database_url",
                "Database URL must be an http(s) URL",
            ));
        }

        if self.store.record_path.is_empty() {
            return Err(VelariumError::validation(
                "store.record_path",
                "Record path cannot be empty",
            ));
        }

        if self.web.port == 0 {
            return Err(VelariumError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}
