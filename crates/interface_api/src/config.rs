//! Server configuration
//!
//! Read once at start-up from `POS_`-prefixed environment variables
//! (`POS_PORT`, `POS_DATABASE_URL`, `POS_TIMEZONE`, ...). Unset values keep
//! their defaults.

use std::path::PathBuf;

use serde::Deserialize;

use core_kernel::{TemporalError, Timezone};
use infra_db::DatabaseConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "POS";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    pub log_format: LogFormat,
    /// IANA name of the facility's timezone; defines the business day
    pub timezone: String,
    /// JSON preferences file
    pub settings_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "postgres://localhost/poultry_pos".to_string(),
            max_connections: 10,
            min_connections: 2,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            timezone: "Asia/Amman".to_string(),
            settings_path: PathBuf::from("settings/app-settings.json"),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured business timezone
    pub fn business_timezone(&self) -> Result<Timezone, TemporalError> {
        self.timezone.parse()
    }

    /// Pool settings for the configured database
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
    }
}
