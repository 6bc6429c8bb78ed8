//! Connection configuration.
//!
//! Supports TOML config files, environment variable overrides, and defaults.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::fmt;
use std::path::Path;

/// Environment variables read by [`ConnectionConfig::apply_env_overrides`].
pub const ENV_USER: &str = "TEST_DB_USER";
pub const ENV_PASSWORD: &str = "TEST_DB_PASS";
pub const ENV_HOST: &str = "TEST_DB_HOST";
pub const ENV_PORT: &str = "TEST_DB_PORT";
pub const ENV_DATABASE: &str = "TEST_DB_NAME";

/// Credentials and address of the database under test.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Login role (default: "postgres")
    pub user: String,
    /// Login password (default: "postgres")
    pub password: String,
    /// Server host (default: "localhost")
    pub host: String,
    /// Server port (default: 5432)
    pub port: u16,
    /// Database name (default: "test_db")
    pub database: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            database: "test_db".to_string(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| StoreError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| StoreError::Config(format!("Invalid TOML: {}", e)))
    }

    /// Applies `TEST_DB_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup, using the `TEST_DB_*` names.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(val) = lookup(ENV_USER) {
            self.user = val;
        }
        if let Some(val) = lookup(ENV_PASSWORD) {
            self.password = val;
        }
        if let Some(val) = lookup(ENV_HOST) {
            self.host = val;
        }
        if let Some(val) = lookup(ENV_PORT) {
            self.port = val
                .parse()
                .map_err(|_| StoreError::Config(format!("Invalid port: {}", val)))?;
        }
        if let Some(val) = lookup(ENV_DATABASE) {
            self.database = val;
        }
        Ok(())
    }

    /// Driver connect options for this configuration.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}
