//! Service configuration
//!
//! Layered with the `config` crate: built-in defaults, then
//! `config/default.toml`, `config/{RUN_MODE}.toml` and `config/local.toml`
//! when present, then `BILET__*` environment variables
//! (e.g. `BILET__SERVER__PORT=8080`, `BILET__POLICIES__REHOLD=refresh`).

use std::env;

use common::database::DatabaseConfig;
use config::{Config, ConfigError, Environment, File};
use seating::Policies;
use serde::Deserialize;

/// Where the seat ledger lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process memory, seeded with demo trips. Development only.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Acquire timeout in seconds
    pub connection_timeout: u64,
}

impl From<&DatabaseSettings> for DatabaseConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        DatabaseConfig {
            database_url: settings.url.clone(),
            max_connections: settings.max_connections,
            min_connections: settings.min_connections,
            connection_timeout: settings.connection_timeout,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub storage: StorageBackend,
    pub log_level: String,
    #[serde(default)]
    pub policies: Policies,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = DatabaseConfig::default();

        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3001)?
            .set_default("database.url", defaults.database_url)?
            .set_default("database.max_connections", i64::from(defaults.max_connections))?
            .set_default("database.min_connections", i64::from(defaults.min_connections))?
            .set_default("database.connection_timeout", defaults.connection_timeout as i64)?
            .set_default("storage", "postgres")?
            .set_default("log_level", "info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("BILET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
