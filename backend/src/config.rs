//! Configuration management for the Climate Forecast Service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CLIMA_ prefix
//!
//! Credentials (database URL, upstream API token) have no defaults and must
//! come from a config file or the environment.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Upstream time-series API configuration
    pub giovanni: GiovanniConfig,

    /// Forecast pipeline constants
    pub forecast: ForecastConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GiovanniConfig {
    /// API base URL
    pub base_url: String,

    /// Bearer token for the time-series endpoint
    pub token: String,
}

/// Domain constants inherited from the upstream provider's sampling cadence.
/// They are configuration, not derived values.
#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    /// Forecast horizon in hourly steps past the latest training timestamp.
    pub horizon_steps: usize,

    /// Offset between instantaneous and accumulated/flux sampling, minutes.
    pub flux_offset_minutes: i64,

    /// Prediction interval level.
    pub interval_level: f64,

    /// Fan-out degree for upstream fetches (variables and locations).
    pub fetch_concurrency: usize,

    /// Start of the historical training window (UTC, ISO-8601).
    pub train_window_start: String,

    /// End of the historical training window (UTC, ISO-8601), pinned to the
    /// provider's last published update.
    pub train_window_end: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("CLIMA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default(
                "giovanni.base_url",
                "https://api.giovanni.earthdata.nasa.gov",
            )?
            .set_default("forecast.horizon_steps", 2920)?
            .set_default("forecast.flux_offset_minutes", 30)?
            .set_default("forecast.interval_level", 0.9)?
            .set_default("forecast.fetch_concurrency", 5)?
            .set_default("forecast.train_window_start", "2020-01-01T00:00:00")?
            .set_default("forecast.train_window_end", "2025-09-01T00:00:00")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CLIMA_ prefix)
            .add_source(
                Environment::with_prefix("CLIMA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}
