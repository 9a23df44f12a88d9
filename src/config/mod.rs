//! Configuration management for surfe-diem
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables. Every section carries `#[serde(default)]` so a
//! config file only needs the keys it wants to change.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Upstream data provider configuration
    pub upstream: UpstreamConfig,

    /// Forecast cache configuration
    pub cache: CacheConfig,

    /// Batch endpoint configuration
    pub batch: BatchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Enable permissive CORS
    pub enable_cors: bool,

    /// Enable request logging
    pub enable_request_logging: bool,

    /// Bearer key for admin routes; admin routes are disabled when unset
    pub api_key: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,

    /// Maximum pool size
    pub pool_size: usize,
}

/// Upstream provider endpoints and HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// NOAA NDBC host serving `/data/latest_obs/{id}.txt`
    pub ndbc_base_url: String,

    /// Open-Meteo marine API host serving `/v1/marine`
    pub marine_base_url: String,

    /// weather.gov host serving `/MapClick.php`
    pub weather_base_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,

    /// Comma-separated `current` variables requested from the marine API
    pub marine_current_fields: String,

    /// Length unit for marine forecasts (`imperial` or `metric`)
    pub length_unit: String,
}

/// Forecast cache TTLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Marine forecast TTL in seconds
    pub forecast_ttl_secs: u64,

    /// Current-weather TTL in seconds
    pub current_ttl_secs: u64,
}

/// Upper bound for `batch.max_concurrent_fetches`
pub const MAX_CONCURRENT_FETCHES: usize = 1024;

/// Upper bound for `batch.request_deadline_secs`
pub const MAX_REQUEST_DEADLINE_SECS: u64 = 3600;

/// Batch endpoint fan-out limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum upstream requests in flight for one batch
    pub max_concurrent_fetches: usize,

    /// Overall deadline for one batch request in seconds
    pub request_deadline_secs: u64,

    /// Fetch weather.gov current conditions for spots as well as the forecast
    pub spot_current_conditions: bool,
}

impl BatchConfig {
    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
            enable_cors: true,
            enable_request_logging: true,
            api_key: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: String::from("postgresql://localhost/surfe_diem"),
            pool_size: 10,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            ndbc_base_url: String::from("https://www.ndbc.noaa.gov"),
            marine_base_url: String::from("https://marine-api.open-meteo.com"),
            weather_base_url: String::from("https://marine.weather.gov"),
            request_timeout_secs: 5,
            user_agent: format!("surfe-diem/{}", env!("CARGO_PKG_VERSION")),
            marine_current_fields: String::from(
                "swell_wave_direction,swell_wave_height,swell_wave_period",
            ),
            length_unit: String::from("imperial"),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            forecast_ttl_secs: 900,
            current_ttl_secs: 600,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 16,
            request_deadline_secs: 10,
            spot_current_conditions: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive for the configured level; `verbose` forces debug output
    #[must_use]
    pub fn filter_directive(&self, verbose: bool) -> String {
        if verbose {
            "surfe_diem=debug,tower_http=debug,info".to_string()
        } else {
            format!("surfe_diem={},warn", self.level.to_lowercase())
        }
    }
}

impl Config {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Defaults, then the optional file, then environment overrides, then validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `SURFE_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(addr) = env_var("SURFE_BIND_ADDRESS") {
            self.server.bind_address = addr
                .parse()
                .with_context(|| format!("Invalid SURFE_BIND_ADDRESS: {addr}"))?;
        }
        if let Some(v) = env_parse::<bool>("SURFE_ENABLE_CORS")? {
            self.server.enable_cors = v;
        }
        if let Some(v) = env_parse::<bool>("SURFE_REQUEST_LOGGING")? {
            self.server.enable_request_logging = v;
        }
        if let Some(key) = env_var("SURFE_API_KEY") {
            self.server.api_key = Some(key);
        }

        if let Some(url) = env_var("DATABASE_URL").or_else(|| env_var("SURFE_DATABASE_URL")) {
            self.database.postgres_url = url;
        }
        if let Some(v) = env_parse::<usize>("SURFE_DB_POOL_SIZE")? {
            self.database.pool_size = v;
        }

        if let Some(url) = env_var("SURFE_NDBC_BASE_URL") {
            self.upstream.ndbc_base_url = url;
        }
        if let Some(url) = env_var("SURFE_MARINE_BASE_URL") {
            self.upstream.marine_base_url = url;
        }
        if let Some(url) = env_var("SURFE_WEATHER_BASE_URL") {
            self.upstream.weather_base_url = url;
        }
        if let Some(v) = env_parse::<u64>("SURFE_REQUEST_TIMEOUT")? {
            self.upstream.request_timeout_secs = v;
        }
        if let Some(v) = env_var("SURFE_USER_AGENT") {
            self.upstream.user_agent = v;
        }

        if let Some(v) = env_parse::<u64>("SURFE_FORECAST_TTL")? {
            self.cache.forecast_ttl_secs = v;
        }
        if let Some(v) = env_parse::<u64>("SURFE_CURRENT_TTL")? {
            self.cache.current_ttl_secs = v;
        }

        if let Some(v) = env_parse::<usize>("SURFE_BATCH_CONCURRENCY")? {
            self.batch.max_concurrent_fetches = v;
        }
        if let Some(v) = env_parse::<u64>("SURFE_BATCH_DEADLINE")? {
            self.batch.request_deadline_secs = v;
        }
        if let Some(v) = env_parse::<bool>("SURFE_SPOT_CURRENT_CONDITIONS")? {
            self.batch.spot_current_conditions = v;
        }

        if let Some(v) = env_var("SURFE_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env_var("SURFE_LOG_FORMAT") {
            self.logging.format = v;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            anyhow::bail!("pool_size must be greater than 0");
        }

        if self.upstream.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.batch.max_concurrent_fetches == 0 {
            anyhow::bail!("max_concurrent_fetches must be greater than 0");
        }

        if self.batch.max_concurrent_fetches > MAX_CONCURRENT_FETCHES {
            anyhow::bail!(
                "max_concurrent_fetches ({}) must not exceed {MAX_CONCURRENT_FETCHES}",
                self.batch.max_concurrent_fetches
            );
        }

        if self.batch.request_deadline_secs > MAX_REQUEST_DEADLINE_SECS {
            anyhow::bail!(
                "request_deadline_secs ({}) must not exceed {MAX_REQUEST_DEADLINE_SECS}",
                self.batch.request_deadline_secs
            );
        }

        if self.batch.request_deadline_secs < self.upstream.request_timeout_secs {
            anyhow::bail!(
                "request_deadline_secs ({}) must not be shorter than request_timeout_secs ({})",
                self.batch.request_deadline_secs,
                self.upstream.request_timeout_secs
            );
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        if !matches!(
            self.logging.level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            anyhow::bail!(
                "log level must be one of trace, debug, info, warn, error (got '{}')",
                self.logging.level
            );
        }

        if let Some(key) = &self.server.api_key {
            if key.trim().is_empty() {
                anyhow::bail!("api_key must not be blank when set");
            }
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.request_timeout_secs)
    }

    #[must_use]
    pub fn forecast_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.forecast_ttl_secs)
    }

    #[must_use]
    pub fn current_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.current_ttl_secs)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid {name}='{raw}': {e}")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.forecast_ttl(), Duration::from_secs(900));
        assert_eq!(config.current_ttl(), Duration::from_secs(600));
        assert_eq!(config.server.bind_address.port(), 8000);
        assert!(config.server.api_key.is_none());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.batch.max_concurrent_fetches = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadline_shorter_than_timeout_rejected() {
        let mut config = Config::default();
        config.batch.request_deadline_secs = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            forecast_ttl_secs = 60

            [server]
            api_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.forecast_ttl_secs, 60);
        assert_eq!(config.cache.current_ttl_secs, 600);
        assert_eq!(config.server.api_key.as_deref(), Some("secret"));
        assert_eq!(config.upstream.request_timeout_secs, 5);
    }

    #[test]
    fn test_unbounded_batch_limits_rejected() {
        let mut config = Config::default();
        config.batch.request_deadline_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.batch.max_concurrent_fetches = usize::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.batch.request_deadline_secs = MAX_REQUEST_DEADLINE_SECS;
        config.batch.max_concurrent_fetches = MAX_CONCURRENT_FETCHES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_filter_directive_follows_level() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.filter_directive(false), "surfe_diem=info,warn");

        logging.level = "Trace".to_string();
        assert_eq!(logging.filter_directive(false), "surfe_diem=trace,warn");
        assert_eq!(
            logging.filter_directive(true),
            "surfe_diem=debug,tower_http=debug,info"
        );
    }
}
