//! Application configuration loaded from environment variables.

use std::num::NonZeroU32;
use std::time::Duration;

use thiserror::Error;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `8080`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset selects the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `STORE_TIMEOUT_MS`: deadline for each store call, `0` disables it (default: `5000`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub store_timeout: Option<Duration>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                    expected: "text or json",
                });
            }
        };

        let store_timeout = match parse::<u64, _>(&lookup, "STORE_TIMEOUT_MS", "milliseconds")? {
            None => defaults.store_timeout,
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PORT", "a port number")?.unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: parse::<NonZeroU32, _>(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                "a positive integer",
            )?
            .map_or(defaults.database_max_connections, NonZeroU32::get),
            store_timeout,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T, F>(lookup: &F, name: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            value.parse().map_err(|_| ConfigError::Invalid {
                name,
                value,
                expected,
            })
        })
        .transpose()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 10,
            store_timeout: Some(Duration::from_millis(5000)),
        }
    }
}
