//! Runtime configuration from environment variables

use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/transactions";
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Configuration for the feed monitor
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Snapshot endpoint
    pub api_url: String,

    /// Poll period
    pub refresh_interval: Duration,

    /// Transport-level request timeout
    pub request_timeout: Duration,

    /// Initial signature prefix filter (empty = no filtering)
    pub initial_filter: String,

    pub rust_log: Option<String>,
}

impl Config {
    pub fn new(api_url: impl Into<String>, refresh_interval: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            refresh_interval,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            initial_filter: String::new(),
            rust_log: None,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `USDCFLOW_API_URL` (default: http://localhost:3000/transactions)
    /// - `REFRESH_INTERVAL_MS` (default: 2000)
    /// - `REQUEST_TIMEOUT_MS` (default: 10000)
    /// - `USDCFLOW_FILTER` (default: empty)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("USDCFLOW_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "USDCFLOW_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let refresh_ms = parse_millis(&lookup, "REFRESH_INTERVAL_MS", DEFAULT_REFRESH_INTERVAL_MS)?;
        let timeout_ms = parse_millis(&lookup, "REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;

        Ok(Self {
            api_url,
            refresh_interval: Duration::from_millis(refresh_ms),
            request_timeout: Duration::from_millis(timeout_ms),
            initial_filter: lookup("USDCFLOW_FILTER").unwrap_or_default(),
            rust_log: lookup("RUST_LOG"),
        })
    }
}

fn parse_millis<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => Err(ConfigError::InvalidValue(format!("{} must be greater than zero", key))),
            Ok(ms) => Ok(ms),
            Err(_) => Err(ConfigError::InvalidValue(format!("{} is not a number: {}", key, raw))),
        },
    }
}
