//! Storage configuration from the environment.

use std::time::Duration;

use thiserror::Error;

const DEFAULT_MAIN_URL: &str = "postgres://localhost:5432/finpuls";
const DEFAULT_TOKENS_URL: &str = "postgres://localhost:5432/finpuls_tokens";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Pool settings for one storage unit.
#[derive(Debug, Clone)]
pub struct UnitConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Configuration for both storage units. The units are independent: each
/// gets its own URL and its own pool, sized by the shared bounds.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub main: UnitConfig,
    pub tokens: UnitConfig,
}

impl StorageConfig {
    /// Read configuration from process environment variables, applying
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_connections = parse(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let acquire_timeout = Duration::from_secs(parse(
            &lookup,
            "DB_ACQUIRE_TIMEOUT_SECS",
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?);
        let idle_timeout =
            Duration::from_secs(parse(&lookup, "DB_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS)?);
        let max_lifetime =
            Duration::from_secs(parse(&lookup, "DB_MAX_LIFETIME_SECS", DEFAULT_MAX_LIFETIME_SECS)?);

        let unit = |url: String| UnitConfig {
            url,
            max_connections,
            acquire_timeout,
            idle_timeout,
            max_lifetime,
        };

        Ok(Self {
            main: unit(lookup("DB_MAIN_URL").unwrap_or_else(|| DEFAULT_MAIN_URL.to_string())),
            tokens: unit(lookup("DB_TOKENS_URL").unwrap_or_else(|| DEFAULT_TOKENS_URL.to_string())),
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&'static str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}
