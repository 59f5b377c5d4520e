use std::env;
use std::str::FromStr;
use std::time::Duration;

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::application::PageLimits;
use crate::domain::currency::{CurrencyCode, CurrencyConverter};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool_size: u32,
    pub connection_timeout: Duration,
    pub limits: PageLimits,
    pub converter: CurrencyConverter,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 8080)?;
        let pool_size: u32 = parse_or(&lookup, "DB_POOL_SIZE", 10)?;
        let timeout_secs: u64 = parse_or(&lookup, "DB_CONNECTION_TIMEOUT_SECS", 5)?;
        let limits = PageLimits {
            default_limit: parse_or(&lookup, "DEFAULT_PAGE_LIMIT", 10)?,
            max_limit: parse_or(&lookup, "MAX_PAGE_LIMIT", 100)?,
        };

        if pool_size == 0 {
            return Err(invalid("DB_POOL_SIZE", "0", "must be at least 1"));
        }
        if limits.max_limit < 1 {
            return Err(invalid(
                "MAX_PAGE_LIMIT",
                &limits.max_limit.to_string(),
                "must be at least 1",
            ));
        }
        if limits.default_limit < 1 || limits.default_limit > limits.max_limit {
            return Err(invalid(
                "DEFAULT_PAGE_LIMIT",
                &limits.default_limit.to_string(),
                "must be between 1 and MAX_PAGE_LIMIT",
            ));
        }

        let mut converter = CurrencyConverter::default();
        for (name, currency) in [("RATE_NGN", CurrencyCode::NGN), ("RATE_GHS", CurrencyCode::GHS)] {
            if let Some(raw) = lookup(name) {
                let rate = BigDecimal::from_str(raw.trim())
                    .map_err(|e| invalid(name, &raw, &e.to_string()))?;
                converter = converter
                    .with_rate(currency, rate)
                    .map_err(|e| invalid(name, &raw, &e.to_string()))?;
            }
        }

        Ok(Self {
            database_url,
            host,
            port,
            pool_size,
            connection_timeout: Duration::from_secs(timeout_secs),
            limits,
            converter,
        })
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, &raw, &e.to_string())),
        None => Ok(default),
    }
}
