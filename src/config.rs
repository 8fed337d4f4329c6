//! Application configuration loaded from environment variables.

use std::env;

/// Currency used by penalty rules that do not name one.
pub const DEFAULT_CURRENCY: &str = "VND";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub log_filter: String,
    /// UTC offset of the event's local calendar, used to decide "today"
    pub event_utc_offset_hours: i32,
    /// Ingestion requests allowed per user per window
    pub ingest_rate_limit: u32,
    /// Length of the ingestion rate window
    pub ingest_rate_window_secs: u64,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let event_utc_offset_hours = parse_var("EVENT_UTC_OFFSET_HOURS", 7)?;
        if !(-23..=23).contains(&event_utc_offset_hours) {
            return Err(ConfigError::Invalid {
                name: "EVENT_UTC_OFFSET_HOURS",
                value: event_utc_offset_hours.to_string(),
            });
        }

        Ok(Self {
            port: parse_var("PORT", 8080)?,
            log_filter: env::var("LOG_FILTER").unwrap_or_else(|_| "info".to_string()),
            event_utc_offset_hours,
            ingest_rate_limit: parse_var("INGEST_RATE_LIMIT", 60)?,
            ingest_rate_window_secs: parse_var("INGEST_RATE_WINDOW_SECS", 60)?,
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            log_filter: "debug".to_string(),
            event_utc_offset_hours: 7,
            ingest_rate_limit: 1000,
            ingest_rate_window_secs: 60,
        }
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::Missing(name)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
