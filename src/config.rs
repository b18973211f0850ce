// Configuration loading for the analytics service
// Values come from the process environment (optionally seeded from a .env file)

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

/// Default multiplier over the restaurant baseline before a wait-time alert fires
pub const DEFAULT_WAIT_ALERT_MULTIPLIER: f64 = 1.3;

/// Default trailing window for the restaurant-wide wait baseline
pub const DEFAULT_BASELINE_WINDOW_DAYS: i64 = 90;

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Tunables of the behavioral analytics engine
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Last wait must exceed `baseline * wait_alert_multiplier` to raise an alert
    pub wait_alert_multiplier: f64,
    pub baseline_window_days: i64,
    /// Restaurant local time offset used for preferred hour/day bucketing
    pub utc_offset_minutes: i32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            wait_alert_multiplier: DEFAULT_WAIT_ALERT_MULTIPLIER,
            baseline_window_days: DEFAULT_BASELINE_WINDOW_DAYS,
            utc_offset_minutes: 0,
        }
    }
}

impl AnalyticsConfig {
    pub fn local_offset(&self) -> FixedOffset {
        // Bounds are checked in validate(); UTC is the fallback for hand-built configs.
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.wait_alert_multiplier.is_finite() || self.wait_alert_multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                key: "ANALYTICS_WAIT_ALERT_MULTIPLIER",
                reason: format!("expected a number >= 1.0, got {}", self.wait_alert_multiplier),
            });
        }
        if self.baseline_window_days <= 0 {
            return Err(ConfigError::Invalid {
                key: "ANALYTICS_BASELINE_WINDOW_DAYS",
                reason: format!("expected a positive number of days, got {}", self.baseline_window_days),
            });
        }
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::Invalid {
                key: "ANALYTICS_UTC_OFFSET_MINUTES",
                reason: format!("offset {} is outside +/-14h", self.utc_offset_minutes),
            });
        }
        Ok(())
    }
}

/// Full service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub analytics: AnalyticsConfig,
}

impl AppConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080u16)?;
        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5u32)?;

        let analytics = AnalyticsConfig {
            wait_alert_multiplier: parse_or(
                &lookup,
                "ANALYTICS_WAIT_ALERT_MULTIPLIER",
                DEFAULT_WAIT_ALERT_MULTIPLIER,
            )?,
            baseline_window_days: parse_or(
                &lookup,
                "ANALYTICS_BASELINE_WINDOW_DAYS",
                DEFAULT_BASELINE_WINDOW_DAYS,
            )?,
            utc_offset_minutes: parse_or(&lookup, "ANALYTICS_UTC_OFFSET_MINUTES", 0i32)?,
        };
        analytics.validate()?;

        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
            analytics,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
