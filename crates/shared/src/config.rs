//! Application configuration management.

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Engagement subsystem configuration.
    #[serde(default)]
    pub engagement: EngagementConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Engagement subsystem configuration.
///
/// Presence, streaks, and the monthly leaderboard all reckon calendar days
/// in a single fixed reporting timezone.
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementConfig {
    /// IANA name of the reporting timezone (e.g. "Europe/Berlin").
    #[serde(default = "default_reporting_timezone")]
    pub reporting_timezone: String,
    /// Minimum rank drop before a rank-loss notification fires (1 = any drop).
    #[serde(default = "default_rank_loss_min_drop")]
    pub rank_loss_min_drop: u32,
    /// Number of entries returned in the leaderboard top list.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: u32,
    /// Interval between background leaderboard passes, in seconds.
    #[serde(default = "default_recompute_interval_secs")]
    pub recompute_interval_secs: u64,
}

fn default_reporting_timezone() -> String {
    "UTC".to_string()
}

fn default_rank_loss_min_drop() -> u32 {
    1
}

fn default_leaderboard_size() -> u32 {
    10
}

fn default_recompute_interval_secs() -> u64 {
    3600
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            reporting_timezone: default_reporting_timezone(),
            rank_loss_min_drop: default_rank_loss_min_drop(),
            leaderboard_size: default_leaderboard_size(),
            recompute_interval_secs: default_recompute_interval_secs(),
        }
    }
}

impl EngagementConfig {
    /// Parses the configured reporting timezone.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is not a known IANA timezone.
    pub fn reporting_tz(&self) -> AppResult<Tz> {
        self.reporting_timezone.parse::<Tz>().map_err(|_| {
            AppError::Validation(format!(
                "unknown reporting timezone: {}",
                self.reporting_timezone
            ))
        })
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CADENCE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_defaults() {
        let cfg = EngagementConfig::default();
        assert_eq!(cfg.reporting_timezone, "UTC");
        assert_eq!(cfg.rank_loss_min_drop, 1);
        assert_eq!(cfg.leaderboard_size, 10);
        assert_eq!(cfg.recompute_interval_secs, 3600);
    }

    #[test]
    fn test_reporting_tz_parses() {
        let cfg = EngagementConfig {
            reporting_timezone: "Europe/Berlin".to_string(),
            ..EngagementConfig::default()
        };
        assert_eq!(cfg.reporting_tz().unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_reporting_tz_rejects_unknown() {
        let cfg = EngagementConfig {
            reporting_timezone: "Mars/Olympus_Mons".to_string(),
            ..EngagementConfig::default()
        };
        assert!(matches!(
            cfg.reporting_tz(),
            Err(AppError::Validation(_))
        ));
    }
}
