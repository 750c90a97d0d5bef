/// Configuration management for Community Feed Service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Feed paging limits
    pub feed: FeedConfig,
    /// Like counter reconciliation
    pub reconciler: ReconcilerConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// Emit JSON log lines instead of the human-readable format
    pub json_logs: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Page size when the caller does not ask for one
    pub default_limit: i64,
    /// Upper bound on the page size
    pub max_limit: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: default_feed_limit(),
            max_limit: default_feed_max_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    pub enabled: bool,
    /// Seconds between reconciliation passes
    pub interval_secs: u64,
    /// Max posts repaired per pass
    pub batch_size: i64,
}

impl ReconcilerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_reconcile_interval_secs(),
            batch_size: default_reconcile_batch_size(),
        }
    }
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_feed_limit() -> i64 {
    50
}

fn default_feed_max_limit() -> i64 {
    100
}

fn default_reconcile_interval_secs() -> u64 {
    300
}

fn default_reconcile_batch_size() -> i64 {
    500
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_parse("PORT").unwrap_or(8006),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
            max_connections: env_parse("DB_MAX_CONNECTIONS")
                .unwrap_or_else(default_max_connections),
            min_connections: env_parse("DB_MIN_CONNECTIONS")
                .unwrap_or_else(default_min_connections),
        };

        let feed = FeedConfig {
            default_limit: env_parse("FEED_DEFAULT_LIMIT").unwrap_or_else(default_feed_limit),
            max_limit: env_parse("FEED_MAX_LIMIT").unwrap_or_else(default_feed_max_limit),
        };
        if feed.default_limit < 1 || feed.default_limit > feed.max_limit {
            anyhow::bail!(
                "FEED_DEFAULT_LIMIT must be between 1 and FEED_MAX_LIMIT ({}), got {}",
                feed.max_limit,
                feed.default_limit
            );
        }

        let reconciler = ReconcilerConfig {
            enabled: env_flag("COUNTER_RECONCILE_ENABLED", true),
            interval_secs: env_parse("COUNTER_RECONCILE_INTERVAL_SECS")
                .unwrap_or_else(default_reconcile_interval_secs),
            batch_size: env_parse("COUNTER_RECONCILE_BATCH_SIZE")
                .unwrap_or_else(default_reconcile_batch_size),
        };

        Ok(Config {
            app,
            database,
            feed,
            reconciler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "DATABASE_URL",
        "PORT",
        "FEED_DEFAULT_LIMIT",
        "FEED_MAX_LIMIT",
        "COUNTER_RECONCILE_ENABLED",
        "COUNTER_RECONCILE_INTERVAL_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.http_port, 8006);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 5);
        assert_eq!(config.feed.default_limit, 50);
        assert_eq!(config.feed.max_limit, 100);
        assert!(config.reconciler.enabled);
        assert_eq!(config.reconciler.interval(), Duration::from_secs(300));
        assert_eq!(config.reconciler.batch_size, 500);
    }

    #[test]
    #[serial]
    fn test_missing_database_url() {
        clear_env();
        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_overrides_and_limit_check() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("COUNTER_RECONCILE_ENABLED", "false");
        std::env::set_var("COUNTER_RECONCILE_INTERVAL_SECS", "30");
        std::env::set_var("FEED_DEFAULT_LIMIT", "20");

        let config = Config::from_env().unwrap();
        assert!(!config.reconciler.enabled);
        assert_eq!(config.reconciler.interval_secs, 30);
        assert_eq!(config.feed.default_limit, 20);

        std::env::set_var("FEED_DEFAULT_LIMIT", "500");
        assert!(Config::from_env().is_err());

        clear_env();
    }
}
