//! Runtime configuration for the analytics runners.
//!
//! Everything is sourced from the environment with stated defaults, so the
//! binaries run with zero setup: a database file next to the process, a
//! ./data directory of CSV drops, a localhost bind address.

use std::env;

/// Bounded connection pool size shared by the query handlers.
pub const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database location. Accepts any SQLite path or URI.
    pub db_path: String,
    /// Maximum connections held by the pool.
    pub pool_size: u32,
    /// Directory scanned for activities_*.csv drops.
    pub data_dir: String,
    /// Bind address for the API server.
    pub bind: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "analytics.db".into(),
            pool_size: DEFAULT_POOL_SIZE,
            data_dir: "./data".into(),
            bind: "127.0.0.1:8000".into(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the environment. Anything unset or
    /// unparseable falls back to the default.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        Self {
            db_path: env::var("ANALYTICS_DB").unwrap_or(defaults.db_path),
            pool_size: env::var("ANALYTICS_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pool_size),
            data_dir: env::var("ANALYTICS_DATA_DIR").unwrap_or(defaults.data_dir),
            bind: env::var("ANALYTICS_BIND").unwrap_or(defaults.bind),
        }
    }
}
