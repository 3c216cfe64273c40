//! Configuration module for the office admin backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::sync::{Debouncer, FilterState};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_PAGE_LIMIT: u32 = 50;
const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Page size list controllers start with
    pub page_limit: u32,
    /// Delay used to coalesce keystroke-driven filter edits
    pub debounce: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("ADMIN_API_PSK").ok().filter(|s| !s.is_empty());

        let db_path = env::var("ADMIN_DB_PATH")
            .unwrap_or_else(|_| "./data/admin.sqlite".to_string())
            .into();

        let bind_addr = parse_or_default("ADMIN_BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));

        let log_level = env::var("ADMIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let page_limit = parse_or_default("ADMIN_PAGE_LIMIT", Some(DEFAULT_PAGE_LIMIT))
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT);

        let debounce_ms =
            parse_or_default("ADMIN_DEBOUNCE_MS", Some(DEFAULT_DEBOUNCE_MS)).unwrap_or(DEFAULT_DEBOUNCE_MS);

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            page_limit,
            debounce: Duration::from_millis(debounce_ms),
        }
    }

    /// Filters a list controller starts from: page 1 at the configured page size.
    pub fn list_defaults(&self) -> FilterState {
        FilterState::with_limit(self.page_limit)
    }

    /// Debouncer for keystroke-driven filter edits.
    pub fn debouncer(&self) -> Debouncer {
        Debouncer::new(self.debounce)
    }
}

/// Parse an environment variable, falling back to `default` (with a warning) when it is malformed.
fn parse_or_default<T: std::str::FromStr>(key: &str, default: Option<T>) -> Option<T> {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases live in one test since they mutate process-wide environment.
    #[test]
    fn test_config_defaults_and_fallbacks() {
        env::remove_var("ADMIN_API_PSK");
        env::remove_var("ADMIN_DB_PATH");
        env::remove_var("ADMIN_BIND_ADDR");
        env::remove_var("ADMIN_LOG_LEVEL");
        env::remove_var("ADMIN_PAGE_LIMIT");
        env::remove_var("ADMIN_DEBOUNCE_MS");

        let config = Config::from_env();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/admin.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.page_limit, 50);
        assert_eq!(config.debounce, Duration::from_millis(300));

        env::set_var("ADMIN_BIND_ADDR", "not-an-address");
        env::set_var("ADMIN_PAGE_LIMIT", "0");
        env::set_var("ADMIN_DEBOUNCE_MS", "150");

        let config = Config::from_env();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.page_limit, 50);
        assert_eq!(config.debounce, Duration::from_millis(150));

        env::remove_var("ADMIN_BIND_ADDR");
        env::remove_var("ADMIN_PAGE_LIMIT");
        env::remove_var("ADMIN_DEBOUNCE_MS");
    }

    #[test]
    fn test_client_defaults_follow_config() {
        let config = Config {
            api_psk: None,
            db_path: PathBuf::from("unused.sqlite"),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            page_limit: 20,
            debounce: Duration::from_millis(120),
        };

        assert_eq!(config.debouncer().delay(), Duration::from_millis(120));

        let filters = config.list_defaults();
        assert_eq!(filters.page(), 1);
        assert_eq!(filters.limit(), 20);
    }
}
