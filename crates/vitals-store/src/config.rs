//! Database connection configuration.

use serde::{Deserialize, Serialize};

/// Postgres connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Fixed pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// Per-statement timeout in milliseconds.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_name() -> String {
    "health_monitoring".to_string()
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_pool_size() -> u32 {
    8
}

fn default_statement_timeout_ms() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            name: default_name(),
            user: default_user(),
            password: String::new(),
            pool_size: default_pool_size(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.statement_timeout_ms, 5000);
        assert_eq!(config.port, 5432);
    }
}
