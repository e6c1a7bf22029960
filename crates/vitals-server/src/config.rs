//! Application configuration.
//!
//! Layered: serde defaults, then an optional TOML file, then environment
//! variables. The environment contract is fixed (MQTT_*, DB_*, FLASK_PORT,
//! LLM_*) so the backend drops into existing deployments unchanged.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;
use vitals_api::{HttpConfig, LlmConfig};
use vitals_broker::BrokerConfig;
use vitals_pipeline::PipelineConfig;
use vitals_store::StoreConfig;

/// Full application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub database: StoreConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Load from the given file when it exists, then apply environment
    /// overrides.
    pub fn load(path: &str) -> AppResult<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            warn!(path, "Config file not found, using defaults");
            Self::default()
        };
        config.apply_overrides_from(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load from a specific TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply the fixed environment-variable contract on top of the file
    /// values. Unparseable numeric variables are logged and ignored.
    pub fn apply_overrides_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("MQTT_BROKER") {
            self.broker.host = v;
        }
        if let Some(v) = get("MQTT_PORT") {
            parse_into(&mut self.broker.port, "MQTT_PORT", &v);
        }
        if let Some(v) = get("MQTT_RAW_TOPIC") {
            self.broker.topics.raw_vitals = v;
        }
        if let Some(v) = get("MQTT_VITALS_TOPIC") {
            self.broker.topics.vitals = v;
        }
        if let Some(v) = get("MQTT_ALERTS_TOPIC") {
            self.broker.topics.alerts = v;
        }
        if let Some(v) = get("MQTT_CONFIG_TOPIC") {
            self.broker.topics.config = v;
        }

        if let Some(v) = get("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = get("DB_PORT") {
            parse_into(&mut self.database.port, "DB_PORT", &v);
        }
        if let Some(v) = get("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = get("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = get("DB_PASSWORD") {
            self.database.password = v;
        }

        if let Some(v) = get("FLASK_PORT") {
            parse_into(&mut self.http.port, "FLASK_PORT", &v);
        }

        if let Some(v) = get("LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = get("LLM_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = get("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("LLM_TEMPERATURE") {
            parse_into(&mut self.llm.temperature, "LLM_TEMPERATURE", &v);
        }
    }
}

fn parse_into<T: std::str::FromStr>(slot: &mut T, name: &str, raw: &str) {
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(_) => warn!(name, raw, "Ignoring unparseable environment override"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.broker.host, "localhost");
        assert_eq!(config.http.port, 5000);
        assert_eq!(config.pipeline.workers, 4);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.database.pool_size, config.database.pool_size);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MQTT_BROKER", "broker.ward7"),
            ("MQTT_PORT", "8883"),
            ("MQTT_RAW_TOPIC", "ward7/raw"),
            ("DB_HOST", "db.ward7"),
            ("DB_PASSWORD", "hunter2"),
            ("FLASK_PORT", "9100"),
            ("LLM_TEMPERATURE", "0.7"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.broker.host, "broker.ward7");
        assert_eq!(config.broker.port, 8883);
        assert_eq!(config.broker.topics.raw_vitals, "ward7/raw");
        // Untouched topics keep their values.
        assert_eq!(config.broker.topics.alerts, "health/alerts");
        assert_eq!(config.database.host, "db.ward7");
        assert_eq!(config.database.password, "hunter2");
        assert_eq!(config.http.port, 9100);
        assert!((config.llm.temperature - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_numeric_override_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(|name| {
            (name == "MQTT_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.broker.port, 1883);
    }
}
