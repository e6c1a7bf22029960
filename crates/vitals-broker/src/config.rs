//! Broker connection and topic configuration.

use serde::{Deserialize, Serialize};

/// Topic names for the four broker surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Inbound raw samples.
    #[serde(default = "default_raw_topic")]
    pub raw_vitals: String,
    /// Outbound enriched samples.
    #[serde(default = "default_vitals_topic")]
    pub vitals: String,
    /// Outbound alerts.
    #[serde(default = "default_alerts_topic")]
    pub alerts: String,
    /// Bidirectional detector selection.
    #[serde(default = "default_config_topic")]
    pub config: String,
}

fn default_raw_topic() -> String {
    "health/raw_vitals".to_string()
}

fn default_vitals_topic() -> String {
    "health/vitals".to_string()
}

fn default_alerts_topic() -> String {
    "health/alerts".to_string()
}

fn default_config_topic() -> String {
    "health/config".to_string()
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            raw_vitals: default_raw_topic(),
            vitals: default_vitals_topic(),
            alerts: default_alerts_topic(),
            config: default_config_topic(),
        }
    }
}

/// Broker connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker hostname.
    #[serde(default = "default_host")]
    pub host: String,
    /// Broker port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// MQTT client id prefix; a random suffix is appended so restarts
    /// never collide with a lingering session.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Keep-alive interval in seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// Reconnect backoff cap in seconds.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Inbound raw-sample channel capacity.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Topic names.
    #[serde(default)]
    pub topics: TopicConfig,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "vitals-backend".to_string()
}

fn default_keep_alive_secs() -> u64 {
    30
}

fn default_max_backoff_secs() -> u64 {
    30
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            channel_capacity: default_channel_capacity(),
            topics: TopicConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_topics() {
        let config = BrokerConfig::default();
        assert_eq!(config.topics.raw_vitals, "health/raw_vitals");
        assert_eq!(config.topics.vitals, "health/vitals");
        assert_eq!(config.topics.alerts, "health/alerts");
        assert_eq!(config.topics.config, "health/config");
        assert_eq!(config.port, 1883);
        assert_eq!(config.max_backoff_secs, 30);
    }

    #[test]
    fn test_toml_overrides() {
        let config: BrokerConfig = toml::from_str(
            r#"
            host = "broker.internal"
            port = 8883

            [topics]
            raw_vitals = "ward7/raw"
            "#,
        )
        .unwrap();
        assert_eq!(config.host, "broker.internal");
        assert_eq!(config.port, 8883);
        assert_eq!(config.topics.raw_vitals, "ward7/raw");
        // Unset topics keep their defaults.
        assert_eq!(config.topics.alerts, "health/alerts");
    }
}
