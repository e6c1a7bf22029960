//! Gateway task and publish handle.
//!
//! One background task owns the MQTT event loop: it re-subscribes on every
//! connack (idempotent), forwards raw-sample payloads and parsed config
//! messages onto bounded channels, and sleeps through a bounded exponential
//! backoff on connection errors. Publishing goes through a cheap cloneable
//! handle; publish failures are logged and dropped.

use crate::config::BrokerConfig;
use crate::error::BrokerResult;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vitals_core::{Alert, DetectorSelection, EnrichedSample};
use vitals_telemetry::metrics;

/// Counters for inbound traffic handling.
#[derive(Debug, Default)]
pub struct InboundStats {
    /// Raw payloads forwarded to the pipeline.
    pub raw_forwarded: AtomicU64,
    /// Config payloads that failed to parse and were dropped.
    pub config_dropped: AtomicU64,
    /// Publishes received on topics we never subscribed to.
    pub unexpected_topic: AtomicU64,
}

impl InboundStats {
    pub fn raw_forwarded(&self) -> u64 {
        self.raw_forwarded.load(Ordering::Relaxed)
    }

    pub fn config_dropped(&self) -> u64 {
        self.config_dropped.load(Ordering::Relaxed)
    }
}

/// Inbound ends handed to the ingestion pipeline.
pub struct BrokerInbound {
    /// Raw sample payloads from the raw-vitals topic.
    pub raw_rx: mpsc::Receiver<Vec<u8>>,
    /// Parsed detector selections from the config topic.
    pub config_rx: mpsc::Receiver<DetectorSelection>,
}

/// Cloneable publish handle.
#[derive(Clone)]
pub struct BrokerHandle {
    client: AsyncClient,
    config: Arc<BrokerConfig>,
}

impl BrokerHandle {
    /// Publish the enriched sample on the vitals topic (fire-and-forget).
    pub async fn publish_enriched(&self, sample: &EnrichedSample) {
        self.publish_json(&self.config.topics.vitals, sample).await;
    }

    /// Publish an alert on the alerts topic (fire-and-forget).
    pub async fn publish_alert(&self, alert: &Alert) {
        self.publish_json(&self.config.topics.alerts, alert).await;
    }

    /// Echo a detector selection on the config topic (fire-and-forget).
    pub async fn publish_config(&self, selection: &DetectorSelection) {
        self.publish_json(&self.config.topics.config, selection).await;
    }

    async fn publish_json<T: Serialize>(&self, topic: &str, value: &T) {
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => payload,
            Err(e) => {
                error!(?e, topic, "Failed to serialize outbound payload");
                return;
            }
        };
        if let Err(e) = self
            .client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
        {
            warn!(?e, topic, "Publish failed, dropping message");
            metrics::BROKER_PUBLISH_FAILURES_TOTAL
                .with_label_values(&[topic])
                .inc();
        }
    }
}

/// Start the gateway.
///
/// Returns the publish handle, the inbound channel ends, and the shared
/// inbound stats. The background task runs until the token is cancelled.
pub fn start_gateway(
    config: BrokerConfig,
    shutdown: CancellationToken,
) -> (BrokerHandle, BrokerInbound, Arc<InboundStats>) {
    let client_id = format!("{}-{}", config.client_id, &uuid::Uuid::new_v4().simple());
    let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

    let (client, eventloop) = AsyncClient::new(options, 64);

    let (raw_tx, raw_rx) = mpsc::channel(config.channel_capacity);
    let (config_tx, config_rx) = mpsc::channel(16);
    let stats = Arc::new(InboundStats::default());

    let config = Arc::new(config);
    let handle = BrokerHandle {
        client: client.clone(),
        config: Arc::clone(&config),
    };

    tokio::spawn(run_event_loop(
        client,
        eventloop,
        Arc::clone(&config),
        raw_tx,
        config_tx,
        Arc::clone(&stats),
        shutdown,
    ));

    (
        handle,
        BrokerInbound { raw_rx, config_rx },
        stats,
    )
}

/// Backoff delay for the nth consecutive failure: 1, 2, 4, … capped.
fn backoff_delay(failures: u32, cap_secs: u64) -> Duration {
    let exponent = failures.saturating_sub(1).min(10);
    Duration::from_secs((1u64 << exponent).min(cap_secs))
}

async fn run_event_loop(
    client: AsyncClient,
    mut eventloop: rumqttc::EventLoop,
    config: Arc<BrokerConfig>,
    raw_tx: mpsc::Sender<Vec<u8>>,
    config_tx: mpsc::Sender<DetectorSelection>,
    stats: Arc<InboundStats>,
    shutdown: CancellationToken,
) {
    info!(host = %config.host, port = config.port, "Connecting to broker");
    let mut failures = 0u32;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Broker gateway shutting down");
                let _ = client.disconnect().await;
                return;
            }
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    failures = 0;
                    metrics::BROKER_CONNECTED.set(1.0);
                    info!("Broker connected");
                    if let Err(e) = resubscribe(&client, &config).await {
                        warn!(?e, "Re-subscription failed; will retry on reconnect");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    handle_publish(
                        &config,
                        &publish.topic,
                        &publish.payload,
                        &raw_tx,
                        &config_tx,
                        &stats,
                    )
                    .await;
                }
                Ok(_) => {}
                Err(e) => {
                    failures += 1;
                    metrics::BROKER_CONNECTED.set(0.0);
                    metrics::BROKER_RECONNECTS_TOTAL.inc();
                    let delay = backoff_delay(failures, config.max_backoff_secs);
                    warn!(
                        ?e,
                        attempt = failures,
                        delay_secs = delay.as_secs(),
                        "Broker connection error, reconnecting"
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

/// Subscribe to the inbound topics. Safe to repeat after every reconnect.
async fn resubscribe(client: &AsyncClient, config: &BrokerConfig) -> BrokerResult<()> {
    client
        .subscribe(&config.topics.raw_vitals, QoS::AtLeastOnce)
        .await?;
    client
        .subscribe(&config.topics.config, QoS::AtLeastOnce)
        .await?;
    info!(
        raw = %config.topics.raw_vitals,
        config = %config.topics.config,
        "Subscribed to inbound topics"
    );
    Ok(())
}

async fn handle_publish(
    config: &BrokerConfig,
    topic: &str,
    payload: &[u8],
    raw_tx: &mpsc::Sender<Vec<u8>>,
    config_tx: &mpsc::Sender<DetectorSelection>,
    stats: &InboundStats,
) {
    if topic == config.topics.raw_vitals {
        // A full channel blocks here: backpressure, no in-process drops.
        if raw_tx.send(payload.to_vec()).await.is_err() {
            warn!("Raw sample receiver dropped");
            return;
        }
        stats.raw_forwarded.fetch_add(1, Ordering::Relaxed);
    } else if topic == config.topics.config {
        match serde_json::from_slice::<DetectorSelection>(payload) {
            Ok(selection) => {
                if config_tx.send(selection).await.is_err() {
                    warn!("Config receiver dropped");
                }
            }
            Err(e) => {
                stats.config_dropped.fetch_add(1, Ordering::Relaxed);
                metrics::PARSE_ERRORS_TOTAL.inc();
                warn!(?e, "Unparseable config payload dropped");
            }
        }
    } else {
        stats.unexpected_topic.fetch_add(1, Ordering::Relaxed);
        debug!(topic, "Publish on unexpected topic ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        let delays: Vec<u64> = (1..=8)
            .map(|n| backoff_delay(n, 30).as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[test]
    fn test_backoff_exponent_saturates() {
        // Large attempt counts must not shift past u64 width.
        assert_eq!(backoff_delay(1000, 30).as_secs(), 30);
    }

    #[tokio::test]
    async fn test_config_topic_parse_and_drop() {
        let config = BrokerConfig::default();
        let (raw_tx, _raw_rx) = mpsc::channel(4);
        let (config_tx, mut config_rx) = mpsc::channel(4);
        let stats = InboundStats::default();

        handle_publish(
            &config,
            "health/config",
            br#"{"detector_type": "user_baseline", "user_id": "alice"}"#,
            &raw_tx,
            &config_tx,
            &stats,
        )
        .await;
        let selection = config_rx.recv().await.unwrap();
        assert_eq!(selection.user_id, "alice");

        handle_publish(&config, "health/config", b"not json", &raw_tx, &config_tx, &stats)
            .await;
        assert_eq!(stats.config_dropped(), 1);
    }

    #[tokio::test]
    async fn test_raw_topic_forwards_bytes() {
        let config = BrokerConfig::default();
        let (raw_tx, mut raw_rx) = mpsc::channel(4);
        let (config_tx, _config_rx) = mpsc::channel(4);
        let stats = InboundStats::default();

        handle_publish(
            &config,
            "health/raw_vitals",
            b"{\"timestamp\": \"2025-03-01T08:30:00Z\"}",
            &raw_tx,
            &config_tx,
            &stats,
        )
        .await;
        assert!(raw_rx.recv().await.is_some());
        assert_eq!(stats.raw_forwarded(), 1);
    }

    #[tokio::test]
    async fn test_unknown_topic_ignored() {
        let config = BrokerConfig::default();
        let (raw_tx, mut raw_rx) = mpsc::channel(4);
        let (config_tx, _config_rx) = mpsc::channel(4);
        let stats = InboundStats::default();

        handle_publish(&config, "health/other", b"{}", &raw_tx, &config_tx, &stats).await;
        assert!(raw_rx.try_recv().is_err());
        assert_eq!(stats.unexpected_topic.load(Ordering::Relaxed), 1);
    }
}
