//! Prometheus metrics for the monitoring backend.
//!
//! Provides observability for:
//! - Broker connection and publish health
//! - Ingestion throughput and parse drops
//! - Alert emission by parameter/severity/detector
//! - Store write failures
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent
//! failure. These panics only occur during static initialization, never at
//! runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_int_gauge, Counter,
    CounterVec, Gauge, IntGauge,
};

/// Broker connection state (1 = connected, 0 = disconnected).
pub static BROKER_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "vitals_broker_connected",
        "MQTT broker connection state (1=connected)"
    )
    .unwrap()
});

/// Total broker reconnection attempts.
pub static BROKER_RECONNECTS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "vitals_broker_reconnects_total",
        "Total MQTT reconnection attempts"
    )
    .unwrap()
});

/// Total publish failures, by topic role.
pub static BROKER_PUBLISH_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vitals_broker_publish_failures_total",
        "Total failed broker publishes",
        &["topic"]
    )
    .unwrap()
});

/// Total samples accepted into the pipeline.
pub static SAMPLES_INGESTED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "vitals_samples_ingested_total",
        "Total raw samples accepted into the ingestion pipeline"
    )
    .unwrap()
});

/// Total inbound payloads dropped as unparseable or invalid.
pub static PARSE_ERRORS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "vitals_parse_errors_total",
        "Total inbound payloads dropped as unparseable or invalid"
    )
    .unwrap()
});

/// Total alerts emitted.
pub static ALERTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vitals_alerts_total",
        "Total anomaly alerts emitted",
        &["parameter", "severity", "detector"]
    )
    .unwrap()
});

/// Total store writes that failed and were skipped.
pub static STORE_WRITE_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vitals_store_write_failures_total",
        "Total best-effort store writes that failed",
        &["table"]
    )
    .unwrap()
});

/// Current ingestion worker count.
pub static PIPELINE_WORKERS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "vitals_pipeline_workers",
        "Number of running ingestion workers"
    )
    .unwrap()
});

/// Render the default registry in Prometheus text exposition format.
pub fn gather() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buf) {
        tracing::warn!(?e, "Failed to encode metrics");
    }
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_once() {
        SAMPLES_INGESTED_TOTAL.inc();
        PARSE_ERRORS_TOTAL.inc();
        ALERTS_TOTAL
            .with_label_values(&["heart_rate", "high", "range_based"])
            .inc();
        assert!(gather().contains("vitals_samples_ingested_total"));
    }
}
