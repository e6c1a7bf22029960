//! Pipeline tasks: consumer, workers, and the config applier.

use crate::config::PipelineConfig;
use crate::router::worker_index;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vitals_baseline::BaselineRegistry;
use vitals_broker::{BrokerHandle, BrokerInbound};
use vitals_core::{Alert, EnrichedSample, RawSample, VitalParam};
use vitals_detector::DetectorEngine;
use vitals_store::VitalsStore;
use vitals_telemetry::metrics;

/// Shared handles every worker needs.
#[derive(Clone)]
pub struct IngestContext {
    pub engine: Arc<DetectorEngine>,
    pub registry: Arc<BaselineRegistry>,
    pub store: VitalsStore,
    pub broker: BrokerHandle,
}

/// Join handles for the spawned pipeline tasks.
pub struct PipelineHandles {
    pub consumer: JoinHandle<()>,
    pub workers: Vec<JoinHandle<()>>,
    pub config_applier: JoinHandle<()>,
}

impl PipelineHandles {
    /// Wait for every pipeline task to finish.
    pub async fn join(self) {
        let _ = self.consumer.await;
        for worker in self.workers {
            let _ = worker.await;
        }
        let _ = self.config_applier.await;
    }
}

/// Enrich a sample, classify it, and learn from its normal parameters.
///
/// Parameters flagged by the detector in this sample do not update the
/// registry; all other present detectable parameters do. This keeps
/// anomalies from poisoning the learned mean.
pub fn classify_and_learn(
    engine: &DetectorEngine,
    registry: &BaselineRegistry,
    sample: RawSample,
) -> (EnrichedSample, Vec<Alert>) {
    let enriched = EnrichedSample::enrich(sample);
    let alerts = engine.classify(&enriched);

    let flagged: HashSet<VitalParam> = alerts.iter().map(|a| a.parameter).collect();
    for (param, value) in enriched.sample.present_vitals() {
        if !flagged.contains(&param) {
            registry.update(
                &enriched.sample.user_id,
                enriched.activity_level,
                param,
                value,
            );
        }
    }

    (enriched, alerts)
}

/// Spawn the consumer, the worker pool, and the config applier.
///
/// The consumer ends when the gateway closes the raw channel (shutdown or
/// gateway failure); dropping the worker senders then lets each worker
/// drain its queue to empty and exit.
pub fn spawn_pipeline(
    config: &PipelineConfig,
    ctx: IngestContext,
    inbound: BrokerInbound,
) -> PipelineHandles {
    let BrokerInbound {
        mut raw_rx,
        mut config_rx,
    } = inbound;

    let worker_count = config.workers;
    metrics::PIPELINE_WORKERS.set(worker_count as i64);

    let mut senders = Vec::with_capacity(worker_count);
    let mut workers = Vec::with_capacity(worker_count);
    for worker_id in 0..worker_count {
        let (tx, rx) = mpsc::channel::<RawSample>(config.queue_capacity);
        senders.push(tx);
        workers.push(tokio::spawn(run_worker(worker_id, rx, ctx.clone())));
    }

    let consumer = tokio::spawn(async move {
        while let Some(payload) = raw_rx.recv().await {
            let sample = match RawSample::from_json(&payload) {
                Ok(sample) => sample,
                Err(e) => {
                    metrics::PARSE_ERRORS_TOTAL.inc();
                    warn!(?e, "Dropping invalid raw sample");
                    continue;
                }
            };

            metrics::SAMPLES_INGESTED_TOTAL.inc();
            let idx = worker_index(&sample.user_id, worker_count);
            // A full worker queue blocks here: backpressure propagates to
            // the broker event loop instead of dropping samples.
            if senders[idx].send(sample).await.is_err() {
                warn!(worker = idx, "Worker queue closed, stopping consumer");
                break;
            }
        }
        info!("Ingestion consumer finished");
        // Senders drop here; workers drain and exit.
    });

    let engine = Arc::clone(&ctx.engine);
    let config_applier = tokio::spawn(async move {
        while let Some(selection) = config_rx.recv().await {
            // No re-echo here: the API path already published this message,
            // and echoing inbound config would bounce on our own
            // subscription forever. Applying an identical selection is a
            // no-op swap.
            match engine.switch(selection) {
                Ok(installed) => {
                    debug!(
                        detector_type = %installed.detector_type,
                        user_id = %installed.user_id,
                        "Detector selection applied from config topic"
                    );
                }
                Err(e) => warn!(?e, "Ignoring invalid config message"),
            }
        }
    });

    PipelineHandles {
        consumer,
        workers,
        config_applier,
    }
}

async fn run_worker(worker_id: usize, mut rx: mpsc::Receiver<RawSample>, ctx: IngestContext) {
    info!(worker = worker_id, "Ingestion worker started");

    while let Some(sample) = rx.recv().await {
        let (enriched, alerts) = classify_and_learn(&ctx.engine, &ctx.registry, sample);

        // Persistence, alert fan-out, and republication are independent;
        // each failure is logged and the rest proceeds.
        if let Err(e) = ctx.store.insert_vitals(&enriched).await {
            metrics::STORE_WRITE_FAILURES_TOTAL
                .with_label_values(&["vitals"])
                .inc();
            warn!(?e, user_id = %enriched.sample.user_id, "Vitals insert failed, skipping");
        }

        for alert in &alerts {
            metrics::ALERTS_TOTAL
                .with_label_values(&[
                    alert.parameter.as_str(),
                    alert.severity.as_str(),
                    alert.detector_type.as_str(),
                ])
                .inc();

            if let Err(e) = ctx.store.insert_alert(alert).await {
                metrics::STORE_WRITE_FAILURES_TOTAL
                    .with_label_values(&["alerts"])
                    .inc();
                warn!(?e, alert_id = alert.id, "Alert insert failed, skipping");
            }
            ctx.broker.publish_alert(alert).await;
        }

        ctx.broker.publish_enriched(&enriched).await;
    }

    info!(worker = worker_id, "Ingestion worker drained and stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::{ActivityLevel, DetectorSelection};

    fn engine_and_registry() -> (DetectorEngine, Arc<BaselineRegistry>) {
        let registry = Arc::new(BaselineRegistry::new());
        let engine =
            DetectorEngine::new(Arc::clone(&registry), DetectorSelection::default()).unwrap();
        (engine, registry)
    }

    fn raw(user_id: &str, heart_rate: f64, temperature: f64) -> RawSample {
        RawSample {
            timestamp: "2025-03-01T08:30:00Z".parse().unwrap(),
            user_id: user_id.to_string(),
            activity: Some(20.0),
            heart_rate: Some(heart_rate),
            blood_pressure_systolic: None,
            blood_pressure_diastolic: None,
            temperature: Some(temperature),
            oxygen_saturation: None,
        }
    }

    #[test]
    fn test_normal_sample_learns_all_present_params() {
        let (engine, registry) = engine_and_registry();
        let (enriched, alerts) =
            classify_and_learn(&engine, &registry, raw("alice", 72.0, 36.8));

        assert!(alerts.is_empty());
        assert_eq!(enriched.activity_level, ActivityLevel::Low);
        assert_eq!(
            registry
                .cell("alice", ActivityLevel::Low, VitalParam::HeartRate)
                .unwrap()
                .count,
            1
        );
        assert_eq!(
            registry
                .cell("alice", ActivityLevel::Low, VitalParam::Temperature)
                .unwrap()
                .count,
            1
        );
        // Absent parameters never create cells.
        assert!(registry
            .cell("alice", ActivityLevel::Low, VitalParam::OxygenSaturation)
            .is_none());
    }

    #[test]
    fn test_flagged_parameter_does_not_learn() {
        let (engine, registry) = engine_and_registry();
        // Heart rate far out of band, temperature normal.
        let (_, alerts) = classify_and_learn(&engine, &registry, raw("alice", 150.0, 36.8));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].parameter, VitalParam::HeartRate);
        assert!(registry
            .cell("alice", ActivityLevel::Low, VitalParam::HeartRate)
            .is_none());
        // The unflagged parameter still learns.
        assert_eq!(
            registry
                .cell("alice", ActivityLevel::Low, VitalParam::Temperature)
                .unwrap()
                .count,
            1
        );
    }

    #[test]
    fn test_enrichment_preserves_fields() {
        let (engine, registry) = engine_and_registry();
        let input = raw("alice", 72.0, 36.8);
        let (enriched, _) = classify_and_learn(&engine, &registry, input.clone());

        assert_eq!(enriched.sample, input);
        assert_eq!(enriched.activity_level, ActivityLevel::Low);
    }
}
