//! Application wiring and lifecycle.
//!
//! Startup order: store (schema bootstrap) first, then the shared state,
//! then the broker gateway, the ingestion pipeline, and the API server.
//! Shutdown is a single cancellation: the gateway stops feeding the
//! pipeline, workers drain their queues, and the API server finishes
//! in-flight requests inside a hard grace window.

use crate::config::AppConfig;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vitals_api::{ApiContext, LlmClient};
use vitals_baseline::BaselineRegistry;
use vitals_broker::start_gateway;
use vitals_core::DetectorSelection;
use vitals_detector::DetectorEngine;
use vitals_pipeline::{spawn_pipeline, IngestContext};
use vitals_store::VitalsStore;
use vitals_trends::TrendAggregator;

/// Shutdown grace for in-flight work.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Run the backend until interrupted.
pub async fn run(config: AppConfig) -> Result<()> {
    config.pipeline.validate()?;

    let shutdown = CancellationToken::new();

    // Store first: schema bootstrap must precede ingestion.
    let store = VitalsStore::connect(&config.database).await?;

    // Process-wide shared state.
    let registry = Arc::new(BaselineRegistry::new());
    let engine = Arc::new(DetectorEngine::new(
        Arc::clone(&registry),
        DetectorSelection::default(),
    )?);

    // Broker gateway and ingestion pipeline.
    let (broker, inbound, _inbound_stats) =
        start_gateway(config.broker.clone(), shutdown.clone());
    let pipeline = spawn_pipeline(
        &config.pipeline,
        IngestContext {
            engine: Arc::clone(&engine),
            registry: Arc::clone(&registry),
            store: store.clone(),
            broker: broker.clone(),
        },
        inbound,
    );

    // Query/control API.
    let api_ctx = ApiContext {
        engine,
        registry,
        store: store.clone(),
        trends: TrendAggregator::new(store),
        broker,
        llm: LlmClient::new(config.llm.clone()),
    };
    let api_task = tokio::spawn(vitals_api::run_server(
        api_ctx,
        config.http.clone(),
        shutdown.clone(),
    ));

    info!("Backend running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    shutdown.cancel();

    let drain = async {
        pipeline.join().await;
        match api_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(?e, "API server exited with error"),
            Err(e) => warn!(?e, "API task join failed"),
        }
    };

    if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
        warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Shutdown grace elapsed, forcing exit"
        );
    } else {
        info!("Shutdown complete");
    }

    Ok(())
}
