//! Shared handler state.

use crate::llm::LlmClient;
use std::sync::Arc;
use vitals_baseline::BaselineRegistry;
use vitals_broker::BrokerHandle;
use vitals_detector::DetectorEngine;
use vitals_store::VitalsStore;
use vitals_trends::TrendAggregator;

/// Everything the handlers need, cheaply cloneable.
#[derive(Clone)]
pub struct ApiContext {
    pub engine: Arc<DetectorEngine>,
    pub registry: Arc<BaselineRegistry>,
    pub store: VitalsStore,
    pub trends: TrendAggregator,
    pub broker: BrokerHandle,
    pub llm: LlmClient,
}
