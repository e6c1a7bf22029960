//! MQTT gateway.
//!
//! Maintains one logical connection to the broker: subscribes to the
//! raw-vitals and config topics, publishes enriched samples, alerts, and
//! config echoes, and reconnects with bounded exponential backoff.
//!
//! Inbound traffic is forwarded on bounded channels; a full raw channel
//! exerts backpressure on the event loop rather than dropping in-process.

pub mod config;
pub mod error;
pub mod gateway;

pub use config::{BrokerConfig, TopicConfig};
pub use error::{BrokerError, BrokerResult};
pub use gateway::{start_gateway, BrokerHandle, BrokerInbound, InboundStats};
