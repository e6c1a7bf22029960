//! Pipeline configuration.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of ingestion workers. Samples stick to a worker by user id.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Per-worker channel capacity. A full channel blocks the consumer.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.workers == 0 || self.workers > 16 {
            return Err(PipelineError::InvalidConfig(format!(
                "workers must be in 1..=16, got {}",
                self.workers
            )));
        }
        if self.queue_capacity == 0 {
            return Err(PipelineError::InvalidConfig(
                "queue_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.workers, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_bounds() {
        assert!(PipelineConfig {
            workers: 0,
            queue_capacity: 256
        }
        .validate()
        .is_err());
        assert!(PipelineConfig {
            workers: 17,
            queue_capacity: 256
        }
        .validate()
        .is_err());
        assert!(PipelineConfig {
            workers: 8,
            queue_capacity: 0
        }
        .validate()
        .is_err());
    }
}
