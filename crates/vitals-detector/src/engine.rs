//! Detector engine: the process-wide active strategy.
//!
//! One engine per process. The active strategy is an immutable object
//! behind a single lock; a switch validates the selection, builds the new
//! strategy, and replaces the pointer while holding the write lock for the
//! assignment only. Readers clone the `Arc` and classify without holding
//! any lock.

use crate::detector::{AlertSequence, Detector};
use crate::error::DetectorResult;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;
use vitals_baseline::BaselineRegistry;
use vitals_core::{Alert, DetectorKind, DetectorSelection, EnrichedSample};

struct ActiveState {
    detector: Arc<Detector>,
    selection: DetectorSelection,
}

/// Process-wide detector with atomic strategy switching.
pub struct DetectorEngine {
    state: RwLock<ActiveState>,
    registry: Arc<BaselineRegistry>,
    alert_seq: AlertSequence,
}

impl DetectorEngine {
    /// Create an engine with the given initial selection.
    pub fn new(registry: Arc<BaselineRegistry>, initial: DetectorSelection) -> DetectorResult<Self> {
        initial.validate()?;
        let detector = Arc::new(Self::build(&registry, &initial));
        Ok(Self {
            state: RwLock::new(ActiveState {
                detector,
                selection: initial,
            }),
            registry,
            alert_seq: AlertSequence::new(),
        })
    }

    fn build(registry: &Arc<BaselineRegistry>, selection: &DetectorSelection) -> Detector {
        match selection.detector_type {
            DetectorKind::RangeBased => Detector::RangeBased,
            DetectorKind::UserBaseline => Detector::UserBaseline {
                registry: Arc::clone(registry),
            },
        }
    }

    /// The active selection.
    pub fn current(&self) -> DetectorSelection {
        self.state.read().selection.clone()
    }

    /// Classify a sample with the active strategy.
    pub fn classify(&self, sample: &EnrichedSample) -> Vec<Alert> {
        let detector = Arc::clone(&self.state.read().detector);
        detector.classify(sample, &self.alert_seq)
    }

    /// Install a new selection, replacing the active strategy atomically.
    ///
    /// Returns the installed selection. Installing a selection identical to
    /// the active one is a harmless no-op swap, which keeps config-topic
    /// echoes idempotent.
    pub fn switch(&self, selection: DetectorSelection) -> DetectorResult<DetectorSelection> {
        selection.validate()?;
        let detector = Arc::new(Self::build(&self.registry, &selection));

        {
            let mut state = self.state.write();
            state.detector = detector;
            state.selection = selection.clone();
        }

        info!(
            detector_type = %selection.detector_type,
            user_id = %selection.user_id,
            "Detector switched"
        );
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::{RawSample, VitalParam};

    fn resting_sample(heart_rate: f64) -> EnrichedSample {
        EnrichedSample::enrich(RawSample {
            timestamp: "2025-03-01T08:30:00Z".parse().unwrap(),
            user_id: "u1".to_string(),
            activity: Some(20.0),
            heart_rate: Some(heart_rate),
            blood_pressure_systolic: None,
            blood_pressure_diastolic: None,
            temperature: None,
            oxygen_saturation: None,
        })
    }

    fn engine() -> DetectorEngine {
        DetectorEngine::new(
            Arc::new(BaselineRegistry::new()),
            DetectorSelection::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_selection() {
        let engine = engine();
        let current = engine.current();
        assert_eq!(current.detector_type, DetectorKind::RangeBased);
        assert_eq!(current.user_id, "default");
    }

    #[test]
    fn test_switch_and_read_back() {
        let engine = engine();
        let installed = engine
            .switch(DetectorSelection {
                detector_type: DetectorKind::UserBaseline,
                user_id: "u1".to_string(),
            })
            .unwrap();
        assert_eq!(installed, engine.current());
        assert_eq!(engine.current().detector_type, DetectorKind::UserBaseline);
    }

    #[test]
    fn test_switch_rejects_empty_user() {
        let engine = engine();
        let result = engine.switch(DetectorSelection {
            detector_type: DetectorKind::RangeBased,
            user_id: "".to_string(),
        });
        assert!(result.is_err());
        // Active selection is unchanged.
        assert_eq!(engine.current().user_id, "default");
    }

    #[test]
    fn test_alert_ids_survive_switch() {
        let engine = engine();
        let first = engine.classify(&resting_sample(150.0));
        engine
            .switch(DetectorSelection {
                detector_type: DetectorKind::UserBaseline,
                user_id: "u1".to_string(),
            })
            .unwrap();
        let second = engine.classify(&resting_sample(150.0));

        assert_eq!(first[0].parameter, VitalParam::HeartRate);
        assert!(second[0].id > first[0].id);
        assert_eq!(second[0].detector_type, DetectorKind::UserBaseline);
    }
}
