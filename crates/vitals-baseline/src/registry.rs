//! Concurrent baseline registry.
//!
//! A sharded map from (user, activity level, parameter) to Welford cells.
//! Updates are short and allocation-free; snapshots for the stats endpoint
//! are copied out under the shard locks.

use crate::cell::BaselineCell;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};
use vitals_core::{ActivityLevel, VitalParam};

/// Registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaselineKey {
    pub user_id: String,
    pub level: ActivityLevel,
    pub param: VitalParam,
}

/// Per-parameter statistics exposed by the stats endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ParamBaseline {
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub count: u64,
}

/// Per-activity-level statistics.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct LevelBaselines {
    pub total_samples: u64,
    pub parameters: BTreeMap<String, ParamBaseline>,
}

/// Stats snapshot for one user.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserBaselines {
    pub user_id: String,
    pub activity_levels: BTreeMap<String, LevelBaselines>,
}

/// Process-wide, per-user running statistics for each vital parameter.
#[derive(Debug, Default)]
pub struct BaselineRegistry {
    cells: DashMap<BaselineKey, BaselineCell>,
}

impl BaselineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an accepted (non-alerting) sample value into its cell.
    pub fn update(&self, user_id: &str, level: ActivityLevel, param: VitalParam, value: f64) {
        let key = BaselineKey {
            user_id: user_id.to_string(),
            level,
            param,
        };
        let mut cell = self.cells.entry(key).or_default();
        cell.update(value);
    }

    /// Copy of one cell, if it exists.
    pub fn cell(
        &self,
        user_id: &str,
        level: ActivityLevel,
        param: VitalParam,
    ) -> Option<BaselineCell> {
        let key = BaselineKey {
            user_id: user_id.to_string(),
            level,
            param,
        };
        self.cells.get(&key).map(|c| *c)
    }

    /// Snapshot of every cell belonging to one user.
    ///
    /// Every activity level is present in the result, empty or not, so the
    /// inspection endpoint has a stable shape.
    pub fn snapshot(&self, user_id: &str) -> UserBaselines {
        let mut activity_levels: BTreeMap<String, LevelBaselines> = ActivityLevel::ALL
            .iter()
            .map(|level| (level.as_str().to_string(), LevelBaselines::default()))
            .collect();

        for entry in self.cells.iter() {
            if entry.key().user_id != user_id {
                continue;
            }
            let cell = *entry.value();
            let level = activity_levels
                .entry(entry.key().level.as_str().to_string())
                .or_default();
            level.total_samples += cell.count;
            level.parameters.insert(
                entry.key().param.as_str().to_string(),
                ParamBaseline {
                    mean: cell.mean,
                    std_dev: cell.std_dev(),
                    count: cell.count,
                },
            );
        }

        UserBaselines {
            user_id: user_id.to_string(),
            activity_levels,
        }
    }

    /// Drop every cell belonging to one user. Returns the number removed.
    pub fn reset(&self, user_id: &str) -> usize {
        let before = self.cells.len();
        self.cells.retain(|key, _| key.user_id != user_id);
        let removed = before - self.cells.len();
        if removed > 0 {
            info!(user_id, removed, "Baselines reset");
        } else {
            debug!(user_id, "Baseline reset with no cells to drop");
        }
        removed
    }

    /// Total number of live cells across all users.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
