//! Capability Store
//!
//! Main service implementing `CapabilityStoreApi`.

use crate::config::CapabilityStoreConfig;
use crate::domain::entities::UpdateReceipt;
use crate::domain::errors::CapabilityError;
use crate::ports::inbound::CapabilityStoreApi;
use parking_lot::RwLock;
use shared_types::{CapabilityUpdate, ExecutionTarget, TargetId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// In-memory map of execution targets.
///
/// Readers copy entries out under a read lock; writers replace entries under
/// a write lock. Neither holds the lock across an await point.
pub struct CapabilityStore {
    config: CapabilityStoreConfig,
    targets: RwLock<HashMap<TargetId, ExecutionTarget>>,
}

impl CapabilityStore {
    /// Create a new store with default config
    pub fn new() -> Self {
        Self::with_config(CapabilityStoreConfig::default())
    }

    /// Create a new store with custom config
    pub fn with_config(config: CapabilityStoreConfig) -> Self {
        Self {
            config,
            targets: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CapabilityStoreConfig {
        &self.config
    }
}

impl Default for CapabilityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityStoreApi for CapabilityStore {
    fn update(&self, update: CapabilityUpdate) -> Result<UpdateReceipt, CapabilityError> {
        update
            .metrics
            .validate()
            .map_err(|e| CapabilityError::InvalidMetrics {
                target_id: update.target_id.clone(),
                reason: e.to_string(),
            })?;

        let mut targets = self.targets.write();
        let known = targets.len();

        let receipt = match targets.get_mut(&update.target_id) {
            Some(entry) => {
                let regressed = update.timestamp < entry.last_updated;
                entry.coherence_time = update.metrics.coherence_time;
                entry.gate_fidelity = update.metrics.gate_fidelity;
                entry.queue_depth = update.metrics.queue_depth;
                entry.last_updated = update.timestamp;
                entry.revision += 1;
                entry.timestamp_regressed |= regressed;

                UpdateReceipt {
                    target_id: update.target_id.clone(),
                    revision: entry.revision,
                    timestamp: update.timestamp,
                    timestamp_regressed: regressed,
                    created: false,
                }
            }
            None => {
                if known >= self.config.max_targets {
                    return Err(CapabilityError::StoreFull {
                        max: self.config.max_targets,
                    });
                }
                targets.insert(
                    update.target_id.clone(),
                    ExecutionTarget {
                        id: update.target_id.clone(),
                        coherence_time: update.metrics.coherence_time,
                        gate_fidelity: update.metrics.gate_fidelity,
                        queue_depth: update.metrics.queue_depth,
                        last_updated: update.timestamp,
                        revision: 1,
                        timestamp_regressed: false,
                    },
                );

                UpdateReceipt {
                    target_id: update.target_id.clone(),
                    revision: 1,
                    timestamp: update.timestamp,
                    timestamp_regressed: false,
                    created: true,
                }
            }
        };
        drop(targets);

        if receipt.timestamp_regressed {
            warn!(
                target_id = %receipt.target_id,
                timestamp = receipt.timestamp,
                revision = receipt.revision,
                "Capability update timestamp regressed, applied anyway"
            );
        } else {
            debug!(
                target_id = %receipt.target_id,
                revision = receipt.revision,
                coherence_time = update.metrics.coherence_time,
                gate_fidelity = update.metrics.gate_fidelity,
                "Capability updated"
            );
        }

        Ok(receipt)
    }

    fn snapshot(&self, target_id: &TargetId) -> Option<ExecutionTarget> {
        self.targets.read().get(target_id).cloned()
    }

    fn targets(&self) -> Vec<TargetId> {
        let mut ids: Vec<_> = self.targets.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn len(&self) -> usize {
        self.targets.read().len()
    }

    fn max_targets(&self) -> usize {
        self.config.max_targets
    }
}
