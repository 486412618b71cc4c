//! Configuration for the Capability Store

use serde::{Deserialize, Serialize};

/// Capability store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapabilityStoreConfig {
    /// Maximum number of distinct targets (bounded memory)
    pub max_targets: usize,
}

impl Default for CapabilityStoreConfig {
    fn default() -> Self {
        Self { max_targets: 1024 }
    }
}
