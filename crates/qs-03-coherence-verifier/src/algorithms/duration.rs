//! Duration estimate from algorithmic depth.

use serde::{Deserialize, Serialize};

/// Linear model: every layer costs `layer_time` seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DurationModel {
    /// Seconds per layer (default 50 ns, a typical transmon gate time).
    pub layer_time: f64,
    /// Layers per unit of algorithmic depth.
    pub layers_per_depth: u32,
}

impl Default for DurationModel {
    fn default() -> Self {
        Self {
            layer_time: 50e-9,
            layers_per_depth: 1,
        }
    }
}

impl DurationModel {
    /// Estimated execution time of `depth`, in seconds.
    pub fn estimate(&self, depth: u32) -> f64 {
        f64::from(depth) * f64::from(self.layers_per_depth) * self.layer_time
    }
}
