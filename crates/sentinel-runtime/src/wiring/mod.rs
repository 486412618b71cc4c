//! Event bus consumers.

pub mod metrics_bridge;

pub use metrics_bridge::MetricsBridge;
