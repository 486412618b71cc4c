//! Adapters for the Dispatch Orchestrator
//!
//! - `circuit_breaker`: per-target adapter health gate
//! - `digital_twin`: simulated execution backend
//! - `record_log`: in-memory and JSON-lines record sinks

pub mod circuit_breaker;
pub mod digital_twin;
pub mod record_log;

pub use circuit_breaker::{CircuitBreakerConfig, CircuitBreakerManager, CircuitState, CircuitStats};
pub use digital_twin::{DigitalTwinAdapter, DigitalTwinConfig};
pub use record_log::{InMemoryRecordLog, JsonLinesRecordLog};
