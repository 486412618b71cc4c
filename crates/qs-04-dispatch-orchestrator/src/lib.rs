//! # QS-04: Dispatch Orchestrator Subsystem
//!
//! Drives every job through its lifecycle: strategy selection on a
//! capability snapshot, coherence admission, adapter health gate, dispatch
//! under a deadline, and the append-only record of the result.
//!
//! ## Architecture
//!
//! - **Domain**: Errors, outcomes and tickets, the job registry, invariants
//! - **Ports**: Inbound (`DispatchApi`) and Outbound (`ExecutionAdapter`, `RecordSink`)
//! - **Adapters**: Circuit breaker, digital twin backend, record logs
//! - **Application**: `DispatchOrchestrator` with one lane per target
//!
//! ## Ordering
//!
//! Capability updates and jobs for a target share one FIFO lane. A job sees
//! exactly the updates routed before it was submitted. Targets are
//! independent of each other.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{
    CircuitBreakerConfig, CircuitBreakerManager, CircuitState, CircuitStats, DigitalTwinAdapter,
    DigitalTwinConfig, InMemoryRecordLog, JsonLinesRecordLog,
};
pub use application::{DispatchDependencies, DispatchOrchestrator};
pub use config::OrchestratorConfig;
pub use domain::errors::{CancelError, DispatchError, RecordSinkError};
pub use domain::outcome::{JobOutcome, JobTicket};
pub use domain::registry::StateTransition;
pub use ports::inbound::DispatchApi;
pub use ports::outbound::{ExecutionAdapter, RecordSink};
