//! Ports module for the Dispatch Orchestrator
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::DispatchApi;
pub use outbound::{ExecutionAdapter, RecordSink};
