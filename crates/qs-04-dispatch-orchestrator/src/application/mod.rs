//! Application layer for the Dispatch Orchestrator
//!
//! - `orchestrator`: the public service, lane routing, shutdown
//! - `lane`: per-target serialized update application and admission
//! - `dispatcher`: adapter calls under a deadline

pub(crate) mod dispatcher;
pub(crate) mod lane;
pub mod orchestrator;

pub use orchestrator::{DispatchDependencies, DispatchOrchestrator};
