//! Domain module for the Dispatch Orchestrator
//!
//! Contains errors, job outcomes, the job registry, and invariants.

pub mod errors;
pub mod invariants;
pub mod outcome;
pub mod registry;

pub use errors::*;
pub use outcome::*;
pub use registry::{JobRegistry, StateTransition};
