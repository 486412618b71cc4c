//! # Shared Types Crate
//!
//! This crate contains the domain entities that flow between the dispatch
//! subsystems and the shared bus.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Snapshots are values**: `ExecutionTarget` is `Clone` and is only ever
//!   handed out as a copy; the capability store is its sole writer.
//! - **Produced once**: `StrategyDecision` and `AdmissionVerdict` have no
//!   mutators. `DispatchRecord` accepts exactly one terminal result.

pub mod entities;
pub mod errors;
pub mod lifecycle;

pub use entities::*;
pub use errors::*;
pub use lifecycle::*;
