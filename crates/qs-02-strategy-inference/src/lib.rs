//! # QS-02: Strategy Inference Subsystem
//!
//! Chooses an execution strategy tier (SHALLOW / MEDIUM / DEEP) for a job
//! from the gate fidelity of its target.
//!
//! ## Rules (ordered, first match wins)
//!
//! | # | Condition | Strategy |
//! |---|-----------|----------|
//! | 1 | no snapshot for the target | `UnknownTarget` error |
//! | 2 | `gate_fidelity >= fidelity_deep` | DEEP |
//! | 3 | `gate_fidelity >= fidelity_medium` | MEDIUM |
//! | 4 | otherwise | SHALLOW |
//!
//! Selection is pure: the same snapshot, class and configuration always give
//! the same decision.

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use algorithms::rules::select_strategy;
pub use application::engine::StrategyEngine;
pub use config::{InferenceConfig, TierDepths};
pub use domain::errors::InferenceError;
pub use ports::inbound::StrategyInferenceApi;
