//! # QS-03: Coherence Verifier Subsystem
//!
//! Pre-flight admission check: a job is admitted only if its estimated
//! duration fits inside a safety fraction of the target's T1 coherence time.
//!
//! ```text
//! margin = estimated_duration / coherence_time
//! APPROVE  iff  estimated_duration < margin_factor * coherence_time
//! ```
//!
//! The comparison is strict: a job exactly at the budget is rejected.
//! Non-finite or non-positive inputs are an error, which callers must treat
//! as a rejection.

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use algorithms::duration::DurationModel;
pub use algorithms::margin::{compute_margin, evaluate};
pub use application::verifier::CoherenceVerifier;
pub use config::VerifierConfig;
pub use domain::errors::VerificationError;
pub use ports::inbound::CoherenceVerifierApi;
