//! Domain module for the Coherence Verifier

pub mod errors;

pub use errors::*;
