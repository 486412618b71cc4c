//! Algorithms for the Coherence Verifier

pub mod duration;
pub mod margin;
