//! Application layer for the Coherence Verifier

pub mod verifier;
