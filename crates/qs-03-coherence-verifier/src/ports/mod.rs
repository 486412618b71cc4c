//! Ports module for the Coherence Verifier

pub mod inbound;

pub use inbound::CoherenceVerifierApi;
