//! Domain module for the Capability Store
//!
//! Contains receipts, errors, and invariants.

pub mod entities;
pub mod errors;
pub mod invariants;

pub use entities::*;
pub use errors::*;
