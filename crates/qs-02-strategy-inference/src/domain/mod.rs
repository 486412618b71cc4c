//! Domain module for Strategy Inference

pub mod errors;

pub use errors::*;
