//! Application layer for Strategy Inference

pub mod engine;
