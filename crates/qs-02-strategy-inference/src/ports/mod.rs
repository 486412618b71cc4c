//! Ports module for Strategy Inference

pub mod inbound;

pub use inbound::StrategyInferenceApi;
