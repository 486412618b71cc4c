//! Algorithms for Strategy Inference

pub mod rules;

pub use rules::select_strategy;
