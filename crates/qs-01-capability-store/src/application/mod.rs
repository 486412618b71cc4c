//! Application layer for the Capability Store

pub mod store;
