//! Ports module for the Capability Store
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::CapabilityStoreApi;
pub use outbound::CapabilityFeed;
