//! Ports layer for the confirmation subsystem.
//!
//! Defines the hexagonal architecture port traits:
//! - Inbound (Driving) ports: API called by the CMP protocol handler and sweeper
//! - Outbound (Driven) ports: issuance backend, certificate store, clock

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
