//! # Ports Module
//!
//! Hexagonal architecture ports: the outbound dependencies the domain
//! services call through trait objects.

pub mod outbound;

pub use outbound::*;
