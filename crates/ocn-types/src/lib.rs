//! # OCN Types Crate
//!
//! This crate contains the party/module vocabulary, the `RequestEnvelope`
//! wrapper and the OCPI response model shared by every node crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All wire-level types are defined here.
//! - **Envelope Integrity**: The `RequestEnvelope` is the sole in-flight
//!   representation of a protocol request; adapters translate HTTP into it
//!   and never pass raw requests further inward.
//! - **Canonical Identities**: Party identifiers are canonicalized to
//!   uppercase at construction; equality is on canonical form only.

pub mod envelope;
pub mod errors;
pub mod module;
pub mod party;
pub mod response;

pub use envelope::{header_names, HandoffKind, OcnHeaders, ProxyHandoff, RequestEnvelope, SignableView};
pub use errors::EnvelopeError;
pub use module::{InterfaceRole, ModuleId, RequestMethod};
pub use party::PartyId;
pub use response::{ocpi_status, OcpiResponse, PeerResponse, ResponseHeaders};
