//! # OCN Gateway
//!
//! The HTTP surface of the federation node.
//!
//! ## Purpose
//!
//! Every protocol route translates the inbound HTTP request into a
//! `RequestEnvelope`, drives the `ocn-core` pipeline and renders the
//! projected downstream response back onto HTTP. Nothing below this crate
//! sees axum types; nothing in this crate routes, authenticates or signs.
//!
//! ## Module Structure
//!
//! ```text
//! ocn-gateway/
//! ├── error.rs      # RelayError -> HTTP response mapping
//! ├── extract.rs    # headers/body -> RequestEnvelope translation
//! ├── routes/       # module, handshake, relay and admin routes
//! └── service.rs    # router assembly, listener, shutdown
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod extract;
pub mod routes;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::GatewayError;
pub use service::{build_router, GatewayServer, GatewayState, NodeInfo};
