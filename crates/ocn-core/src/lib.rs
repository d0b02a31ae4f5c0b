//! # OCN Core
//!
//! Domain services of the federation node.
//!
//! **Architecture:** Hexagonal (domain + ports/adapters)
//!
//! ## Purpose
//!
//! Everything between the HTTP surface and the outside world:
//! - Sender authentication (credential, party membership, signatures)
//! - Routing (local platform delivery vs. node-to-node relay)
//! - Forwarding, including async-callback URL rewriting
//! - Proxy-resource indirection for pagination and callbacks
//! - Response projection back to the original caller
//!
//! ## Module Structure
//!
//! ```text
//! ocn-core/
//! ├── domain/       # errors, routing, auth, forward, pipeline, project
//! ├── ports/        # RegistryApi, PlatformDirectory, ProxyResourceStore,
//! │                 # HttpDispatcher (+ mocks)
//! ├── adapters/     # in-memory stores, file registry, reqwest dispatcher
//! └── context.rs    # NodeContext dependency bundle
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod context;
pub mod domain;
pub mod ports;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::NodeContext;
pub use domain::errors::RelayError;
pub use domain::pipeline::RequestPipeline;
