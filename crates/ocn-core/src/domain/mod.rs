//! # Domain Module
//!
//! Core routing and forwarding logic, free of transport concerns.

pub mod auth;
pub mod errors;
pub mod forward;
pub mod handshake;
pub mod pipeline;
pub mod project;
pub mod registration;
pub mod relay;
pub mod routing;
pub mod urls;

pub use auth::*;
pub use errors::*;
pub use forward::*;
pub use handshake::*;
pub use pipeline::*;
pub use project::*;
pub use registration::*;
pub use relay::*;
pub use routing::*;
