//! # OCN Relay Test Suite
//!
//! Integration flows driven over real HTTP: every scenario boots one or
//! two gateways on ephemeral ports, stands up scripted platform backends
//! and talks to the node surface exactly the way platforms would.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs           # live node and scripted platform fixtures
//! └── integration/
//!     ├── local_flows.rs   # two platforms registered on one node
//!     ├── relay_flows.rs   # platforms split across two peer nodes
//!     └── registration.rs  # admission and the credentials handshake
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All flows
//! cargo test -p ocn-tests
//!
//! # By category
//! cargo test -p ocn-tests integration::relay_flows::
//! ```

pub mod integration;
pub mod support;
