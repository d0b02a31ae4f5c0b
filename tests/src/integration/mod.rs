//! End-to-end choreography across live listeners.

pub mod local_flows;
pub mod registration;
pub mod relay_flows;
