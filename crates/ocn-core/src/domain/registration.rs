//! Party-registration entities: platforms, their credential tokens, party
//! sets and endpoint catalogs.
//!
//! A platform connects to the node once and registers any number of parties.
//! Three tokens exist per platform: the setup token presented during the
//! registration handshake, the session token the platform uses on every call
//! to this node, and the outbound token this node uses when calling the
//! platform.

use chrono::{DateTime, Utc};

use ocn_types::{InterfaceRole, ModuleId};

pub type PlatformId = u64;

/// Lifecycle of a platform connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Setup token issued, handshake not completed.
    Planned,
    /// Registered and routable.
    Connected,
    /// Administratively blocked; credentials no longer accepted.
    Suspended,
}

/// One registered platform.
#[derive(Debug, Clone)]
pub struct PlatformRecord {
    pub id: PlatformId,
    pub status: ConnectionStatus,
    /// Registration handshake credential (one-shot).
    pub setup_token: Option<String>,
    /// Credential the platform presents to this node.
    pub session_token: Option<String>,
    /// Credential this node presents to the platform.
    pub outbound_token: Option<String>,
    /// Platform-level signing rule, OR-ed with the node policy.
    pub require_signatures: bool,
    /// The platform's version-catalog URL captured during the handshake.
    pub versions_url: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl PlatformRecord {
    pub fn planned(id: PlatformId, setup_token: String) -> Self {
        Self {
            id,
            status: ConnectionStatus::Planned,
            setup_token: Some(setup_token),
            session_token: None,
            outbound_token: None,
            require_signatures: false,
            versions_url: None,
            registered_at: Utc::now(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}

/// One entry of a platform's endpoint catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRecord {
    pub module: ModuleId,
    pub role: InterfaceRole,
    pub url: String,
}
