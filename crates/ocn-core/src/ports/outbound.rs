//! # Outbound Ports
//!
//! Dependencies of the routing core, expressed as async traits so that the
//! party registry (a remote lookup service), the platform directory (a
//! store) and outbound HTTP can be swapped without touching domain logic.
//! Mock implementations for tests live beside the traits.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{json, Value};

use ocn_notary::Address;
use ocn_types::{InterfaceRole, ModuleId, PartyId, PeerResponse, ResponseHeaders};

use crate::domain::errors::RelayError;
use crate::domain::registration::{EndpointRecord, PlatformId, PlatformRecord};
use crate::domain::routing::DeliveryPlan;

// =============================================================================
// REGISTRY
// =============================================================================

/// Read access to the network-wide party registry.
///
/// Every call is potentially a slow, failing remote lookup; implementations
/// must not assume in-process data.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Does this party belong to a platform operated by *this* node?
    async fn is_locally_operated(&self, party: &PartyId) -> Result<bool, RelayError>;

    /// Is this party registered anywhere on the network?
    async fn is_known_on_network(&self, party: &PartyId) -> Result<bool, RelayError>;

    /// Base URL of the node operating this party.
    async fn node_base_url_of(&self, party: &PartyId) -> Result<String, RelayError>;

    /// Signing address of the party's node of record. Envelope and relay
    /// signatures attributed to this party verify against it.
    async fn signing_address_of_node(&self, party: &PartyId) -> Result<Address, RelayError>;
}

// =============================================================================
// PLATFORM DIRECTORY
// =============================================================================

/// Storage of platform registrations: credential tokens, party sets and
/// endpoint catalogs.
#[async_trait]
pub trait PlatformDirectory: Send + Sync {
    async fn platform_by_session_token(
        &self,
        token: &str,
    ) -> Result<Option<PlatformRecord>, RelayError>;

    async fn platform_by_setup_token(
        &self,
        token: &str,
    ) -> Result<Option<PlatformRecord>, RelayError>;

    async fn platform_of_party(&self, party: &PartyId) -> Result<Option<PlatformId>, RelayError>;

    async fn parties_of_platform(&self, platform: PlatformId) -> Result<Vec<PartyId>, RelayError>;

    /// Registered endpoint of a platform for one module interface.
    async fn endpoint_for(
        &self,
        platform: PlatformId,
        module: ModuleId,
        role: InterfaceRole,
    ) -> Result<Option<String>, RelayError>;

    /// Credential this node presents when calling the platform.
    async fn outbound_token_for(&self, platform: PlatformId) -> Result<Option<String>, RelayError>;

    // Registration writes, used by the credentials handshake and the admin
    // surface.

    async fn create_platform(&self, setup_token: String) -> Result<PlatformRecord, RelayError>;

    async fn update_platform(&self, record: PlatformRecord) -> Result<(), RelayError>;

    async fn set_parties(
        &self,
        platform: PlatformId,
        parties: Vec<PartyId>,
    ) -> Result<(), RelayError>;

    async fn set_endpoints(
        &self,
        platform: PlatformId,
        endpoints: Vec<EndpointRecord>,
    ) -> Result<(), RelayError>;

    async fn remove_platform(&self, platform: PlatformId) -> Result<(), RelayError>;
}

// =============================================================================
// PROXY RESOURCE STORE
// =============================================================================

/// Mapping between node-minted opaque ids and real upstream values
/// (next-page URLs, async-callback URLs).
#[async_trait]
pub trait ProxyResourceStore: Send + Sync {
    /// Stores a mapping and returns its primary id. `alternative_id` is an
    /// externally supplied identifier handed across a relay; creation with
    /// a duplicate alternative id is last-write-wins.
    async fn create(
        &self,
        resource: &str,
        sender: &PartyId,
        receiver: &PartyId,
        alternative_id: Option<String>,
    ) -> Result<String, RelayError>;

    /// Looks up first by alternative id for `(sender, receiver)`, then by
    /// primary id for the same pair. The two sides of a relayed call may
    /// each have minted the mapping they are resolving.
    async fn resolve(
        &self,
        id: &str,
        sender: &PartyId,
        receiver: &PartyId,
    ) -> Result<String, RelayError>;

    /// Removes a mapping by primary or alternative id. Idempotent.
    async fn delete(&self, id: &str) -> Result<(), RelayError>;

    /// Drops mappings older than `max_age`; returns how many were removed.
    async fn purge_expired(&self, max_age: Duration) -> Result<usize, RelayError>;
}

// =============================================================================
// OUTBOUND HTTP
// =============================================================================

/// Executes a delivery plan against a platform or a peer node.
#[async_trait]
pub trait HttpDispatcher: Send + Sync {
    async fn dispatch(&self, plan: DeliveryPlan) -> Result<PeerResponse, RelayError>;

    /// Bare authenticated GET, used while walking a platform's version
    /// catalog during the credentials handshake. At that point the platform
    /// has no stored endpoints yet, so no delivery plan can be built.
    async fn fetch(&self, url: &str, token: &str) -> Result<PeerResponse, RelayError>;
}

// =============================================================================
// MOCKS
// =============================================================================

#[derive(Debug, Clone)]
struct MockRegistryEntry {
    node_url: String,
    node_address: Address,
}

/// In-memory registry for tests: parties mapped to node URLs and signing
/// addresses, with a switch to simulate lookup outages.
pub struct MockRegistry {
    own_node_url: String,
    entries: DashMap<PartyId, MockRegistryEntry>,
    fail: AtomicBool,
}

impl MockRegistry {
    pub fn new(own_node_url: impl Into<String>) -> Self {
        Self {
            own_node_url: own_node_url.into(),
            entries: DashMap::new(),
            fail: AtomicBool::new(false),
        }
    }

    pub fn register(&self, party: PartyId, node_url: impl Into<String>, node_address: Address) {
        self.entries
            .insert(party, MockRegistryEntry { node_url: node_url.into(), node_address });
    }

    /// Makes every subsequent lookup fail, simulating a registry outage.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<(), RelayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RelayError::Internal("registry lookup failed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryApi for MockRegistry {
    async fn is_locally_operated(&self, party: &PartyId) -> Result<bool, RelayError> {
        self.check_up()?;
        Ok(self
            .entries
            .get(party)
            .map(|entry| entry.node_url == self.own_node_url)
            .unwrap_or(false))
    }

    async fn is_known_on_network(&self, party: &PartyId) -> Result<bool, RelayError> {
        self.check_up()?;
        Ok(self.entries.contains_key(party))
    }

    async fn node_base_url_of(&self, party: &PartyId) -> Result<String, RelayError> {
        self.check_up()?;
        self.entries
            .get(party)
            .map(|entry| entry.node_url.clone())
            .ok_or_else(|| RelayError::UnknownReceiver { party: party.to_string() })
    }

    async fn signing_address_of_node(&self, party: &PartyId) -> Result<Address, RelayError> {
        self.check_up()?;
        self.entries
            .get(party)
            .map(|entry| entry.node_address)
            .ok_or_else(|| RelayError::UnknownReceiver { party: party.to_string() })
    }
}

/// Scripted dispatcher for tests: records every delivery plan and answers
/// from a queue.
#[derive(Default)]
pub struct MockDispatcher {
    script: Mutex<VecDeque<Result<PeerResponse, RelayError>>>,
    seen: Mutex<Vec<DeliveryPlan>>,
    fetch_script: Mutex<VecDeque<Result<PeerResponse, RelayError>>>,
    fetched: Mutex<Vec<(String, String)>>,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, response: PeerResponse) {
        self.script.lock().push_back(Ok(response));
    }

    pub fn enqueue_error(&self, error: RelayError) {
        self.script.lock().push_back(Err(error));
    }

    pub fn enqueue_fetch(&self, response: PeerResponse) {
        self.fetch_script.lock().push_back(Ok(response));
    }

    /// Every plan dispatched so far, oldest first.
    pub fn requests(&self) -> Vec<DeliveryPlan> {
        self.seen.lock().clone()
    }

    /// Every catalog fetch so far, as `(url, token)` pairs.
    pub fn fetches(&self) -> Vec<(String, String)> {
        self.fetched.lock().clone()
    }

    /// A bare protocol-success response for scripting.
    pub fn protocol_success(data: Value) -> PeerResponse {
        PeerResponse {
            status: 200,
            headers: ResponseHeaders::default(),
            body: json!({
                "status_code": 1000,
                "data": data,
                "timestamp": "2025-01-01T00:00:00Z",
            }),
        }
    }
}

#[async_trait]
impl HttpDispatcher for MockDispatcher {
    async fn dispatch(&self, plan: DeliveryPlan) -> Result<PeerResponse, RelayError> {
        self.seen.lock().push(plan);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(RelayError::Internal("no scripted response".into())))
    }

    async fn fetch(&self, url: &str, token: &str) -> Result<PeerResponse, RelayError> {
        self.fetched.lock().push((url.to_string(), token.to_string()));
        self.fetch_script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(RelayError::Internal("no scripted fetch response".into())))
    }
}
