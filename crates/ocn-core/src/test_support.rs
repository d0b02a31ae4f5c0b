//! Shared fixtures for domain tests: a node context wired to in-memory
//! adapters and scripted mocks.

use std::sync::Arc;

use ocn_notary::NodeSigner;
use ocn_types::{InterfaceRole, ModuleId, OcnHeaders, PartyId, RequestEnvelope, RequestMethod};

use crate::adapters::{InMemoryDirectory, InMemoryProxyStore};
use crate::context::NodeContext;
use crate::domain::registration::{ConnectionStatus, EndpointRecord, PlatformId};
use crate::ports::{MockDispatcher, MockRegistry, PlatformDirectory};

pub fn party(country: &str, id: &str) -> PartyId {
    PartyId::new(country, id).unwrap()
}

/// A GET locations sender-interface envelope between two parties, with the
/// session token of [`TestBed::register_local_platform`]'s first platform.
pub fn envelope_between(sender: PartyId, receiver: PartyId) -> RequestEnvelope {
    let headers = OcnHeaders::new(
        "Token sess-a".into(),
        "req-1".into(),
        "corr-1".into(),
        sender,
        receiver,
    )
    .unwrap();
    RequestEnvelope::new(ModuleId::Locations, InterfaceRole::Sender, RequestMethod::Get, headers)
}

/// One node's worth of wiring, with every collaborator reachable for
/// inspection.
pub struct TestBed {
    pub ctx: Arc<NodeContext>,
    pub registry: Arc<MockRegistry>,
    pub directory: Arc<InMemoryDirectory>,
    pub proxies: Arc<InMemoryProxyStore>,
    pub dispatcher: Arc<MockDispatcher>,
}

impl TestBed {
    pub fn new(node_url: &str) -> Self {
        Self::with_signing(node_url, false)
    }

    pub fn with_signing(node_url: &str, signing_required: bool) -> Self {
        let registry = Arc::new(MockRegistry::new(node_url));
        let directory = Arc::new(InMemoryDirectory::new());
        let proxies = Arc::new(InMemoryProxyStore::new());
        let dispatcher = Arc::new(MockDispatcher::new());
        let ctx = Arc::new(NodeContext::new(
            node_url,
            NodeSigner::generate(),
            signing_required,
            registry.clone(),
            directory.clone(),
            proxies.clone(),
            dispatcher.clone(),
        ));
        Self { ctx, registry, directory, proxies, dispatcher }
    }

    /// Registers a connected platform operating `party`, with an endpoint
    /// for every module interface under `endpoint_base`, and lists the
    /// party as locally operated in the registry.
    pub async fn register_local_platform(
        &self,
        party: PartyId,
        session_token: &str,
        outbound_token: &str,
        endpoint_base: &str,
    ) -> PlatformId {
        let mut record = self
            .directory
            .create_platform(format!("setup-{session_token}"))
            .await
            .unwrap();
        record.status = ConnectionStatus::Connected;
        record.setup_token = None;
        record.session_token = Some(session_token.to_string());
        record.outbound_token = Some(outbound_token.to_string());
        let id = record.id;
        self.directory.update_platform(record).await.unwrap();
        self.directory.set_parties(id, vec![party.clone()]).await.unwrap();

        let modules = [
            ModuleId::Cdrs,
            ModuleId::ChargingProfiles,
            ModuleId::Commands,
            ModuleId::Locations,
            ModuleId::Sessions,
            ModuleId::Tariffs,
            ModuleId::Tokens,
        ];
        let mut endpoints = Vec::new();
        for module in modules {
            for role in [InterfaceRole::Sender, InterfaceRole::Receiver] {
                endpoints.push(EndpointRecord {
                    module,
                    role,
                    url: format!("{endpoint_base}/{}", module.as_str()),
                });
            }
        }
        self.directory.set_endpoints(id, endpoints).await.unwrap();

        self.registry.register(party, self.ctx.node_url(), *self.ctx.signer().address());
        id
    }

    /// Lists a party as operated by a peer node under a fresh signer.
    /// Returns the peer signer so tests can mint valid relay signatures.
    pub fn register_remote_party(&self, party: PartyId, node_url: &str) -> NodeSigner {
        let peer = NodeSigner::generate();
        self.registry.register(party, node_url, *peer.address());
        peer
    }
}
