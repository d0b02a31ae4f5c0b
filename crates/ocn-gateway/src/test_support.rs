//! Shared fixtures for gateway tests: a stated router over in-memory
//! adapters and scripted mocks, plus HTTP request and response helpers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;

use ocn_core::adapters::{InMemoryDirectory, InMemoryProxyStore};
use ocn_core::domain::registration::{ConnectionStatus, EndpointRecord, PlatformId};
use ocn_core::ports::{MockDispatcher, MockRegistry, PlatformDirectory};
use ocn_core::NodeContext;
use ocn_notary::NodeSigner;
use ocn_types::{
    header_names, InterfaceRole, ModuleId, OcnHeaders, PartyId, RequestEnvelope, RequestMethod,
};

use crate::service::{build_router, GatewayState, NodeInfo};

pub fn party(country: &str, id: &str) -> PartyId {
    PartyId::new(country, id).unwrap()
}

/// One node's worth of wiring behind a router, with every collaborator
/// reachable for inspection.
pub struct Harness {
    pub state: GatewayState,
    pub registry: Arc<MockRegistry>,
    pub directory: Arc<InMemoryDirectory>,
    pub proxies: Arc<InMemoryProxyStore>,
    pub dispatcher: Arc<MockDispatcher>,
}

impl Harness {
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
        let state = GatewayState::new(
            ctx,
            NodeInfo { party: party("DE", "HUB"), operator: "Test Node".into() },
            "admin-key".into(),
        );
        Self { state, registry, directory, proxies, dispatcher }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
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

        self.registry.register(
            party,
            self.state.ctx.node_url(),
            *self.state.ctx.signer().address(),
        );
        id
    }

    /// Lists a party as operated by a peer node under a fresh signer.
    /// Returns the peer signer so tests can mint valid relay signatures.
    pub fn register_remote_party(&self, party: PartyId, node_url: &str) -> NodeSigner {
        let peer = NodeSigner::generate();
        self.registry.register(party, node_url, *peer.address());
        peer
    }

    /// A bare GET locations sender envelope between two parties.
    pub fn envelope_between(
        &self,
        sender_country: &str,
        sender_id: &str,
        receiver_country: &str,
        receiver_id: &str,
    ) -> RequestEnvelope {
        let headers = OcnHeaders::new(
            "Token sess-a".into(),
            "req-1".into(),
            "corr-1".into(),
            party(sender_country, sender_id),
            party(receiver_country, receiver_id),
        )
        .unwrap();
        RequestEnvelope::new(
            ModuleId::Locations,
            InterfaceRole::Sender,
            RequestMethod::Get,
            headers,
        )
    }
}

/// Builds a module-route request carrying the full protocol header set.
pub fn ocpi_request(
    method: Method,
    uri: &str,
    token: &str,
    sender: &PartyId,
    receiver: &PartyId,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header_names::AUTHORIZATION, format!("Token {token}"))
        .header(header_names::REQUEST_ID, "req-1")
        .header(header_names::CORRELATION_ID, "corr-1")
        .header(header_names::FROM_COUNTRY, sender.country_code())
        .header(header_names::FROM_PARTY, sender.party_id())
        .header(header_names::TO_COUNTRY, receiver.country_code())
        .header(header_names::TO_PARTY, receiver.party_id());
    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

/// Collects a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
