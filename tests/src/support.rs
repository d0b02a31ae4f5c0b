//! Live fixtures: gateways bound to ephemeral ports and scripted platform
//! backends, all talking real HTTP through the reqwest dispatcher.

use std::collections::VecDeque;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use uuid::Uuid;

use ocn_core::adapters::{InMemoryDirectory, InMemoryProxyStore, ReqwestDispatcher};
use ocn_core::domain::registration::{ConnectionStatus, EndpointRecord, PlatformId};
use ocn_core::ports::{MockRegistry, PlatformDirectory};
use ocn_core::NodeContext;
use ocn_gateway::{build_router, GatewayState, NodeInfo};
use ocn_notary::{Address, NodeSigner};
use ocn_types::{header_names, InterfaceRole, ModuleId, PartyId};

pub fn party(country: &str, id: &str) -> PartyId {
    PartyId::new(country, id).unwrap()
}

/// A gateway serving on a real listener, with every collaborator reachable
/// for seeding and inspection.
pub struct TestNode {
    pub url: String,
    pub state: GatewayState,
    pub registry: Arc<MockRegistry>,
    pub directory: Arc<InMemoryDirectory>,
    pub proxies: Arc<InMemoryProxyStore>,
    pub address: Address,
}

impl TestNode {
    /// Binds an ephemeral port first so the node's public URL is known
    /// before the context referring to it is built.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let registry = Arc::new(MockRegistry::new(&url));
        let directory = Arc::new(InMemoryDirectory::new());
        let proxies = Arc::new(InMemoryProxyStore::new());
        let dispatcher = Arc::new(ReqwestDispatcher::new(5_000).unwrap());
        let signer = NodeSigner::generate();
        let address = *signer.address();

        let ctx = Arc::new(NodeContext::new(
            &url,
            signer,
            false,
            registry.clone(),
            directory.clone(),
            proxies.clone(),
            dispatcher,
        ));
        let state = GatewayState::new(
            ctx,
            NodeInfo { party: party("DE", "HUB"), operator: "Test Node".into() },
            "admin-key".into(),
        );

        let router = build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { url, state, registry, directory, proxies, address }
    }

    /// Registers a connected platform operating `party`, with an endpoint
    /// for every module interface under `endpoint_base`, exactly the state
    /// a completed handshake leaves behind.
    pub async fn register_local_platform(
        &self,
        party: &PartyId,
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

        self.registry.register(party.clone(), &self.url, self.address);
        id
    }

    /// Lists a party of a peer node in this node's registry view.
    pub fn link_remote(&self, party: &PartyId, peer: &TestNode) {
        self.registry.register(party.clone(), &peer.url, peer.address);
    }
}

/// One recorded call into a platform backend.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub correlation_id: Option<String>,
    pub body: Option<Value>,
}

/// A scripted platform answer.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

impl CannedResponse {
    pub fn success(data: Value) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: json!({
                "status_code": 1000,
                "data": data,
                "timestamp": "2025-01-01T00:00:00Z",
            }),
        }
    }

    /// Protocol success without a data element.
    pub fn accepted() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: json!({ "status_code": 1000, "timestamp": "2025-01-01T00:00:00Z" }),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

#[derive(Clone)]
struct BackendState {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    script: Arc<Mutex<VecDeque<CannedResponse>>>,
}

/// A platform backend: records every request and answers from a queue,
/// falling back to a bare protocol success once the queue is drained.
pub struct FakePlatform {
    pub url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    script: Arc<Mutex<VecDeque<CannedResponse>>>,
}

impl FakePlatform {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(Mutex::new(VecDeque::new()));

        let state = BackendState { seen: seen.clone(), script: script.clone() };
        let router = Router::new().fallback(record_call).with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { url, seen, script }
    }

    pub fn enqueue(&self, response: CannedResponse) {
        self.script.lock().push_back(response);
    }

    /// Every call received so far, oldest first.
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().clone()
    }
}

async fn record_call(State(state): State<BackendState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    state.seen.lock().push(SeenRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: header(header_names::AUTHORIZATION),
        request_id: header(header_names::REQUEST_ID),
        correlation_id: header(header_names::CORRELATION_ID),
        body: serde_json::from_slice(&bytes).ok(),
    });

    let canned = state.script.lock().pop_front().unwrap_or_else(CannedResponse::accepted);
    let mut builder = axum::http::Response::builder()
        .status(canned.status)
        .header("Content-Type", "application/json");
    for (name, value) in &canned.headers {
        builder = builder.header(*name, value);
    }
    builder.body(Body::from(canned.body.to_string())).unwrap()
}

/// A protocol call aimed at a node, carrying the full header set.
pub struct OcpiCall {
    pub method: reqwest::Method,
    pub url: String,
    pub token: String,
    pub sender: PartyId,
    pub receiver: PartyId,
    pub request_id: String,
    pub correlation_id: String,
    pub body: Option<Value>,
}

impl OcpiCall {
    pub fn get(url: &str, token: &str, sender: &PartyId, receiver: &PartyId) -> Self {
        Self {
            method: reqwest::Method::GET,
            url: url.into(),
            token: token.into(),
            sender: sender.clone(),
            receiver: receiver.clone(),
            request_id: Uuid::new_v4().to_string(),
            correlation_id: Uuid::new_v4().to_string(),
            body: None,
        }
    }

    pub fn post(url: &str, token: &str, sender: &PartyId, receiver: &PartyId, body: Value) -> Self {
        Self { method: reqwest::Method::POST, body: Some(body), ..Self::get(url, token, sender, receiver) }
    }

    pub async fn send(self, client: &reqwest::Client) -> reqwest::Response {
        let mut request = client
            .request(self.method, &self.url)
            .header(header_names::AUTHORIZATION, format!("Token {}", self.token))
            .header(header_names::REQUEST_ID, &self.request_id)
            .header(header_names::CORRELATION_ID, &self.correlation_id)
            .header(header_names::FROM_COUNTRY, self.sender.country_code())
            .header(header_names::FROM_PARTY, self.sender.party_id())
            .header(header_names::TO_COUNTRY, self.receiver.country_code())
            .header(header_names::TO_PARTY, self.receiver.party_id());
        if let Some(body) = &self.body {
            request = request.json(body);
        }
        request.send().await.unwrap()
    }
}

pub async fn json_body(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}
