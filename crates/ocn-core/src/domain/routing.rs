//! Receiver classification and delivery-plan resolution.
//!
//! Routing turns a validated envelope into a [`DeliveryPlan`], the single
//! tagged union both forwarding paths feed to the dispatcher: either a
//! direct platform call with substituted credentials, or a node-signed
//! relay payload addressed at a peer node.

use std::collections::BTreeMap;

use serde_json::Value;
use uuid::Uuid;

use ocn_notary::sign_payload;
use ocn_types::{HandoffKind, PartyId, ProxyHandoff, RequestEnvelope, RequestMethod};

use crate::context::NodeContext;
use crate::domain::errors::RelayError;
use crate::domain::urls::join_url;
use crate::ports::{PlatformDirectory, ProxyResourceStore, RegistryApi};

/// Which side of the federation the receiver lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Local,
    Remote,
}

/// Headers of an outbound platform call, after credential substitution.
///
/// The request id is minted fresh for the leg; the correlation id and the
/// party pair pass through; the signature header travels when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundHeaders {
    pub authorization: String,
    pub request_id: String,
    pub correlation_id: String,
    pub sender: PartyId,
    pub receiver: PartyId,
    pub signature: Option<String>,
}

/// A fully resolved outbound call, ready for the dispatcher.
#[derive(Debug, Clone)]
pub enum DeliveryPlan {
    /// Direct call to a platform registered on this node.
    Local {
        method: RequestMethod,
        url: String,
        headers: OutboundHeaders,
        query: Option<BTreeMap<String, String>>,
        body: Option<Value>,
    },
    /// Relay of a serialized envelope to the peer node operating the
    /// receiver. `signature` is this node's signature over `payload`.
    Remote {
        relay_url: String,
        payload: String,
        signature: String,
    },
}

/// Decides whether the receiver is served by this node or by a peer.
pub async fn classify(ctx: &NodeContext, receiver: &PartyId) -> Result<Route, RelayError> {
    if ctx.registry().is_locally_operated(receiver).await? {
        return Ok(Route::Local);
    }
    if ctx.registry().is_known_on_network(receiver).await? {
        return Ok(Route::Remote);
    }
    Err(RelayError::UnknownReceiver { party: receiver.to_string() })
}

/// Resolves an envelope addressed at a locally registered platform.
///
/// `proxied` switches the target from the platform's endpoint catalog to a
/// proxy-store lookup: the resolved value is the complete target URL, so
/// the envelope's own query parameters are dropped.
pub async fn resolve_local(
    ctx: &NodeContext,
    envelope: &RequestEnvelope,
    proxied: bool,
) -> Result<DeliveryPlan, RelayError> {
    let sender = &envelope.headers.sender;
    let receiver = &envelope.headers.receiver;

    let platform = ctx
        .directory()
        .platform_of_party(receiver)
        .await?
        .ok_or_else(|| RelayError::UnknownReceiver { party: receiver.to_string() })?;

    let (url, query) = if proxied {
        let id = envelope
            .path_suffix
            .as_deref()
            .ok_or_else(|| RelayError::Internal("proxied forward without a path suffix".into()))?;
        let resolved = ctx.proxies().resolve(id, sender, receiver).await?;
        (resolved, None)
    } else {
        let endpoint = ctx
            .directory()
            .endpoint_for(platform, envelope.module, envelope.interface_role)
            .await?
            .ok_or(RelayError::EndpointNotSupported {
                module: envelope.module,
                role: envelope.interface_role,
            })?;
        let url = match envelope.path_suffix.as_deref() {
            Some(suffix) => join_url(&endpoint, &[suffix]),
            None => endpoint,
        };
        (url, envelope.query_params.clone())
    };

    let token = ctx
        .directory()
        .outbound_token_for(platform)
        .await?
        .ok_or_else(|| RelayError::Internal(format!("platform {platform} has no outbound credential")))?;

    Ok(DeliveryPlan::Local {
        method: envelope.method,
        url,
        headers: OutboundHeaders {
            authorization: format!("Token {token}"),
            request_id: Uuid::new_v4().to_string(),
            correlation_id: envelope.headers.correlation_id.clone(),
            sender: sender.clone(),
            receiver: receiver.clone(),
            signature: envelope.headers.signature.clone(),
        },
        query,
        body: envelope.body.clone(),
    })
}

/// Resolves an envelope addressed at a party on a peer node.
///
/// The serialized copy carries no bearer credential and a fresh request id.
/// On a proxied forward the local mapping is resolved here and handed to
/// the peer as paged-fetch metadata, so the peer can register it under the
/// same id and resolve it symmetrically.
pub async fn resolve_remote(
    ctx: &NodeContext,
    envelope: &RequestEnvelope,
    proxied: bool,
) -> Result<DeliveryPlan, RelayError> {
    let receiver = &envelope.headers.receiver;
    let peer_base = ctx.registry().node_base_url_of(receiver).await?;

    let mut outbound = envelope.wire_sanitized();
    outbound.headers.request_id = Uuid::new_v4().to_string();

    if proxied {
        let id = envelope
            .path_suffix
            .clone()
            .ok_or_else(|| RelayError::Internal("proxied forward without a path suffix".into()))?;
        let resource = ctx.proxies().resolve(&id, &envelope.headers.sender, receiver).await?;
        outbound = outbound.with_proxy(ProxyHandoff { id, resource, kind: HandoffKind::PagedFetch });
    }

    let payload = serde_json::to_string(&outbound)
        .map_err(|e| RelayError::Internal(format!("envelope serialization: {e}")))?;
    let signature = sign_payload(payload.as_bytes(), ctx.signer())
        .map_err(|e| RelayError::Internal(format!("relay signing: {e}")))?;

    Ok(DeliveryPlan::Remote {
        relay_url: join_url(&peer_base, &["ocn", "message"]),
        payload,
        signature,
    })
}
