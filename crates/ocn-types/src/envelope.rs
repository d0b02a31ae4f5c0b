//! The request envelope: the single normalized representation of an
//! in-flight protocol request.
//!
//! HTTP adapters translate inbound module routes into a `RequestEnvelope`;
//! routing, signature checks and forwarding all operate on the envelope and
//! never on raw HTTP. The envelope is immutable during routing except
//! through the explicit rewrite helpers, which return a new envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::EnvelopeError;
use crate::module::{InterfaceRole, ModuleId, RequestMethod};
use crate::party::PartyId;

/// Wire names of the headers the node consumes and emits.
pub mod header_names {
    pub const AUTHORIZATION: &str = "Authorization";
    pub const REQUEST_ID: &str = "X-Request-ID";
    pub const CORRELATION_ID: &str = "X-Correlation-ID";
    pub const FROM_COUNTRY: &str = "OCPI-from-country-code";
    pub const FROM_PARTY: &str = "OCPI-from-party-id";
    pub const TO_COUNTRY: &str = "OCPI-to-country-code";
    pub const TO_PARTY: &str = "OCPI-to-party-id";
    pub const SIGNATURE: &str = "OCN-Signature";
    pub const LINK: &str = "Link";
    pub const LOCATION: &str = "Location";
    pub const TOTAL_COUNT: &str = "X-Total-Count";
    pub const LIMIT: &str = "X-Limit";
}

/// Routing headers of one protocol request.
///
/// The bearer credential is hop-local: it authenticates the caller to this
/// node only, is replaced on every outbound leg and never participates in
/// signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcnHeaders {
    /// Bearer credential as received (`Token ...`). Stripped before relay.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub authorization: String,
    /// Encoded envelope signature blob, when the conversation is signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Hop-local request identifier; re-minted on every outbound leg.
    pub request_id: String,
    /// End-to-end correlation identifier; passed through verbatim.
    pub correlation_id: String,
    pub sender: PartyId,
    pub receiver: PartyId,
}

impl OcnHeaders {
    /// Builds a validated header set. Sender and receiver must differ.
    pub fn new(
        authorization: String,
        request_id: String,
        correlation_id: String,
        sender: PartyId,
        receiver: PartyId,
    ) -> Result<Self, EnvelopeError> {
        if sender == receiver {
            return Err(EnvelopeError::SenderIsReceiver);
        }
        Ok(Self {
            authorization,
            signature: None,
            request_id,
            correlation_id,
            sender,
            receiver,
        })
    }

    /// Re-checks invariants on a deserialized header set (relay inbound).
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.sender == self.receiver {
            return Err(EnvelopeError::SenderIsReceiver);
        }
        if self.request_id.is_empty() {
            return Err(EnvelopeError::MissingHeader(header_names::REQUEST_ID));
        }
        if self.correlation_id.is_empty() {
            return Err(EnvelopeError::MissingHeader(header_names::CORRELATION_ID));
        }
        Ok(())
    }
}

/// Why proxy hand-off metadata travels with a relayed envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandoffKind {
    /// The envelope is a page fetch; the peer registers the carried resource
    /// under the carried id and resolves the path suffix through its store.
    #[serde(rename = "paged-fetch")]
    PagedFetch,
    /// The envelope carries an async-callback registration; the peer
    /// registers the resource under the reversed party orientation, the one
    /// the eventual callback will arrive with.
    #[serde(rename = "callback-registration")]
    CallbackRegistration,
}

/// Proxy registration handed across a node-to-node relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyHandoff {
    /// Identifier the receiving node must honor as an alternative id.
    pub id: String,
    /// The real resource value (next-page URL or callback URL).
    pub resource: String,
    pub kind: HandoffKind,
}

/// One in-flight protocol request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub module: ModuleId,
    pub interface_role: InterfaceRole,
    pub method: RequestMethod,
    pub headers: OcnHeaders,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_suffix: Option<String>,
    /// Ordered so that serialization, and with it the signable view, is
    /// deterministic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Present only while the envelope crosses a node-to-node relay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyHandoff>,
}

impl RequestEnvelope {
    pub fn new(
        module: ModuleId,
        interface_role: InterfaceRole,
        method: RequestMethod,
        headers: OcnHeaders,
    ) -> Self {
        Self {
            module,
            interface_role,
            method,
            headers,
            path_suffix: None,
            query_params: None,
            body: None,
            proxy: None,
        }
    }

    pub fn with_path_suffix(mut self, path_suffix: impl Into<String>) -> Self {
        self.path_suffix = Some(path_suffix.into());
        self
    }

    pub fn with_query_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.query_params = if params.is_empty() { None } else { Some(params) };
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns a copy carrying the given proxy hand-off metadata.
    pub fn with_proxy(mut self, handoff: ProxyHandoff) -> Self {
        self.proxy = Some(handoff);
        self
    }

    /// Returns a copy carrying the given signature header value.
    pub fn with_signature(mut self, encoded: String) -> Self {
        self.headers.signature = Some(encoded);
        self
    }

    pub fn validate(&self) -> Result<(), EnvelopeError> {
        self.headers.validate()
    }

    /// The reduced projection signatures are computed over.
    ///
    /// Excludes the bearer credential and the request id (both hop-local),
    /// the signature header itself, and relay plumbing (`proxy`).
    pub fn signable(&self) -> SignableView {
        SignableView {
            module: self.module,
            interface_role: self.interface_role,
            method: self.method,
            correlation_id: self.headers.correlation_id.clone(),
            sender: self.headers.sender.clone(),
            receiver: self.headers.receiver.clone(),
            path_suffix: self.path_suffix.clone(),
            query_params: self.query_params.clone(),
            body: self.body.clone(),
        }
    }

    /// Copy prepared for node-to-node serialization: the hop-local bearer
    /// credential never leaves this node.
    pub fn wire_sanitized(&self) -> Self {
        let mut copy = self.clone();
        copy.headers.authorization = String::new();
        copy
    }
}

/// Deterministic projection of an envelope for signing and verification.
///
/// Field order is fixed by declaration; JSON object keys inside `body` are
/// ordered by `serde_json`'s map implementation. Equal views therefore
/// serialize to identical bytes on every node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignableView {
    pub module: ModuleId,
    pub interface_role: InterfaceRole,
    pub method: RequestMethod,
    pub correlation_id: String,
    pub sender: PartyId,
    pub receiver: PartyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}
