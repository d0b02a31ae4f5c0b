//! Translation from inbound HTTP requests to request envelopes.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use serde_json::Value;

use ocn_core::RelayError;
use ocn_types::{
    header_names, EnvelopeError, InterfaceRole, ModuleId, OcnHeaders, PartyId, RequestEnvelope,
    RequestMethod,
};

use crate::error::GatewayError;

/// One header as trimmed text; absent, unreadable and empty all collapse to
/// `None`.
fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn required_header(headers: &HeaderMap, name: &'static str) -> Result<String, GatewayError> {
    header_text(headers, name)
        .ok_or_else(|| RelayError::from(EnvelopeError::MissingHeader(name)).into())
}

/// Builds the envelope header block from the protocol headers.
pub fn ocn_headers(headers: &HeaderMap) -> Result<OcnHeaders, GatewayError> {
    let sender = PartyId::new(
        &required_header(headers, header_names::FROM_COUNTRY)?,
        &required_header(headers, header_names::FROM_PARTY)?,
    )
    .map_err(RelayError::from)?;
    let receiver = PartyId::new(
        &required_header(headers, header_names::TO_COUNTRY)?,
        &required_header(headers, header_names::TO_PARTY)?,
    )
    .map_err(RelayError::from)?;

    let mut built = OcnHeaders::new(
        header_text(headers, header_names::AUTHORIZATION).unwrap_or_default(),
        required_header(headers, header_names::REQUEST_ID)?,
        required_header(headers, header_names::CORRELATION_ID)?,
        sender,
        receiver,
    )
    .map_err(RelayError::from)?;
    built.signature = header_text(headers, header_names::SIGNATURE);
    Ok(built)
}

/// Assembles the envelope of one module-route request.
pub fn module_envelope(
    module: ModuleId,
    role: InterfaceRole,
    method: RequestMethod,
    headers: &HeaderMap,
    path_suffix: Option<String>,
    query: BTreeMap<String, String>,
    body: Option<Value>,
) -> Result<RequestEnvelope, GatewayError> {
    let mut envelope =
        RequestEnvelope::new(module, role, method, ocn_headers(headers)?).with_query_params(query);
    envelope.path_suffix = path_suffix;
    envelope.body = body;
    Ok(envelope)
}

/// Envelope method for a route registered under several HTTP methods.
pub fn request_method(method: &Method) -> Result<RequestMethod, GatewayError> {
    match *method {
        Method::GET => Ok(RequestMethod::Get),
        Method::POST => Ok(RequestMethod::Post),
        Method::PUT => Ok(RequestMethod::Put),
        Method::PATCH => Ok(RequestMethod::Patch),
        Method::DELETE => Ok(RequestMethod::Delete),
        // The router never dispatches other methods to envelope handlers.
        _ => Err(RelayError::Internal(format!("unroutable method {method}")).into()),
    }
}

/// Parses an optional JSON request body. An empty body is `None`; a present
/// body that is not JSON is rejected.
pub fn optional_json(bytes: &Bytes) -> Result<Option<Value>, GatewayError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| RelayError::from(EnvelopeError::MalformedBody(e.to_string())).into())
}
