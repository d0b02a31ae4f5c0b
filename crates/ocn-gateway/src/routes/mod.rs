//! The HTTP route surface.
//!
//! One file per protocol module, plus the handshake, relay and admin
//! surfaces. The shared runners here drive the `ocn-core` pipeline and
//! render the projected downstream response back onto HTTP.

pub mod admin;
pub mod cdrs;
pub mod charging_profiles;
pub mod commands;
pub mod credentials;
pub mod locations;
pub mod relay;
pub mod sessions;
pub mod tariffs;
pub mod tokens;
pub mod versions;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::Value;

use ocn_core::{RelayError, RequestPipeline};
use ocn_types::{header_names, EnvelopeError, PeerResponse, RequestEnvelope};

use crate::error::GatewayError;
use crate::service::GatewayState;

/// Every module, handshake, relay and admin route on one router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .merge(locations::routes())
        .merge(sessions::routes())
        .merge(cdrs::routes())
        .merge(tariffs::routes())
        .merge(tokens::routes())
        .merge(commands::routes())
        .merge(charging_profiles::routes())
        .merge(versions::routes())
        .merge(credentials::routes())
        .merge(relay::routes())
        .merge(admin::routes())
        .with_state(state)
}

/// Renders a downstream response onto HTTP, surfaced headers included.
pub(crate) fn render(peer: PeerResponse) -> Response {
    let status = StatusCode::from_u16(peer.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let surfaced = peer.headers;
    let mut response = (status, Json(peer.body)).into_response();
    {
        let headers = response.headers_mut();
        let mut set = |name: &'static str, value: Option<String>| {
            if let Some(value) = value.and_then(|v| HeaderValue::from_str(&v).ok()) {
                headers.insert(name, value);
            }
        };
        set(header_names::LOCATION, surfaced.location);
        set(header_names::LINK, surfaced.link);
        set(header_names::TOTAL_COUNT, surfaced.total_count);
        set(header_names::LIMIT, surfaced.limit);
    }
    response
}

/// Validate, forward to the receiver, answer verbatim.
pub(crate) async fn run_forward(
    state: &GatewayState,
    envelope: RequestEnvelope,
) -> Result<Response, GatewayError> {
    let mut pipeline = RequestPipeline::new(state.ctx.clone(), envelope);
    pipeline.validate_sender().await?;
    pipeline.forward(false).await?;
    Ok(render(pipeline.response().await?))
}

/// Validate, forward, substitute the pagination link before answering.
pub(crate) async fn run_paginated(
    state: &GatewayState,
    envelope: RequestEnvelope,
) -> Result<Response, GatewayError> {
    let mut pipeline = RequestPipeline::new(state.ctx.clone(), envelope);
    pipeline.validate_sender().await?;
    pipeline.forward(false).await?;
    Ok(render(pipeline.response_with_pagination().await?))
}

/// Deliver through a stored proxy mapping (callback URLs, stored Location
/// targets); the answer passes through verbatim.
pub(crate) async fn run_proxied(
    state: &GatewayState,
    envelope: RequestEnvelope,
) -> Result<Response, GatewayError> {
    let mut pipeline = RequestPipeline::new(state.ctx.clone(), envelope);
    pipeline.validate_sender().await?;
    pipeline.forward(true).await?;
    Ok(render(pipeline.response().await?))
}

/// Page fetch through a stored mapping; the answer may itself carry a next
/// link, so the pagination projection runs again.
pub(crate) async fn run_proxied_paginated(
    state: &GatewayState,
    envelope: RequestEnvelope,
) -> Result<Response, GatewayError> {
    let mut pipeline = RequestPipeline::new(state.ctx.clone(), envelope);
    pipeline.validate_sender().await?;
    pipeline.forward(true).await?;
    Ok(render(pipeline.response_with_pagination().await?))
}

/// Forward with `Location` header projection under the given route prefix.
pub(crate) async fn run_with_location(
    state: &GatewayState,
    envelope: RequestEnvelope,
    proxy_path_prefix: &str,
) -> Result<Response, GatewayError> {
    let mut pipeline = RequestPipeline::new(state.ctx.clone(), envelope);
    pipeline.validate_sender().await?;
    pipeline.forward(false).await?;
    Ok(render(pipeline.response_with_location(proxy_path_prefix).await?))
}

/// Callback URL a modifiable request carries as a top-level body field.
pub(crate) fn body_response_url(envelope: &RequestEnvelope) -> Result<String, GatewayError> {
    envelope
        .body
        .as_ref()
        .and_then(|body| body.get("response_url"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RelayError::from(EnvelopeError::MissingField("response_url")).into())
}

/// Callback URL a modifiable request carries as a query parameter.
pub(crate) fn query_response_url(envelope: &RequestEnvelope) -> Result<String, GatewayError> {
    envelope
        .query_params
        .as_ref()
        .and_then(|params| params.get("response_url"))
        .cloned()
        .ok_or_else(|| RelayError::from(EnvelopeError::MissingField("response_url")).into())
}

/// The envelope with its body `response_url` pointed at this node.
pub(crate) fn rewrite_body_response_url(
    mut envelope: RequestEnvelope,
    replacement: String,
) -> RequestEnvelope {
    if let Some(fields) = envelope.body.as_mut().and_then(Value::as_object_mut) {
        fields.insert("response_url".into(), Value::String(replacement));
    }
    envelope
}

/// The envelope with its query `response_url` pointed at this node.
pub(crate) fn rewrite_query_response_url(
    mut envelope: RequestEnvelope,
    replacement: String,
) -> RequestEnvelope {
    if let Some(params) = envelope.query_params.as_mut() {
        params.insert("response_url".into(), replacement);
    }
    envelope
}
