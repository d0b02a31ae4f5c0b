//! Charging-profiles module routes.
//!
//! Every receiver-side operation names a `response_url` for its async
//! result: in the body on PUT, as a query parameter on GET and DELETE. The
//! node takes custody of it exactly as it does for commands; results arrive
//! on the sender-side callback route.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::Router;

use ocn_core::RequestPipeline;
use ocn_notary::SignableField;
use ocn_types::{InterfaceRole, ModuleId, RequestEnvelope, RequestMethod};

use crate::error::GatewayError;
use crate::extract::{module_envelope, optional_json, request_method};
use crate::routes::{
    body_response_url, query_response_url, render, rewrite_body_response_url,
    rewrite_query_response_url, run_forward, run_proxied,
};
use crate::service::GatewayState;

pub fn routes() -> Router<GatewayState> {
    Router::new()
        .route(
            "/ocpi/receiver/2.2/chargingprofiles/:session_id",
            get(receiver_profile).put(receiver_profile).delete(receiver_profile),
        )
        .route("/ocpi/sender/2.2/chargingprofiles/result/:uid", post(sender_result))
        .route("/ocpi/sender/2.2/chargingprofiles/:session_id", put(sender_update))
}

async fn receiver_profile(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let method = request_method(&method)?;
    let envelope = module_envelope(
        ModuleId::ChargingProfiles,
        InterfaceRole::Receiver,
        method,
        &headers,
        Some(session_id),
        query,
        optional_json(&body)?,
    )?;

    type Rewrite = fn(RequestEnvelope, String) -> RequestEnvelope;
    let (callback_url, stash, rewrite): (String, SignableField, Rewrite) = match method {
        RequestMethod::Put => (
            body_response_url(&envelope)?,
            SignableField::body("/response_url"),
            rewrite_body_response_url,
        ),
        _ => (
            query_response_url(&envelope)?,
            SignableField::query("response_url"),
            rewrite_query_response_url,
        ),
    };

    let mut pipeline = RequestPipeline::new(state.ctx.clone(), envelope);
    pipeline.validate_sender().await?;
    let original = pipeline.envelope().clone();
    pipeline
        .forward_modifiable(&callback_url, &["chargingprofiles", "result"], &[stash], {
            move |replacement| rewrite(original, replacement)
        })
        .await?;
    Ok(render(pipeline.response().await?))
}

/// Async result delivery through the stored callback mapping.
async fn sender_result(
    State(state): State<GatewayState>,
    Path(uid): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::ChargingProfiles,
        InterfaceRole::Sender,
        RequestMethod::Post,
        &headers,
        Some(uid),
        BTreeMap::new(),
        optional_json(&body)?,
    )?;
    run_proxied(&state, envelope).await
}

/// Active-profile push to the profile owner; a plain forward.
async fn sender_update(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::ChargingProfiles,
        InterfaceRole::Sender,
        RequestMethod::Put,
        &headers,
        Some(session_id),
        BTreeMap::new(),
        optional_json(&body)?,
    )?;
    run_forward(&state, envelope).await
}
