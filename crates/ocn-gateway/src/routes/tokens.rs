//! Tokens module routes.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use ocn_types::{InterfaceRole, ModuleId, RequestMethod};

use crate::error::GatewayError;
use crate::extract::{module_envelope, optional_json, request_method};
use crate::routes::{run_forward, run_paginated, run_proxied_paginated};
use crate::service::GatewayState;

pub fn routes() -> Router<GatewayState> {
    Router::new()
        .route("/ocpi/sender/2.2/tokens", get(sender_list))
        .route("/ocpi/sender/2.2/tokens/page/:uid", get(sender_page))
        .route("/ocpi/sender/2.2/tokens/:uid/authorize", post(sender_authorize))
        .route(
            "/ocpi/receiver/2.2/tokens/:country/:party/:id",
            get(receiver_object).put(receiver_object).patch(receiver_object),
        )
}

async fn sender_list(
    State(state): State<GatewayState>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Tokens,
        InterfaceRole::Sender,
        RequestMethod::Get,
        &headers,
        None,
        query,
        None,
    )?;
    run_paginated(&state, envelope).await
}

async fn sender_page(
    State(state): State<GatewayState>,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Tokens,
        InterfaceRole::Sender,
        RequestMethod::Get,
        &headers,
        Some(uid),
        BTreeMap::new(),
        None,
    )?;
    run_proxied_paginated(&state, envelope).await
}

/// Real-time authorization. The optional body carries location references;
/// the `type` query parameter passes through untouched.
async fn sender_authorize(
    State(state): State<GatewayState>,
    Path(uid): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Tokens,
        InterfaceRole::Sender,
        RequestMethod::Post,
        &headers,
        Some(format!("{uid}/authorize")),
        query,
        optional_json(&body)?,
    )?;
    run_forward(&state, envelope).await
}

async fn receiver_object(
    State(state): State<GatewayState>,
    Path((country, party, id)): Path<(String, String, String)>,
    Query(query): Query<BTreeMap<String, String>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Tokens,
        InterfaceRole::Receiver,
        request_method(&method)?,
        &headers,
        Some(format!("{country}/{party}/{id}")),
        query,
        optional_json(&body)?,
    )?;
    run_forward(&state, envelope).await
}
