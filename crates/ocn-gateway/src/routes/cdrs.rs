//! CDRs module routes.
//!
//! The receiver POST answers with a `Location` header; the node projects it
//! onto an opaque URL under this route namespace, and the GET route resolves
//! that projection back to the platform's real resource.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use ocn_types::{InterfaceRole, ModuleId, RequestMethod};

use crate::error::GatewayError;
use crate::extract::{module_envelope, optional_json};
use crate::routes::{run_paginated, run_proxied, run_proxied_paginated, run_with_location};
use crate::service::GatewayState;

/// Route prefix receipts are projected under.
const CDR_PROXY_PREFIX: &str = "ocpi/receiver/2.2/cdrs";

pub fn routes() -> Router<GatewayState> {
    Router::new()
        .route("/ocpi/sender/2.2/cdrs", get(sender_list))
        .route("/ocpi/sender/2.2/cdrs/page/:uid", get(sender_page))
        .route("/ocpi/receiver/2.2/cdrs", post(receiver_post))
        .route("/ocpi/receiver/2.2/cdrs/:uid", get(receiver_fetch))
}

async fn sender_list(
    State(state): State<GatewayState>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Cdrs,
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
        ModuleId::Cdrs,
        InterfaceRole::Sender,
        RequestMethod::Get,
        &headers,
        Some(uid),
        BTreeMap::new(),
        None,
    )?;
    run_proxied_paginated(&state, envelope).await
}

async fn receiver_post(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Cdrs,
        InterfaceRole::Receiver,
        RequestMethod::Post,
        &headers,
        None,
        BTreeMap::new(),
        optional_json(&body)?,
    )?;
    run_with_location(&state, envelope, CDR_PROXY_PREFIX).await
}

async fn receiver_fetch(
    State(state): State<GatewayState>,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Cdrs,
        InterfaceRole::Receiver,
        RequestMethod::Get,
        &headers,
        Some(uid),
        BTreeMap::new(),
        None,
    )?;
    run_proxied(&state, envelope).await
}
