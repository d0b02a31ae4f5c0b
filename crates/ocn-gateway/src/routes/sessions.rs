//! Sessions module routes.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use ocn_types::{InterfaceRole, ModuleId, RequestMethod};

use crate::error::GatewayError;
use crate::extract::{module_envelope, optional_json, request_method};
use crate::routes::{run_forward, run_paginated, run_proxied_paginated};
use crate::service::GatewayState;

pub fn routes() -> Router<GatewayState> {
    Router::new()
        .route("/ocpi/sender/2.2/sessions", get(sender_list))
        .route("/ocpi/sender/2.2/sessions/page/:uid", get(sender_page))
        .route(
            "/ocpi/receiver/2.2/sessions/:country/:party/:id",
            get(receiver_object).put(receiver_object).patch(receiver_object),
        )
}

async fn sender_list(
    State(state): State<GatewayState>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Sessions,
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
        ModuleId::Sessions,
        InterfaceRole::Sender,
        RequestMethod::Get,
        &headers,
        Some(uid),
        BTreeMap::new(),
        None,
    )?;
    run_proxied_paginated(&state, envelope).await
}

async fn receiver_object(
    State(state): State<GatewayState>,
    Path((country, party, id)): Path<(String, String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Sessions,
        InterfaceRole::Receiver,
        request_method(&method)?,
        &headers,
        Some(format!("{country}/{party}/{id}")),
        BTreeMap::new(),
        optional_json(&body)?,
    )?;
    run_forward(&state, envelope).await
}
