//! Locations module routes.

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
        .route("/ocpi/sender/2.2/locations", get(sender_list))
        .route("/ocpi/sender/2.2/locations/page/:uid", get(sender_page))
        .route("/ocpi/sender/2.2/locations/:id", get(sender_object))
        .route("/ocpi/sender/2.2/locations/:id/:evse", get(sender_evse))
        .route("/ocpi/sender/2.2/locations/:id/:evse/:connector", get(sender_connector))
        .route(
            "/ocpi/receiver/2.2/locations/:country/:party/:id",
            get(receiver_object).put(receiver_object).patch(receiver_object),
        )
        .route(
            "/ocpi/receiver/2.2/locations/:country/:party/:id/:evse",
            get(receiver_evse).put(receiver_evse).patch(receiver_evse),
        )
        .route(
            "/ocpi/receiver/2.2/locations/:country/:party/:id/:evse/:connector",
            get(receiver_connector).put(receiver_connector).patch(receiver_connector),
        )
}

async fn sender_list(
    State(state): State<GatewayState>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Locations,
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
        ModuleId::Locations,
        InterfaceRole::Sender,
        RequestMethod::Get,
        &headers,
        Some(uid),
        BTreeMap::new(),
        None,
    )?;
    run_proxied_paginated(&state, envelope).await
}

async fn sender_object(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    sender_fetch(state, headers, id).await
}

async fn sender_evse(
    State(state): State<GatewayState>,
    Path((id, evse)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    sender_fetch(state, headers, format!("{id}/{evse}")).await
}

async fn sender_connector(
    State(state): State<GatewayState>,
    Path((id, evse, connector)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    sender_fetch(state, headers, format!("{id}/{evse}/{connector}")).await
}

async fn sender_fetch(
    state: GatewayState,
    headers: HeaderMap,
    suffix: String,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Locations,
        InterfaceRole::Sender,
        RequestMethod::Get,
        &headers,
        Some(suffix),
        BTreeMap::new(),
        None,
    )?;
    run_forward(&state, envelope).await
}

async fn receiver_object(
    State(state): State<GatewayState>,
    Path((country, party, id)): Path<(String, String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    receiver_push(state, method, headers, body, format!("{country}/{party}/{id}")).await
}

async fn receiver_evse(
    State(state): State<GatewayState>,
    Path((country, party, id, evse)): Path<(String, String, String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    receiver_push(state, method, headers, body, format!("{country}/{party}/{id}/{evse}")).await
}

async fn receiver_connector(
    State(state): State<GatewayState>,
    Path((country, party, id, evse, connector)): Path<(String, String, String, String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    receiver_push(
        state,
        method,
        headers,
        body,
        format!("{country}/{party}/{id}/{evse}/{connector}"),
    )
    .await
}

async fn receiver_push(
    state: GatewayState,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
    suffix: String,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Locations,
        InterfaceRole::Receiver,
        request_method(&method)?,
        &headers,
        Some(suffix),
        BTreeMap::new(),
        optional_json(&body)?,
    )?;
    run_forward(&state, envelope).await
}
