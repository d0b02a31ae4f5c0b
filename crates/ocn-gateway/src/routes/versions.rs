//! The node's own version catalog, served to registering platforms.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use ocn_core::domain::auth::bearer_token;
use ocn_core::domain::urls::join_url;
use ocn_core::ports::PlatformDirectory;
use ocn_core::RelayError;
use ocn_types::{header_names, InterfaceRole, ModuleId, OcpiResponse};

use crate::error::GatewayError;
use crate::service::GatewayState;

pub fn routes() -> Router<GatewayState> {
    Router::new()
        .route("/ocpi/versions", get(version_listing))
        .route("/ocpi/2.2", get(version_details))
}

/// Modules this node routes on both interfaces.
const ROUTED_MODULES: [ModuleId; 7] = [
    ModuleId::Cdrs,
    ModuleId::ChargingProfiles,
    ModuleId::Commands,
    ModuleId::Locations,
    ModuleId::Sessions,
    ModuleId::Tariffs,
    ModuleId::Tokens,
];

/// Setup tokens and session tokens both open the catalog; nothing else does.
async fn authorize_catalog(state: &GatewayState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let authorization = headers
        .get(header_names::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let token = bearer_token(authorization)?;
    let directory = state.ctx.directory();
    if directory.platform_by_session_token(token).await?.is_some()
        || directory.platform_by_setup_token(token).await?.is_some()
    {
        return Ok(());
    }
    Err(RelayError::InvalidCredential.into())
}

async fn version_listing(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<Json<OcpiResponse<Value>>, GatewayError> {
    authorize_catalog(&state, &headers).await?;
    let listing = json!([{
        "version": "2.2",
        "url": join_url(state.ctx.node_url(), &["ocpi", "2.2"]),
    }]);
    Ok(Json(OcpiResponse::success(listing)))
}

async fn version_details(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<Json<OcpiResponse<Value>>, GatewayError> {
    authorize_catalog(&state, &headers).await?;
    let node_url = state.ctx.node_url();
    let mut endpoints = vec![json!({
        "identifier": ModuleId::Credentials,
        "role": InterfaceRole::Sender,
        "url": join_url(node_url, &["ocpi", "2.2", "credentials"]),
    })];
    for module in ROUTED_MODULES {
        for role in [InterfaceRole::Sender, InterfaceRole::Receiver] {
            endpoints.push(json!({
                "identifier": module,
                "role": role,
                "url": join_url(node_url, &["ocpi", role.as_path_segment(), "2.2", module.as_str()]),
            }));
        }
    }
    Ok(Json(OcpiResponse::success(json!({
        "version": "2.2",
        "endpoints": endpoints,
    }))))
}
