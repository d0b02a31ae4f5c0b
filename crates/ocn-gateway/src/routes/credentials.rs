//! The credentials handshake endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use ocn_core::domain::auth::bearer_token;
use ocn_core::domain::handshake::{complete_registration, CredentialsRole, PlatformCredentials};
use ocn_core::domain::registration::PlatformRecord;
use ocn_core::domain::urls::join_url;
use ocn_core::ports::PlatformDirectory;
use ocn_core::RelayError;
use ocn_types::{header_names, OcpiResponse};

use crate::error::GatewayError;
use crate::service::GatewayState;

pub fn routes() -> Router<GatewayState> {
    Router::new().route(
        "/ocpi/2.2/credentials",
        post(register).put(update_registration).delete(unregister),
    )
}

fn presented_token(headers: &HeaderMap) -> Result<String, GatewayError> {
    let authorization = headers
        .get(header_names::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    Ok(bearer_token(authorization)?.to_string())
}

/// The credentials object this node answers a completed handshake with.
fn node_credentials(
    state: &GatewayState,
    platform: &PlatformRecord,
) -> Result<PlatformCredentials, GatewayError> {
    let token = platform
        .session_token
        .clone()
        .ok_or_else(|| RelayError::Internal("connected platform has no session token".into()))?;
    Ok(PlatformCredentials {
        token,
        url: join_url(state.ctx.node_url(), &["ocpi", "versions"]),
        roles: vec![CredentialsRole {
            role: "HUB".into(),
            party_id: state.info.party.party_id().to_string(),
            country_code: state.info.party.country_code().to_string(),
            business_details: Some(json!({ "name": state.info.operator })),
        }],
    })
}

/// First registration, authenticated by the one-shot setup token.
async fn register(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(credentials): Json<PlatformCredentials>,
) -> Result<Json<OcpiResponse<PlatformCredentials>>, GatewayError> {
    let token = presented_token(&headers)?;
    let platform = state
        .ctx
        .directory()
        .platform_by_setup_token(&token)
        .await?
        .ok_or(RelayError::InvalidCredential)?;
    let connected = complete_registration(&state.ctx, platform, credentials).await?;
    Ok(Json(OcpiResponse::success(node_credentials(&state, &connected)?)))
}

/// Re-registration under the current session token: the catalog walk runs
/// again and the session token rotates.
async fn update_registration(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(credentials): Json<PlatformCredentials>,
) -> Result<Json<OcpiResponse<PlatformCredentials>>, GatewayError> {
    let token = presented_token(&headers)?;
    let platform = state
        .ctx
        .directory()
        .platform_by_session_token(&token)
        .await?
        .ok_or(RelayError::InvalidCredential)?;
    let connected = complete_registration(&state.ctx, platform, credentials).await?;
    Ok(Json(OcpiResponse::success(node_credentials(&state, &connected)?)))
}

async fn unregister(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<Json<OcpiResponse<()>>, GatewayError> {
    let token = presented_token(&headers)?;
    let platform = state
        .ctx
        .directory()
        .platform_by_session_token(&token)
        .await?
        .ok_or(RelayError::InvalidCredential)?;
    state.ctx.directory().remove_platform(platform.id).await?;
    info!(platform = platform.id, "platform unregistered");
    Ok(Json(OcpiResponse::success_empty()))
}
