//! Operator surface: liveness and registration-token grants.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use subtle::ConstantTimeEq;
use tracing::info;

use ocn_core::domain::auth::bearer_token;
use ocn_core::domain::handshake::mint_token;
use ocn_core::domain::urls::join_url;
use ocn_core::ports::PlatformDirectory;
use ocn_core::RelayError;
use ocn_types::{header_names, PartyId};

use crate::error::GatewayError;
use crate::service::GatewayState;

pub fn routes() -> Router<GatewayState> {
    Router::new()
        .route("/health", get(health))
        .route("/admin/generate-registration-token", post(generate_registration_token))
}

/// A party a platform intends to register, as claimed by the operator.
#[derive(Debug, Deserialize)]
pub struct PartyClaim {
    pub country_code: String,
    pub party_id: String,
}

/// A freshly issued setup token plus where to start the handshake.
#[derive(Debug, Serialize)]
pub struct RegistrationGrant {
    pub token: String,
    pub versions_url: String,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn authorize_admin(state: &GatewayState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let authorization = headers
        .get(header_names::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let presented = bearer_token(authorization)?;
    let granted: bool = state.admin_token.as_bytes().ct_eq(presented.as_bytes()).into();
    if granted {
        Ok(())
    } else {
        Err(RelayError::InvalidCredential.into())
    }
}

/// Plans a platform: mints a one-shot setup token and reserves the claimed
/// parties. The platform becomes routable only after the credentials
/// handshake completes.
async fn generate_registration_token(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(claims): Json<Vec<PartyClaim>>,
) -> Result<Json<RegistrationGrant>, GatewayError> {
    authorize_admin(&state, &headers)?;

    let mut parties = Vec::with_capacity(claims.len());
    for claim in &claims {
        let party =
            PartyId::new(&claim.country_code, &claim.party_id).map_err(RelayError::from)?;
        if !parties.contains(&party) {
            parties.push(party);
        }
    }

    let token = mint_token();
    let platform = state.ctx.directory().create_platform(token.clone()).await?;
    if !parties.is_empty() {
        state.ctx.directory().set_parties(platform.id, parties.clone()).await?;
    }
    info!(platform = platform.id, parties = parties.len(), "registration token issued");

    Ok(Json(RegistrationGrant {
        token,
        versions_url: join_url(state.ctx.node_url(), &["ocpi", "versions"]),
    }))
}
