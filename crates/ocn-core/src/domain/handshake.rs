//! The credentials handshake: how a platform becomes routable.
//!
//! A platform that holds a setup token posts its own credentials object; the
//! node walks the platform's version catalog, stores the 2.2 endpoints and
//! the registered parties, rotates the session token and answers with
//! credentials of its own. Re-registration runs the same walk under the
//! current session token.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use ocn_types::{InterfaceRole, ModuleId, PartyId, PeerResponse};

use crate::context::NodeContext;
use crate::domain::errors::RelayError;
use crate::domain::registration::{ConnectionStatus, EndpointRecord, PlatformRecord};
use crate::ports::{HttpDispatcher, PlatformDirectory};

/// Credentials object exchanged during the handshake, both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformCredentials {
    /// Token the counterparty must present on every subsequent call.
    pub token: String,
    /// Version-catalog URL of the issuing side.
    pub url: String,
    #[serde(default)]
    pub roles: Vec<CredentialsRole>,
}

/// One business role carried in a credentials object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialsRole {
    pub role: String,
    pub party_id: String,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_details: Option<Value>,
}

/// Mints an opaque bearer token.
pub fn mint_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Walks the registering platform's version catalog, persists everything this
/// node needs to route to it, and rotates the session token. The caller has
/// already authenticated the platform; the returned record carries the fresh
/// session token.
pub async fn complete_registration(
    ctx: &NodeContext,
    mut platform: PlatformRecord,
    credentials: PlatformCredentials,
) -> Result<PlatformRecord, RelayError> {
    let listing = catalog_data(
        ctx.dispatcher().fetch(&credentials.url, &credentials.token).await?,
        "version listing",
    )?;
    let detail_url = version_2_2_url(&listing)?;
    let details = catalog_data(
        ctx.dispatcher().fetch(&detail_url, &credentials.token).await?,
        "version details",
    )?;

    let endpoints = parse_endpoints(&details);
    let parties = parse_parties(&credentials)?;

    platform.status = ConnectionStatus::Connected;
    platform.setup_token = None;
    platform.session_token = Some(mint_token());
    platform.outbound_token = Some(credentials.token);
    platform.versions_url = Some(credentials.url);

    ctx.directory().update_platform(platform.clone()).await?;
    ctx.directory().set_parties(platform.id, parties.clone()).await?;
    ctx.directory().set_endpoints(platform.id, endpoints).await?;

    info!(platform = platform.id, parties = parties.len(), "platform registration completed");
    Ok(platform)
}

/// Unwraps the `data` element of a successful catalog response.
fn catalog_data(response: PeerResponse, what: &str) -> Result<Value, RelayError> {
    if response.status != 200 || !response.is_protocol_success() {
        return Err(RelayError::DownstreamShape(format!(
            "{what} answered HTTP {} with protocol status {:?}",
            response.status,
            response.ocpi_status()
        )));
    }
    response
        .body
        .get("data")
        .cloned()
        .ok_or_else(|| RelayError::DownstreamShape(format!("{what} carries no data")))
}

fn version_2_2_url(listing: &Value) -> Result<String, RelayError> {
    listing
        .as_array()
        .and_then(|versions| {
            versions
                .iter()
                .find(|entry| entry.get("version").and_then(Value::as_str) == Some("2.2"))
        })
        .and_then(|entry| entry.get("url").and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| RelayError::DownstreamShape("platform offers no version 2.2".into()))
}

/// Endpoint entries with module identifiers or roles this node does not
/// route for are skipped, not rejected.
fn parse_endpoints(details: &Value) -> Vec<EndpointRecord> {
    let Some(entries) = details.get("endpoints").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let module = entry.get("identifier")?.as_str()?.parse::<ModuleId>().ok()?;
            let role = match entry.get("role")?.as_str()? {
                "SENDER" => InterfaceRole::Sender,
                "RECEIVER" => InterfaceRole::Receiver,
                _ => return None,
            };
            let url = entry.get("url")?.as_str()?.to_string();
            Some(EndpointRecord { module, role, url })
        })
        .collect()
}

fn parse_parties(credentials: &PlatformCredentials) -> Result<Vec<PartyId>, RelayError> {
    let mut parties = Vec::with_capacity(credentials.roles.len());
    for role in &credentials.roles {
        let party = PartyId::new(&role.country_code, &role.party_id)?;
        if !parties.contains(&party) {
            parties.push(party);
        }
    }
    Ok(parties)
}
