//! Commands module routes.
//!
//! A command request names the URL its async result must be posted to. The
//! node takes custody of that URL: the receiving platform is handed a
//! callback route on this node, and the callback route delivers the result
//! through the stored mapping.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::post;
use axum::Router;

use ocn_core::RequestPipeline;
use ocn_notary::SignableField;
use ocn_types::{InterfaceRole, ModuleId, RequestMethod};

use crate::error::GatewayError;
use crate::extract::{module_envelope, optional_json};
use crate::routes::{body_response_url, render, rewrite_body_response_url, run_proxied};
use crate::service::GatewayState;

pub fn routes() -> Router<GatewayState> {
    Router::new()
        .route("/ocpi/receiver/2.2/commands/:command", post(receiver_command))
        .route("/ocpi/sender/2.2/commands/:command/:uid", post(sender_callback))
}

async fn receiver_command(
    State(state): State<GatewayState>,
    Path(command): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Commands,
        InterfaceRole::Receiver,
        RequestMethod::Post,
        &headers,
        Some(command.clone()),
        BTreeMap::new(),
        optional_json(&body)?,
    )?;
    let callback_url = body_response_url(&envelope)?;

    let mut pipeline = RequestPipeline::new(state.ctx.clone(), envelope);
    pipeline.validate_sender().await?;
    let original = pipeline.envelope().clone();
    pipeline
        .forward_modifiable(
            &callback_url,
            &["commands", command.as_str()],
            &[SignableField::body("/response_url")],
            move |replacement| rewrite_body_response_url(original, replacement),
        )
        .await?;
    Ok(render(pipeline.response().await?))
}

/// Async result delivery: the uid resolves to the URL the original sender
/// named in its command request.
async fn sender_callback(
    State(state): State<GatewayState>,
    Path((_command, uid)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let envelope = module_envelope(
        ModuleId::Commands,
        InterfaceRole::Sender,
        RequestMethod::Post,
        &headers,
        Some(uid),
        BTreeMap::new(),
        optional_json(&body)?,
    )?;
    run_proxied(&state, envelope).await
}
