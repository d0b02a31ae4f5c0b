//! The node-to-node relay endpoint.
//!
//! Peer nodes POST a serialized envelope here with their signature in the
//! `OCN-Signature` header. The payload is verified against the raw bytes as
//! received, so the body must reach the validator untouched. A handled
//! relay always answers 200 with the downstream response serialized whole;
//! the sending node re-renders its status and surfaced headers for the
//! original caller.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use ocn_core::domain::pipeline::RequestPipeline;
use ocn_core::domain::relay::decode_payload;
use ocn_core::RelayError;
use ocn_types::header_names;

use crate::error::GatewayError;
use crate::service::GatewayState;

pub fn routes() -> Router<GatewayState> {
    Router::new().route("/ocn/message", post(receive_relay))
}

async fn receive_relay(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, GatewayError> {
    let signature = headers
        .get(header_names::SIGNATURE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            RelayError::SignatureInvalid("relay carries no node signature".into())
        })?;

    let envelope = decode_payload(body.as_bytes())?;
    let mut pipeline = RequestPipeline::new(state.ctx.clone(), envelope);
    pipeline.validate_relay(body.as_bytes(), &signature).await?;
    pipeline.forward_relayed().await?;
    let downstream = pipeline.response().await?;
    Ok((StatusCode::OK, Json(downstream)).into_response())
}
