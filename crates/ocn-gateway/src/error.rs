//! Error surfacing: every relay error leaves the node as a protocol error
//! body with the stable HTTP / protocol status pair.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error};

use ocn_core::RelayError;
use ocn_types::OcpiResponse;

/// Newtype carrying a [`RelayError`] onto the HTTP surface.
#[derive(Debug)]
pub struct GatewayError(pub RelayError);

impl From<RelayError> for GatewayError {
    fn from(error: RelayError) -> Self {
        Self(error)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            debug!(error = %self.0, "request rejected");
        }
        let body: OcpiResponse<()> = OcpiResponse::error(self.0.ocpi_status(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}
