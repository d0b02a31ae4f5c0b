//! The OCPI response body model and the downstream-response wrapper.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol-level status codes (OCPI 2.2 §5).
pub mod ocpi_status {
    pub const SUCCESS: u16 = 1000;
    pub const CLIENT_ERROR: u16 = 2000;
    pub const INVALID_PARAMETERS: u16 = 2001;
    pub const NOT_ENOUGH_INFORMATION: u16 = 2002;
    pub const UNKNOWN_LOCATION: u16 = 2003;
    pub const SERVER_ERROR: u16 = 3000;
    pub const UNSUPPORTED_VERSION: u16 = 3002;
    pub const NO_MATCHING_ENDPOINTS: u16 = 3003;
    pub const HUB_UNKNOWN_RECEIVER: u16 = 4001;
    pub const HUB_REQUEST_TIMEOUT: u16 = 4002;
    pub const HUB_CONNECTION_PROBLEM: u16 = 4003;
}

/// Standard protocol response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcpiResponse<T> {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T> OcpiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status_code: ocpi_status::SUCCESS,
            status_message: None,
            data: Some(data),
            timestamp: Utc::now(),
        }
    }

    pub fn success_empty() -> Self {
        Self {
            status_code: ocpi_status::SUCCESS,
            status_message: None,
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            status_message: Some(message.into()),
            data: None,
            timestamp: Utc::now(),
        }
    }
}

/// The protocol response header subset a node is allowed to surface.
///
/// Everything else a downstream peer sends is dropped at the node boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeaders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

impl ResponseHeaders {
    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.link.is_none()
            && self.total_count.is_none()
            && self.limit.is_none()
    }
}

/// A downstream response as observed from a platform or a peer node.
///
/// This is also the wire shape relayed back across `/ocn/message`: the
/// answering node returns the downstream response verbatim and only the
/// caller-facing node projects headers for its platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerResponse {
    /// Transport-level status of the downstream call.
    pub status: u16,
    #[serde(default, skip_serializing_if = "ResponseHeaders::is_empty")]
    pub headers: ResponseHeaders,
    /// Protocol response body, passed through verbatim.
    pub body: Value,
}

impl PeerResponse {
    /// Protocol status embedded in the body, when the body has the standard
    /// shape.
    pub fn ocpi_status(&self) -> Option<u16> {
        self.body
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
    }

    /// Success at both levels: transport 200 and protocol 1000.
    pub fn is_protocol_success(&self) -> bool {
        self.status == 200 && self.ocpi_status() == Some(ocpi_status::SUCCESS)
    }
}
