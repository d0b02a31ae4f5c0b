//! Relay error taxonomy.
//!
//! Client-attributable failures surface as protocol error responses with a
//! stable HTTP / protocol status pair; `Sequencing` and `Internal` indicate
//! faults of this node and always map to 500.

use thiserror::Error;

use ocn_types::{ocpi_status, EnvelopeError, InterfaceRole, ModuleId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The bearer credential matched no registered platform.
    #[error("unknown credentials token")]
    InvalidCredential,

    /// The claimed sender party is not registered to the presenting
    /// platform.
    #[error("party {party} does not belong to the presenting platform")]
    SenderMismatch { party: String },

    /// A required signature was missing, malformed or made by the wrong
    /// signer.
    #[error("signature rejected: {0}")]
    SignatureInvalid(String),

    /// The receiver is neither registered here nor known on the network.
    #[error("receiver {party} is not known on the network")]
    UnknownReceiver { party: String },

    /// The receiving platform never registered an endpoint for the module
    /// and interface role.
    #[error("receiver does not support {module}/{role}")]
    EndpointNotSupported { module: ModuleId, role: InterfaceRole },

    /// No proxy resource under this id for the sender/receiver pair.
    #[error("no proxy resource {id} for this sender and receiver")]
    UnknownResource { id: String },

    /// Request handler invoked out of order. Programmer error, never
    /// silent.
    #[error("request handled out of order: {0}")]
    Sequencing(&'static str),

    /// The downstream call did not complete in time.
    #[error("downstream request timed out: {0}")]
    DownstreamTimeout(String),

    /// The downstream call failed at the transport level.
    #[error("downstream request failed: {0}")]
    DownstreamConnection(String),

    /// The downstream answered with bytes that are not a protocol response.
    #[error("downstream response is not a protocol response: {0}")]
    DownstreamShape(String),

    /// The inbound request did not form a valid envelope.
    #[error("malformed envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    /// A relayed payload did not deserialize to an envelope.
    #[error("malformed relay payload: {0}")]
    MalformedRelay(String),

    /// Local fault of this node (configuration, serialization, signing).
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Transport status the gateway answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            RelayError::InvalidCredential | RelayError::SignatureInvalid(_) => 401,
            RelayError::SenderMismatch { .. } => 403,
            RelayError::UnknownReceiver { .. } | RelayError::UnknownResource { .. } => 404,
            RelayError::EndpointNotSupported { .. }
            | RelayError::Envelope(_)
            | RelayError::MalformedRelay(_) => 400,
            RelayError::DownstreamTimeout(_) => 504,
            RelayError::DownstreamConnection(_) | RelayError::DownstreamShape(_) => 502,
            RelayError::Sequencing(_) | RelayError::Internal(_) => 500,
        }
    }

    /// Protocol status embedded in the response body.
    pub fn ocpi_status(&self) -> u16 {
        match self {
            RelayError::InvalidCredential
            | RelayError::SenderMismatch { .. }
            | RelayError::SignatureInvalid(_)
            | RelayError::Envelope(_)
            | RelayError::MalformedRelay(_) => ocpi_status::INVALID_PARAMETERS,
            RelayError::UnknownReceiver { .. } => ocpi_status::HUB_UNKNOWN_RECEIVER,
            RelayError::EndpointNotSupported { .. } => ocpi_status::CLIENT_ERROR,
            RelayError::UnknownResource { .. } => ocpi_status::UNKNOWN_LOCATION,
            RelayError::DownstreamTimeout(_) => ocpi_status::HUB_REQUEST_TIMEOUT,
            RelayError::DownstreamConnection(_) | RelayError::DownstreamShape(_) => {
                ocpi_status::HUB_CONNECTION_PROBLEM
            }
            RelayError::Sequencing(_) | RelayError::Internal(_) => ocpi_status::SERVER_ERROR,
        }
    }
}
