//! Construction errors for wire-level types.

use thiserror::Error;

/// Errors raised while building or validating a request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Party identifier failed canonicalization (wrong length or charset).
    #[error("invalid party identifier: {0}")]
    InvalidParty(String),

    /// Sender and receiver resolved to the same party.
    #[error("sender and receiver must be distinct parties")]
    SenderIsReceiver,

    /// A required header was absent from the inbound request.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// A header was present but not parseable.
    #[error("malformed header {name}: {reason}")]
    MalformedHeader { name: &'static str, reason: String },

    /// A body or query field the module route requires was absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A request body was present but not valid JSON.
    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),
}
