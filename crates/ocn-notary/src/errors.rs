//! Notary error taxonomy.
//!
//! Every variant is client-attributable except `Encoding` and
//! `SigningFailed`, which indicate local faults.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotaryError {
    /// The signature header did not decode to a signature blob.
    #[error("malformed signature blob: {0}")]
    MalformedBlob(String),

    /// A signature component was out of range (zero, >= curve order, or
    /// a non-canonical high-S value).
    #[error("invalid signature component: {0}")]
    InvalidComponent(&'static str),

    /// The recovery byte was none of 0, 1, 27, 28.
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// No public key could be recovered from the digest and signature.
    #[error("signer recovery failed")]
    RecoveryFailed,

    /// The recovered signer does not match the address on record.
    #[error("recovered signer {recovered} does not match expected {expected}")]
    SignerMismatch { recovered: String, expected: String },

    /// A placeheld field named by the signature is absent from the view.
    #[error("placeheld field not present in view: {0}")]
    UnknownField(String),

    /// Canonical serialization of the signable view failed.
    #[error("canonical encoding failed: {0}")]
    Encoding(String),

    /// The provided signing key material was unusable.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// The underlying ECDSA implementation refused to sign.
    #[error("signing failed")]
    SigningFailed,
}
