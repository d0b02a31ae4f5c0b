//! # OCN Notary Crate
//!
//! Creation and verification of recoverable ECDSA signatures over request
//! envelopes.
//!
//! The signable content of an envelope is its [`ocn_types::SignableView`];
//! this crate serializes the view canonically, hashes it with keccak256 and
//! signs the digest with secp256k1. Verification recovers the signer address
//! from the digest and compares it against the address the registry reports
//! for the claimed signer, so no public-key distribution is needed.
//!
//! Relaying nodes that must rewrite protected fields (async callback URLs)
//! use [`notary::stash_and_resign`]: the rewritable fields are replaced with
//! a fixed placeholder before signing and the field list travels inside the
//! signature blob, so verification applies the identical substitution.

pub mod ecdsa;
pub mod errors;
pub mod notary;
pub mod signer;

pub use ecdsa::{keccak256, recover_signer, sign_digest, Address, RsvSignature};
pub use errors::NotaryError;
pub use notary::{
    recover_payload_signer, sign_payload, sign_view, stash_and_resign, verify_view,
    EnvelopeSignature, SignableField, FIELD_PLACEHOLDER,
};
pub use signer::NodeSigner;
