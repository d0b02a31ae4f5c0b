//! Envelope-level signing: the signature blob carried in the `OCN-Signature`
//! header, placeholder substitution for relay-rewritten fields, and the raw
//! payload signatures used on node-to-node relays.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ocn_types::{RequestEnvelope, SignableView};

use crate::ecdsa::{keccak256, recover_signer, sign_digest, Address, RsvSignature};
use crate::errors::NotaryError;
use crate::signer::NodeSigner;

/// Value substituted for rewritable fields before hashing.
///
/// Both the signing and the verifying side replace the named fields with
/// this constant, so a relay may rewrite them without breaking signatures.
pub const FIELD_PLACEHOLDER: &str = "__OCN_PLACEHOLDER__";

/// A rewritable location inside the signable view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SignableField {
    /// A JSON pointer into the body, e.g. `/response_url`.
    Body { pointer: String },
    /// A named query parameter.
    Query { name: String },
}

impl SignableField {
    pub fn body(pointer: impl Into<String>) -> Self {
        SignableField::Body { pointer: pointer.into() }
    }

    pub fn query(name: impl Into<String>) -> Self {
        SignableField::Query { name: name.into() }
    }

    fn describe(&self) -> String {
        match self {
            SignableField::Body { pointer } => format!("body{pointer}"),
            SignableField::Query { name } => format!("query:{name}"),
        }
    }
}

/// The decoded `OCN-Signature` header: signature components, the signer's
/// claimed address and the fields that were placeheld before signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSignature {
    pub r: String,
    pub s: String,
    pub v: u8,
    pub signatory: Address,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placeheld: Vec<SignableField>,
}

impl EnvelopeSignature {
    /// Encodes the blob for header transport.
    pub fn encode(&self) -> Result<String, NotaryError> {
        let json = serde_json::to_vec(self).map_err(|e| NotaryError::Encoding(e.to_string()))?;
        Ok(BASE64.encode(json))
    }

    /// Decodes a header value back into a blob.
    pub fn decode(header_value: &str) -> Result<Self, NotaryError> {
        let raw = BASE64
            .decode(header_value.trim())
            .map_err(|e| NotaryError::MalformedBlob(format!("base64: {e}")))?;
        serde_json::from_slice(&raw).map_err(|e| NotaryError::MalformedBlob(format!("json: {e}")))
    }

    fn components(&self) -> Result<RsvSignature, NotaryError> {
        Ok(RsvSignature {
            r: decode_scalar(&self.r)?,
            s: decode_scalar(&self.s)?,
            v: self.v,
        })
    }
}

fn decode_scalar(text: &str) -> Result<[u8; 32], NotaryError> {
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    let raw = hex::decode(stripped)
        .map_err(|_| NotaryError::InvalidComponent("scalar is not valid hex"))?;
    if raw.len() != 32 {
        return Err(NotaryError::InvalidComponent("scalar must be 32 bytes"));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&raw);
    Ok(out)
}

/// Replaces each named field with [`FIELD_PLACEHOLDER`] in place.
///
/// A named field that is absent is an error: signing over a silently
/// missing field would let a relay drop it undetected.
fn apply_placeholders(view: &mut SignableView, fields: &[SignableField]) -> Result<(), NotaryError> {
    for field in fields {
        match field {
            SignableField::Body { pointer } => {
                let slot = view
                    .body
                    .as_mut()
                    .and_then(|body| body.pointer_mut(pointer))
                    .ok_or_else(|| NotaryError::UnknownField(field.describe()))?;
                *slot = Value::String(FIELD_PLACEHOLDER.to_string());
            }
            SignableField::Query { name } => {
                let slot = view
                    .query_params
                    .as_mut()
                    .and_then(|params| params.get_mut(name))
                    .ok_or_else(|| NotaryError::UnknownField(field.describe()))?;
                *slot = FIELD_PLACEHOLDER.to_string();
            }
        }
    }
    Ok(())
}

fn view_digest(view: &SignableView, fields: &[SignableField]) -> Result<[u8; 32], NotaryError> {
    let mut reduced = view.clone();
    apply_placeholders(&mut reduced, fields)?;
    let bytes = serde_json::to_vec(&reduced).map_err(|e| NotaryError::Encoding(e.to_string()))?;
    Ok(keccak256(&bytes))
}

/// Signs a signable view with no placeholder substitution.
pub fn sign_view(view: &SignableView, signer: &NodeSigner) -> Result<EnvelopeSignature, NotaryError> {
    sign_view_with(view, &[], signer)
}

fn sign_view_with(
    view: &SignableView,
    fields: &[SignableField],
    signer: &NodeSigner,
) -> Result<EnvelopeSignature, NotaryError> {
    let digest = view_digest(view, fields)?;
    let components = sign_digest(&digest, signer.signing_key())?;
    Ok(EnvelopeSignature {
        r: hex::encode(components.r),
        s: hex::encode(components.s),
        v: components.v,
        signatory: *signer.address(),
        placeheld: fields.to_vec(),
    })
}

/// Signs an envelope whose named fields are about to be rewritten.
///
/// The caller signs while the fields still hold their pre-rewrite values;
/// because the fields are placeheld, the signature stays valid after the
/// rewrite and on every later hop that applies the same substitution.
pub fn stash_and_resign(
    envelope: &RequestEnvelope,
    fields: &[SignableField],
    signer: &NodeSigner,
) -> Result<EnvelopeSignature, NotaryError> {
    sign_view_with(&envelope.signable(), fields, signer)
}

/// Verifies a signature blob against a view and the signer address on
/// record.
///
/// The blob's placeheld fields are re-applied before hashing. The recovered
/// address must match both the blob's claimed signatory and `expected`.
pub fn verify_view(
    view: &SignableView,
    signature: &EnvelopeSignature,
    expected: &Address,
) -> Result<(), NotaryError> {
    let digest = view_digest(view, &signature.placeheld)?;
    let recovered = recover_signer(&digest, &signature.components()?)?;

    if recovered != signature.signatory {
        return Err(NotaryError::SignerMismatch {
            recovered: recovered.to_hex(),
            expected: signature.signatory.to_hex(),
        });
    }
    if recovered != *expected {
        return Err(NotaryError::SignerMismatch {
            recovered: recovered.to_hex(),
            expected: expected.to_hex(),
        });
    }
    Ok(())
}

/// Signs raw payload bytes (node-to-node relay bodies). The returned value
/// is `0x`-prefixed hex of the packed 65-byte signature.
pub fn sign_payload(payload: &[u8], signer: &NodeSigner) -> Result<String, NotaryError> {
    let digest = keccak256(payload);
    let components = sign_digest(&digest, signer.signing_key())?;
    Ok(format!("0x{}", hex::encode(components.to_bytes())))
}

/// Recovers the signer address of a raw payload signature.
pub fn recover_payload_signer(payload: &[u8], signature_hex: &str) -> Result<Address, NotaryError> {
    let stripped = signature_hex.strip_prefix("0x").unwrap_or(signature_hex);
    let raw = hex::decode(stripped.trim())
        .map_err(|_| NotaryError::MalformedBlob("payload signature is not valid hex".into()))?;
    let components = RsvSignature::from_bytes(&raw)?;
    recover_signer(&keccak256(payload), &components)
}
