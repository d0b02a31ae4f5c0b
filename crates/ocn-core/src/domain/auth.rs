//! Sender authentication: credential resolution, party membership and
//! signature verification, for both platform-inbound and node-inbound
//! requests.

use ocn_notary::{recover_payload_signer, verify_view, Address, EnvelopeSignature};
use ocn_types::{header_names, PartyId, RequestEnvelope};

use crate::context::NodeContext;
use crate::domain::errors::RelayError;
use crate::domain::registration::PlatformRecord;
use crate::ports::{PlatformDirectory, RegistryApi};

/// Strips the `Token ` scheme from an Authorization header value.
pub fn bearer_token(authorization: &str) -> Result<&str, RelayError> {
    authorization
        .strip_prefix("Token ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(RelayError::InvalidCredential)
}

/// Signing address of the party's node of record. A party the registry does
/// not know cannot have signed anything.
async fn node_address_of(ctx: &NodeContext, party: &PartyId) -> Result<Address, RelayError> {
    match ctx.registry().signing_address_of_node(party).await {
        Ok(address) => Ok(address),
        Err(RelayError::UnknownReceiver { .. }) => Err(RelayError::SignatureInvalid(format!(
            "party {party} has no node of record"
        ))),
        Err(other) => Err(other),
    }
}

/// Validates a platform-inbound envelope.
///
/// The credential must resolve to a connected platform, the claimed sender
/// must belong to that platform, and when signing is active the envelope
/// signature must verify against the sender's node of record. Signing is
/// active under node policy, under the platform's own preference, or as
/// soon as the envelope carries a signature: once signed, stays signed.
pub async fn validate_sender(
    ctx: &NodeContext,
    envelope: &RequestEnvelope,
) -> Result<(), RelayError> {
    envelope.validate()?;

    let token = bearer_token(&envelope.headers.authorization)?;
    let platform = ctx
        .directory()
        .platform_by_session_token(token)
        .await?
        .filter(PlatformRecord::is_connected)
        .ok_or(RelayError::InvalidCredential)?;

    let sender = &envelope.headers.sender;
    if ctx.directory().platform_of_party(sender).await? != Some(platform.id) {
        return Err(RelayError::SenderMismatch { party: sender.to_string() });
    }

    let signing_active = ctx.signing_required()
        || platform.require_signatures
        || envelope.headers.signature.is_some();
    if signing_active {
        verify_envelope_signature(ctx, envelope).await?;
    }
    Ok(())
}

/// Validates a node-inbound relay.
///
/// The node-level signature over the raw payload must recover to the
/// signing address of the sender's node of record, the addressed receiver
/// must be operated here (a node never relays a relay), and a carried
/// envelope signature is verified the same way as on the platform path.
pub async fn validate_relay(
    ctx: &NodeContext,
    payload: &[u8],
    relay_signature: &str,
    envelope: &RequestEnvelope,
) -> Result<(), RelayError> {
    envelope.validate()?;

    let recovered = recover_payload_signer(payload, relay_signature)
        .map_err(|e| RelayError::SignatureInvalid(format!("relay signature: {e}")))?;
    let expected = node_address_of(ctx, &envelope.headers.sender).await?;
    if recovered != expected {
        return Err(RelayError::SignatureInvalid(format!(
            "relay signed by {recovered}, sender's node of record is {expected}"
        )));
    }

    let receiver = &envelope.headers.receiver;
    if !ctx.registry().is_locally_operated(receiver).await? {
        return Err(RelayError::UnknownReceiver { party: receiver.to_string() });
    }

    if envelope.headers.signature.is_some() {
        verify_envelope_signature(ctx, envelope).await?;
    } else if ctx.signing_required() {
        return Err(RelayError::SignatureInvalid(
            "envelope signature required by node policy".into(),
        ));
    }
    Ok(())
}

/// Verifies the carried envelope signature against the sender's node of
/// record.
pub(crate) async fn verify_envelope_signature(
    ctx: &NodeContext,
    envelope: &RequestEnvelope,
) -> Result<(), RelayError> {
    let header = envelope.headers.signature.as_deref().ok_or_else(|| {
        RelayError::SignatureInvalid(format!("{} header missing", header_names::SIGNATURE))
    })?;
    let signature = EnvelopeSignature::decode(header)
        .map_err(|e| RelayError::SignatureInvalid(e.to_string()))?;
    let expected = node_address_of(ctx, &envelope.headers.sender).await?;
    verify_view(&envelope.signable(), &signature, &expected)
        .map_err(|e| RelayError::SignatureInvalid(e.to_string()))
}
