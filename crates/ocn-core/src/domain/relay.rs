//! Relay-inbound plumbing: payload decoding and hand-off registration.

use ocn_types::{HandoffKind, RequestEnvelope};
use tracing::debug;

use crate::context::NodeContext;
use crate::domain::errors::RelayError;
use crate::ports::ProxyResourceStore;

/// Decodes a relay payload into an envelope.
pub fn decode_payload(payload: &[u8]) -> Result<RequestEnvelope, RelayError> {
    serde_json::from_slice(payload).map_err(|e| RelayError::MalformedRelay(e.to_string()))
}

/// Registers hand-off metadata carried by a relayed envelope.
///
/// Returns whether the ensuing dispatch must resolve its target through
/// the proxy store: a paged fetch is itself the proxied call, while a
/// callback registration only plants the mapping the FUTURE callback will
/// resolve, reversed to that callback's orientation.
pub async fn register_handoff(
    ctx: &NodeContext,
    envelope: &RequestEnvelope,
) -> Result<bool, RelayError> {
    let Some(handoff) = &envelope.proxy else {
        return Ok(false);
    };

    let sender = &envelope.headers.sender;
    let receiver = &envelope.headers.receiver;

    let proxied = match handoff.kind {
        HandoffKind::PagedFetch => {
            ctx.proxies()
                .create(&handoff.resource, sender, receiver, Some(handoff.id.clone()))
                .await?;
            true
        }
        HandoffKind::CallbackRegistration => {
            ctx.proxies()
                .create(&handoff.resource, receiver, sender, Some(handoff.id.clone()))
                .await?;
            false
        }
    };
    debug!(id = %handoff.id, kind = ?handoff.kind, "registered relay hand-off");
    Ok(proxied)
}
