//! Forwarding: classify, resolve, dispatch.
//!
//! `forward` is the plain path. `forward_modifiable` is the variant for
//! flows that carry an async callback URL the node must take custody of
//! before the receiver ever sees it.

use tracing::debug;
use uuid::Uuid;

use ocn_notary::{stash_and_resign, SignableField};
use ocn_types::{HandoffKind, PeerResponse, ProxyHandoff, RequestEnvelope};

use crate::context::NodeContext;
use crate::domain::errors::RelayError;
use crate::domain::relay::register_handoff;
use crate::domain::routing::{classify, resolve_local, resolve_remote, Route};
use crate::domain::urls::join_url;
use crate::ports::{HttpDispatcher, ProxyResourceStore, RegistryApi};

/// Forwards a validated envelope to its receiver, local or remote.
pub async fn forward(
    ctx: &NodeContext,
    envelope: &RequestEnvelope,
    proxied: bool,
) -> Result<PeerResponse, RelayError> {
    let route = classify(ctx, &envelope.headers.receiver).await?;
    debug!(
        module = %envelope.module,
        sender = %envelope.headers.sender,
        receiver = %envelope.headers.receiver,
        correlation_id = %envelope.headers.correlation_id,
        ?route,
        proxied,
        "forwarding"
    );

    let plan = match route {
        Route::Local => resolve_local(ctx, envelope, proxied).await?,
        Route::Remote => resolve_remote(ctx, envelope, proxied).await?,
    };
    ctx.dispatcher().dispatch(plan).await
}

/// Forwards a relay-inbound envelope to the locally operated receiver,
/// honoring carried hand-off metadata. Returns the response together with
/// whether the dispatch consumed a proxy mapping.
pub async fn forward_relayed(
    ctx: &NodeContext,
    envelope: &RequestEnvelope,
) -> Result<(PeerResponse, bool), RelayError> {
    let proxied = register_handoff(ctx, envelope).await?;
    debug!(
        module = %envelope.module,
        sender = %envelope.headers.sender,
        receiver = %envelope.headers.receiver,
        correlation_id = %envelope.headers.correlation_id,
        proxied,
        "forwarding relayed"
    );

    let plan = resolve_local(ctx, envelope, proxied).await?;
    let response = ctx.dispatcher().dispatch(plan).await?;
    Ok((response, proxied))
}

/// Forwards an envelope whose `callback_url` the node takes custody of.
///
/// The real URL goes into the proxy store under the orientation of the
/// FUTURE callback (parties swapped), and `rewrite` receives the
/// node-relative replacement to embed where the real URL used to be. When
/// the receiver lives on a peer node, the replacement points at that node
/// and the mapping travels as callback-registration hand-off metadata.
pub async fn forward_modifiable(
    ctx: &NodeContext,
    envelope: &RequestEnvelope,
    callback_url: &str,
    callback_path: &[&str],
    stash_fields: &[SignableField],
    rewrite: impl FnOnce(String) -> RequestEnvelope,
) -> Result<PeerResponse, RelayError> {
    let sender = &envelope.headers.sender;
    let receiver = &envelope.headers.receiver;
    let route = classify(ctx, receiver).await?;

    let (uid, callback_base) = match route {
        Route::Local => {
            let uid = ctx.proxies().create(callback_url, receiver, sender, None).await?;
            (uid, ctx.node_url().to_string())
        }
        Route::Remote => {
            // The peer node registers the reversed mapping under this id.
            let uid = Uuid::new_v4().to_string();
            ctx.proxies()
                .create(callback_url, receiver, sender, Some(uid.clone()))
                .await?;
            (uid, ctx.registry().node_base_url_of(receiver).await?)
        }
    };

    let mut segments = vec!["ocpi", "sender", "2.2"];
    segments.extend_from_slice(callback_path);
    segments.push(&uid);
    let replacement = join_url(&callback_base, &segments);

    debug!(
        module = %envelope.module,
        sender = %sender,
        receiver = %receiver,
        correlation_id = %envelope.headers.correlation_id,
        ?route,
        %replacement,
        "rewriting callback url"
    );

    let rewritten = rewrite(replacement);

    let signing_active = ctx.signing_required() || rewritten.headers.signature.is_some();
    let outbound = if signing_active {
        let signature = stash_and_resign(&rewritten, stash_fields, ctx.signer())
            .map_err(|e| RelayError::Internal(format!("callback re-signing: {e}")))?;
        let encoded = signature
            .encode()
            .map_err(|e| RelayError::Internal(format!("callback re-signing: {e}")))?;
        rewritten.with_signature(encoded)
    } else {
        rewritten
    };

    let plan = match route {
        Route::Local => resolve_local(ctx, &outbound, false).await?,
        Route::Remote => {
            let with_handoff = outbound.with_proxy(ProxyHandoff {
                id: uid,
                resource: callback_url.to_string(),
                kind: HandoffKind::CallbackRegistration,
            });
            resolve_remote(ctx, &with_handoff, false).await?
        }
    };
    ctx.dispatcher().dispatch(plan).await
}
