//! Response projection: what the original caller gets to see.
//!
//! Bodies pass through verbatim. Headers are reduced to the protocol
//! subset, and the two headers that carry platform-real URLs (`Link` next
//! pages, `Location` of created resources) are replaced with node-relative
//! proxies so callers keep talking to their own node.

use ocn_types::{InterfaceRole, ModuleId, PeerResponse, RequestEnvelope};

use crate::context::NodeContext;
use crate::domain::errors::RelayError;
use crate::domain::urls::join_url;
use crate::ports::ProxyResourceStore;

/// Extracts the `rel="next"` target from a Link header value.
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let part = part.trim();
        let url = part.strip_prefix('<')?.split('>').next()?;
        let params = part.split_once('>')?.1;
        if params.contains("rel=\"next\"") || params.contains("rel=next") {
            Some(url.to_string())
        } else {
            None
        }
    })
}

/// Renders this node's page route for a registered next-page mapping.
pub fn build_next_link(node_url: &str, role: InterfaceRole, module: ModuleId, id: &str) -> String {
    let url = join_url(
        node_url,
        &["ocpi", role.as_path_segment(), "2.2", module.as_str(), "page", id],
    );
    format!("<{url}>; rel=\"next\"")
}

/// Replaces a downstream next-page link with a node-relative one.
///
/// Non-success responses pass through untouched; a Link header without a
/// usable `rel="next"` target is dropped rather than leaked.
pub async fn project_pagination(
    ctx: &NodeContext,
    envelope: &RequestEnvelope,
    mut response: PeerResponse,
) -> Result<PeerResponse, RelayError> {
    if !response.is_protocol_success() {
        return Ok(response);
    }
    let Some(header) = response.headers.link.as_deref() else {
        return Ok(response);
    };
    let Some(next) = parse_next_link(header) else {
        response.headers.link = None;
        return Ok(response);
    };

    let id = ctx
        .proxies()
        .create(&next, &envelope.headers.sender, &envelope.headers.receiver, None)
        .await?;
    response.headers.link =
        Some(build_next_link(ctx.node_url(), envelope.interface_role, envelope.module, &id));
    Ok(response)
}

/// Replaces a downstream `Location` header with a node-relative one under
/// `proxy_path_prefix`.
pub async fn project_location(
    ctx: &NodeContext,
    envelope: &RequestEnvelope,
    mut response: PeerResponse,
    proxy_path_prefix: &str,
) -> Result<PeerResponse, RelayError> {
    if !response.is_protocol_success() {
        return Ok(response);
    }
    let Some(location) = response.headers.location.clone() else {
        return Ok(response);
    };

    let id = ctx
        .proxies()
        .create(&location, &envelope.headers.sender, &envelope.headers.receiver, None)
        .await?;
    response.headers.location = Some(join_url(ctx.node_url(), &[proxy_path_prefix, &id]));
    Ok(response)
}
