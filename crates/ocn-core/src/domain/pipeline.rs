//! The request pipeline: one inbound request from validation to the
//! response handed back to the caller.
//!
//! States move strictly `Fresh -> Validated -> Forwarded -> Finalized`.
//! Out-of-order use is a programmer error in the HTTP adapter and surfaces
//! as [`RelayError::Sequencing`], never as silent misbehavior.

use std::sync::Arc;

use ocn_notary::SignableField;
use ocn_types::{PeerResponse, RequestEnvelope};

use crate::context::NodeContext;
use crate::domain::errors::RelayError;
use crate::domain::{auth, forward, project};
use crate::ports::ProxyResourceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Fresh,
    Validated,
    Forwarded,
    Finalized,
}

/// Orchestrator for one inbound request.
pub struct RequestPipeline {
    ctx: Arc<NodeContext>,
    envelope: RequestEnvelope,
    state: PipelineState,
    /// Entry was `validate_relay`; only `forward_relayed` may follow.
    relay_inbound: bool,
    /// The executed forward resolved through the proxy store.
    forwarded_proxied: bool,
    response: Option<PeerResponse>,
}

impl RequestPipeline {
    pub fn new(ctx: Arc<NodeContext>, envelope: RequestEnvelope) -> Self {
        Self {
            ctx,
            envelope,
            state: PipelineState::Fresh,
            relay_inbound: false,
            forwarded_proxied: false,
            response: None,
        }
    }

    pub fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    fn expect(&self, state: PipelineState, violation: &'static str) -> Result<(), RelayError> {
        if self.state == state {
            Ok(())
        } else {
            Err(RelayError::Sequencing(violation))
        }
    }

    /// Platform-inbound entry: credential, membership, signature.
    pub async fn validate_sender(&mut self) -> Result<(), RelayError> {
        self.expect(PipelineState::Fresh, "validate called twice")?;
        auth::validate_sender(&self.ctx, &self.envelope).await?;
        self.state = PipelineState::Validated;
        Ok(())
    }

    /// Node-inbound entry: relay signature, receiver locality, envelope
    /// signature when carried.
    pub async fn validate_relay(
        &mut self,
        payload: &[u8],
        relay_signature: &str,
    ) -> Result<(), RelayError> {
        self.expect(PipelineState::Fresh, "validate called twice")?;
        auth::validate_relay(&self.ctx, payload, relay_signature, &self.envelope).await?;
        self.relay_inbound = true;
        self.state = PipelineState::Validated;
        Ok(())
    }

    /// Forwards to the receiver, local or remote.
    pub async fn forward(&mut self, proxied: bool) -> Result<(), RelayError> {
        self.expect(PipelineState::Validated, "forward before validate")?;
        if self.relay_inbound {
            return Err(RelayError::Sequencing("relay-inbound requests take forward_relayed"));
        }
        let response = forward::forward(&self.ctx, &self.envelope, proxied).await?;
        self.forwarded_proxied = proxied;
        self.response = Some(response);
        self.state = PipelineState::Forwarded;
        Ok(())
    }

    /// Forwards a relay-inbound envelope to the locally operated receiver.
    /// Never relays onward.
    pub async fn forward_relayed(&mut self) -> Result<(), RelayError> {
        self.expect(PipelineState::Validated, "forward before validate")?;
        if !self.relay_inbound {
            return Err(RelayError::Sequencing("forward_relayed on a platform-inbound request"));
        }
        let (response, proxied) = forward::forward_relayed(&self.ctx, &self.envelope).await?;
        self.forwarded_proxied = proxied;
        self.response = Some(response);
        self.state = PipelineState::Forwarded;
        Ok(())
    }

    /// Forwards while taking custody of the envelope's async callback URL.
    pub async fn forward_modifiable(
        &mut self,
        callback_url: &str,
        callback_path: &[&str],
        stash_fields: &[SignableField],
        rewrite: impl FnOnce(String) -> RequestEnvelope,
    ) -> Result<(), RelayError> {
        self.expect(PipelineState::Validated, "forward before validate")?;
        if self.relay_inbound {
            return Err(RelayError::Sequencing("relay-inbound requests take forward_relayed"));
        }
        let response = forward::forward_modifiable(
            &self.ctx,
            &self.envelope,
            callback_url,
            callback_path,
            stash_fields,
            rewrite,
        )
        .await?;
        self.forwarded_proxied = false;
        self.response = Some(response);
        self.state = PipelineState::Forwarded;
        Ok(())
    }

    /// A proxied forward that succeeded consumed its mapping; drop it so
    /// the id cannot be replayed.
    async fn consume_proxy_record(&self) -> Result<(), RelayError> {
        if !self.forwarded_proxied {
            return Ok(());
        }
        let delivered = self
            .response
            .as_ref()
            .map(PeerResponse::is_protocol_success)
            .unwrap_or(false);
        if !delivered {
            return Ok(());
        }
        if let Some(id) = self.envelope.path_suffix.as_deref() {
            self.ctx.proxies().delete(id).await?;
        }
        Ok(())
    }

    fn take_response(&mut self) -> Result<PeerResponse, RelayError> {
        self.state = PipelineState::Finalized;
        self.response
            .take()
            .ok_or(RelayError::Sequencing("finalize without a captured response"))
    }

    /// Verbatim projection of the downstream response.
    pub async fn response(&mut self) -> Result<PeerResponse, RelayError> {
        self.expect(PipelineState::Forwarded, "finalize before forward")?;
        self.consume_proxy_record().await?;
        self.take_response()
    }

    /// Projection for list responses: next-page links become node-relative.
    pub async fn response_with_pagination(&mut self) -> Result<PeerResponse, RelayError> {
        self.expect(PipelineState::Forwarded, "finalize before forward")?;
        self.consume_proxy_record().await?;
        let response = self.take_response()?;
        project::project_pagination(&self.ctx, &self.envelope, response).await
    }

    /// Projection for creation responses: the Location header becomes
    /// node-relative under `proxy_path_prefix`.
    pub async fn response_with_location(
        &mut self,
        proxy_path_prefix: &str,
    ) -> Result<PeerResponse, RelayError> {
        self.expect(PipelineState::Forwarded, "finalize before forward")?;
        self.consume_proxy_record().await?;
        let response = self.take_response()?;
        project::project_location(&self.ctx, &self.envelope, response, proxy_path_prefix).await
    }
}
