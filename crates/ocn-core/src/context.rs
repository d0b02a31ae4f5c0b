//! Shared handle bundling the node identity with its outbound ports.

use std::sync::Arc;

use ocn_notary::NodeSigner;

use crate::ports::{HttpDispatcher, PlatformDirectory, ProxyResourceStore, RegistryApi};

/// Everything a request pipeline needs to route and relay: the node's own
/// identity plus its port implementations. Cheap to clone behind an `Arc`.
pub struct NodeContext {
    node_url: String,
    signer: NodeSigner,
    signing_required: bool,
    registry: Arc<dyn RegistryApi>,
    directory: Arc<dyn PlatformDirectory>,
    proxies: Arc<dyn ProxyResourceStore>,
    dispatcher: Arc<dyn HttpDispatcher>,
}

impl NodeContext {
    pub fn new(
        node_url: impl Into<String>,
        signer: NodeSigner,
        signing_required: bool,
        registry: Arc<dyn RegistryApi>,
        directory: Arc<dyn PlatformDirectory>,
        proxies: Arc<dyn ProxyResourceStore>,
        dispatcher: Arc<dyn HttpDispatcher>,
    ) -> Self {
        let node_url = node_url.into();
        Self {
            node_url: node_url.trim_end_matches('/').to_string(),
            signer,
            signing_required,
            registry,
            directory,
            proxies,
            dispatcher,
        }
    }

    /// Public base URL of this node, without a trailing slash.
    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    pub fn signer(&self) -> &NodeSigner {
        &self.signer
    }

    /// When set, unsigned envelopes are rejected regardless of per-platform
    /// preferences.
    pub fn signing_required(&self) -> bool {
        self.signing_required
    }

    pub fn registry(&self) -> &dyn RegistryApi {
        self.registry.as_ref()
    }

    pub fn directory(&self) -> &dyn PlatformDirectory {
        self.directory.as_ref()
    }

    pub fn proxies(&self) -> &dyn ProxyResourceStore {
        self.proxies.as_ref()
    }

    pub fn dispatcher(&self) -> &dyn HttpDispatcher {
        self.dispatcher.as_ref()
    }
}
