//! # OCN Node
//!
//! The federation node executable.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `OCN_*` environment variables
//! 2. Validate it (admin token, bind address, public URL)
//! 3. Load or generate the node signing key
//! 4. Load the party registry document
//! 5. Wire the node context (directory, proxy store, dispatcher)
//! 6. Serve the gateway until Ctrl+C

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{oneshot, watch};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ocn_core::adapters::{FileRegistry, InMemoryDirectory, InMemoryProxyStore, ReqwestDispatcher};
use ocn_core::ports::ProxyResourceStore;
use ocn_core::NodeContext;
use ocn_gateway::{GatewayServer, GatewayState, NodeInfo};
use ocn_notary::NodeSigner;
use ocn_types::PartyId;

use crate::config::NodeConfig;

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("install tracing subscriber")
}

fn load_signer(config: &NodeConfig) -> Result<NodeSigner> {
    match &config.identity.signer_key {
        Some(key_hex) => NodeSigner::from_hex(key_hex).context("OCN_SIGNER_KEY"),
        None => {
            let signer = NodeSigner::generate();
            warn!(
                address = %signer.address().to_hex(),
                "no signer key configured, generated an ephemeral one; \
                 relays from this node will not verify after a restart"
            );
            Ok(signer)
        }
    }
}

fn load_registry(config: &NodeConfig) -> Result<Arc<FileRegistry>> {
    let registry = match &config.network.registry_file {
        Some(path) => {
            let registry = FileRegistry::from_path(&config.network.public_url, path)
                .context("load registry document")?;
            info!(parties = registry.party_count(), file = %path.display(), "party registry loaded");
            registry
        }
        None => {
            warn!("no registry file configured; every receiver is unknown until one is provided");
            FileRegistry::from_entries(&config.network.public_url, Vec::new())
                .context("empty registry")?
        }
    };
    Ok(Arc::new(registry))
}

/// Periodically drops proxy mappings nobody resolved in time.
fn spawn_proxy_housekeeping(
    ctx: Arc<NodeContext>,
    config: &NodeConfig,
    mut stop: watch::Receiver<bool>,
) {
    let max_age = Duration::from_secs(config.proxy.max_age_secs);
    let period = Duration::from_secs(config.proxy.purge_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match ctx.proxies().purge_expired(max_age).await {
                        Ok(0) => {}
                        Ok(removed) => info!(removed, "purged expired proxy resources"),
                        Err(e) => warn!(error = %e, "proxy purge failed"),
                    }
                }
                _ = stop.changed() => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = NodeConfig::from_env();
    config.validate().context("configuration rejected")?;

    let signer = load_signer(&config)?;
    info!(address = %signer.address().to_hex(), "node signing identity ready");

    let registry = load_registry(&config)?;
    let dispatcher =
        Arc::new(ReqwestDispatcher::new(config.network.request_timeout_ms).context("http client")?);
    let ctx = Arc::new(NodeContext::new(
        &config.network.public_url,
        signer,
        config.security.require_signatures,
        registry,
        Arc::new(InMemoryDirectory::new()),
        Arc::new(InMemoryProxyStore::new()),
        dispatcher,
    ));

    let party = PartyId::new(&config.identity.country_code, &config.identity.party_id)
        .context("node party identity")?;
    let state = GatewayState::new(
        ctx.clone(),
        NodeInfo { party, operator: config.identity.operator.clone() },
        config.security.admin_token.clone(),
    );

    let (stop_housekeeping, housekeeping_signal) = watch::channel(false);
    spawn_proxy_housekeeping(ctx, &config, housekeeping_signal);

    let addr = config.bind_addr().context("bind address")?;
    let server = GatewayServer::bind(addr, state).await.context("bind gateway listener")?;
    info!(url = %config.network.public_url, "node is up");

    let (shutdown, shutdown_signal) = oneshot::channel();
    let serving = tokio::spawn(server.serve(shutdown_signal));

    tokio::signal::ctrl_c().await.context("wait for shutdown signal")?;
    info!("shutdown requested");
    let _ = shutdown.send(());
    let _ = stop_housekeeping.send(true);
    serving.await.context("gateway task")??;

    Ok(())
}
