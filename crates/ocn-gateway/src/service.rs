//! Router assembly and server lifecycle.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use ocn_core::NodeContext;
use ocn_types::PartyId;

use crate::routes;

/// Identity this node presents in its own credentials objects.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub party: PartyId,
    pub operator: String,
}

/// Shared state of every route handler.
#[derive(Clone)]
pub struct GatewayState {
    pub ctx: Arc<NodeContext>,
    pub info: Arc<NodeInfo>,
    pub admin_token: Arc<String>,
}

impl GatewayState {
    pub fn new(ctx: Arc<NodeContext>, info: NodeInfo, admin_token: String) -> Self {
        Self { ctx, info: Arc::new(info), admin_token: Arc::new(admin_token) }
    }
}

/// The full router with its middleware stack.
pub fn build_router(state: GatewayState) -> Router {
    routes::router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// A bound, not yet serving HTTP server.
pub struct GatewayServer {
    listener: TcpListener,
    router: Router,
}

impl GatewayServer {
    /// Binds the listen socket. Serving starts with [`GatewayServer::serve`].
    pub async fn bind(addr: SocketAddr, state: GatewayState) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, router: build_router(state) })
    }

    /// The bound address; differs from the requested one for port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until the shutdown signal fires.
    pub async fn serve(self, mut shutdown: oneshot::Receiver<()>) -> io::Result<()> {
        let addr = self.local_addr()?;
        info!(addr = %addr, "gateway listening");
        tokio::select! {
            result = axum::serve(self.listener, self.router) => result,
            _ = &mut shutdown => {
                info!("gateway shutting down");
                Ok(())
            }
        }
    }
}
