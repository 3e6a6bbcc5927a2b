//! Gateway module with deferred startup lifecycle.
//!
//! Implements the deferred startup pattern: `new()` creates resources,
//! `start()` binds the TCP listener, and `serve()` starts accepting
//! connections. The separation lets the binary wire shared state (metrics
//! exporter, signal handlers) between `start()` and `serve()`, and lets
//! tests bind an OS-assigned port before issuing requests.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::resolver::{ClaimsDecoder, TenantResolver};

use super::config::GatewayConfig;
use super::handlers::{
    health_handler, liveness_handler, readiness_handler, tenant_context_handler, AppState,
};
use super::middleware::{build_http_layers, resolve_tenant};

/// Manages the gateway's HTTP server lifecycle.
///
/// 1. `new()` -- assembles shared state (resolver, claims decoder)
/// 2. `start()` -- binds the TCP listener to the configured address
/// 3. `serve()` -- accepts connections until the shutdown future completes
pub struct GatewayModule {
    config: GatewayConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl GatewayModule {
    /// Creates a new gateway module without binding any port.
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        resolver: Arc<TenantResolver>,
        claims: Option<Arc<ClaimsDecoder>>,
    ) -> Self {
        let state = AppState {
            resolver,
            claims,
            config: Arc::new(config.clone()),
            start_time: Instant::now(),
        };
        Self {
            config,
            listener: None,
            state,
        }
    }

    /// Shared resolver handle, for operational tooling (cache invalidation,
    /// breaker inspection) living outside the request path.
    #[must_use]
    pub fn resolver(&self) -> Arc<TenantResolver> {
        Arc::clone(&self.state.resolver)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health` -- breaker/cache health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe (503 while the breaker is open)
    /// - `GET /api/context` -- bound-context introspection
    /// - `GET /api/tenants/{tenant_id}/context` -- same, with the identifier
    ///   taken from the route when no higher-priority source supplies one
    #[must_use]
    pub fn build_router(&self) -> Router {
        let api = Router::new()
            .route("/context", get(tenant_context_handler))
            .route("/tenants/{tenant_id}/context", get(tenant_context_handler))
            .layer(from_fn_with_state(self.state.clone(), resolve_tenant));

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .nest("/api", api)
            .layer(build_http_layers(&self.config))
            .with_state(self.state.clone())
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until the shutdown future completes.
    ///
    /// Consumes `self` because the listener is moved into the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router();
        let listener = self
            .listener
            .expect("start() must be called before serve()");

        info!("gateway serving requests");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("gateway stopped");
        Ok(())
    }
}
