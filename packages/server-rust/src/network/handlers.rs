//! HTTP handler definitions for the gateway.
//!
//! Defines `AppState` (the shared state carried through axum extractors),
//! the health surface, and the tenant-context introspection endpoint that
//! sits behind the resolution middleware.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use gatehouse_core::TenantContext;
use serde_json::json;

use crate::resolver::{BreakerState, ClaimsDecoder, TenantResolver};

use super::config::GatewayConfig;

/// Shared application state passed to all axum handlers via `State`.
///
/// Holds `Arc` references to shared resources so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// The resolution engine shared by every in-flight request.
    pub resolver: Arc<TenantResolver>,
    /// Bearer-token decoder for claim-based extraction; `None` disables
    /// extraction priority 2.
    pub claims: Option<Arc<ClaimsDecoder>>,
    /// Network configuration (bind address, timeouts, CORS).
    pub config: Arc<GatewayConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}

/// Returns detailed health information as JSON.
///
/// Always returns 200 -- the breaker field in the body tells monitoring
/// tools whether resolution is currently shedding load, which is different
/// from the process being down.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let breaker = state.resolver.breaker();
    Json(json!({
        "breaker": breaker.state().as_str(),
        "breaker_failures": breaker.failure_count(),
        "cached_tenants": state.resolver.cache().len(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Liveness probe -- always returns 200 OK.
///
/// Only checks that the process is running and responsive. An open breaker
/// must not restart the pod; the authority being down is not our fault.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe -- 503 while the breaker is open, 200 otherwise.
///
/// An open breaker means every tenant-scoped request would be shed anyway,
/// so the load balancer may as well route traffic elsewhere until the
/// window resets.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.resolver.breaker().state() == BreakerState::Open {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// Echoes the bound tenant context of the current request.
///
/// Sits behind the resolution middleware, so reaching it at all proves the
/// pipeline ran; credentials are never included.
pub async fn tenant_context_handler(
    Extension(context): Extension<TenantContext>,
) -> Json<serde_json::Value> {
    Json(json!({
        "tenant_id": context.tenant_id,
        "status": context.config.status,
        "plan": context.config.plan,
        "features": context.config.features,
        "database": {
            "host": context.database.host,
            "port": context.database.port,
            "database": context.database.database,
            "username": context.database.username,
        },
        "cache_namespace": context.cache_namespace,
        "session_cookie": context.session_cookie,
    }))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use gatehouse_core::{TenantConfig, TenantId};

    use crate::resolver::{
        BinderConfig, ConfigAuthority, ContextBinder, FetchError, ResolverConfig,
    };

    use super::*;

    /// Authority that rejects every lookup, as if retries were exhausted.
    struct DownAuthority;

    #[async_trait]
    impl ConfigAuthority for DownAuthority {
        async fn fetch(
            &self,
            _tenant_id: &TenantId,
            _correlation_id: &str,
        ) -> Result<TenantConfig, FetchError> {
            Err(FetchError {
                attempts: 2,
                last_cause: "transport error".to_string(),
            })
        }
    }

    fn test_state(resolver_config: &ResolverConfig) -> AppState {
        let binder = ContextBinder::new(BinderConfig {
            secret_path: "/nonexistent/gatehouse-secret".into(),
            ..BinderConfig::default()
        });
        AppState {
            resolver: Arc::new(TenantResolver::new(
                resolver_config,
                Arc::new(DownAuthority),
                binder,
            )),
            claims: None,
            config: Arc::new(GatewayConfig::default()),
            start_time: Instant::now(),
        }
    }

    #[tokio::test]
    async fn health_reports_breaker_and_cache() {
        let state = test_state(&ResolverConfig::default());
        let response = health_handler(State(state)).await;
        let json = response.0;

        assert_eq!(json["breaker"], "closed");
        assert_eq!(json["breaker_failures"], 0);
        assert_eq!(json["cached_tenants"], 0);
        assert!(json["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn health_reports_an_open_breaker() {
        let config = ResolverConfig {
            breaker_threshold: 1,
            ..ResolverConfig::default()
        };
        let state = test_state(&config);
        state.resolver.breaker().record_failure();

        let response = health_handler(State(state)).await;
        assert_eq!(response.0["breaker"], "open");
        assert_eq!(response.0["breaker_failures"], 1);
    }

    #[tokio::test]
    async fn liveness_always_returns_200() {
        assert_eq!(liveness_handler().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_follows_the_breaker() {
        let config = ResolverConfig {
            breaker_threshold: 1,
            ..ResolverConfig::default()
        };
        let state = test_state(&config);

        assert_eq!(
            readiness_handler(State(state.clone())).await,
            StatusCode::OK
        );

        state.resolver.breaker().record_failure();
        assert_eq!(
            readiness_handler(State(state.clone())).await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        state.resolver.breaker().record_success();
        assert_eq!(readiness_handler(State(state)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn context_handler_echoes_bindings_without_credentials() {
        use gatehouse_core::TenantStatus;

        let binder = ContextBinder::new(BinderConfig {
            secret_path: "/nonexistent/gatehouse-secret".into(),
            ..BinderConfig::default()
        });
        let config = Arc::new(TenantConfig {
            tenant_id: TenantId::from("acme"),
            status: TenantStatus::Active,
            database_host: Some("db-1.internal".to_string()),
            database_port: None,
            database_name: "tenant_acme".to_string(),
            database_username: None,
            plan: "enterprise".to_string(),
            features: ["sso"].iter().map(ToString::to_string).collect(),
            max_users: None,
            max_storage: None,
        });
        let context = binder.bind(&TenantId::from("acme"), config);

        let response = tenant_context_handler(Extension(context)).await;
        let json = response.0;

        assert_eq!(json["tenant_id"], "acme");
        assert_eq!(json["plan"], "enterprise");
        assert_eq!(json["database"]["host"], "db-1.internal");
        assert_eq!(json["cache_namespace"], "tenant_acme_");
        assert!(json["database"].get("password").is_none());
    }
}
