//! HTTP middleware for the gateway.
//!
//! Two layers of middleware live here: the Tower stack applied to all
//! requests (request ids, tracing, CORS, timeout), and the tenant
//! resolution middleware guarding tenant-scoped routes. Tower ordering
//! follows the outer-to-inner convention: the first layer listed is the
//! outermost (processes the request first on the way in, and the response
//! last on the way out).

use axum::extract::{FromRequestParts, RawPathParams, Request, State};
use axum::http::header::{HeaderName, AUTHORIZATION, HOST};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatehouse_core::RequestSignals;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use crate::resolver::Rejection;

use super::config::GatewayConfig;
use super::handlers::AppState;

/// The composed Tower layer type produced by [`build_http_layers`].
///
/// This type alias keeps the function signature readable. Each layer
/// wraps the next in a `Stack`, from outermost (first applied) to
/// innermost (last applied).
type HttpLayers = tower::layer::util::Stack<
    PropagateRequestIdLayer,
    tower::layer::util::Stack<
        TimeoutLayer,
        tower::layer::util::Stack<
            CorsLayer,
            tower::layer::util::Stack<
                TraceLayer<
                    tower_http::classify::SharedClassifier<
                        tower_http::classify::ServerErrorsAsFailures,
                    >,
                >,
                tower::layer::util::Stack<
                    SetRequestIdLayer<MakeRequestUuid>,
                    tower::layer::util::Identity,
                >,
            >,
        >,
    >,
>;

/// Builds the transport-level Tower middleware stack.
///
/// **Middleware ordering (outermost to innermost):**
/// 1. `SetRequestId` -- assigns a UUID v4 `X-Request-Id` to every incoming request
/// 2. `Tracing` -- logs request/response with structured trace spans
/// 3. `CORS` -- Cross-Origin Resource Sharing based on configured origins
/// 4. `Timeout` -- enforces a maximum request processing duration
/// 5. `PropagateRequestId` -- copies `X-Request-Id` from the request to the response
///
/// The request id assigned here doubles as the correlation id forwarded to
/// the configuration authority, so a tenant lookup can be traced across
/// both services.
#[must_use]
pub fn build_http_layers(config: &GatewayConfig) -> HttpLayers {
    let x_request_id = HeaderName::from_static("x-request-id");

    let cors = build_cors_layer(&config.cors_origins);

    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            MakeRequestUuid,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(x_request_id))
        .into_inner()
}

/// Builds the CORS layer from the configured list of allowed origins.
///
/// A wildcard `"*"` in the origins list allows any origin. Otherwise,
/// each origin string is parsed and added to an explicit allowlist.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Tenant resolution middleware for tenant-scoped routes.
///
/// Gathers the request's identifying signals, runs the resolution
/// orchestrator under the configured deadline, and either attaches the
/// bound [`gatehouse_core::TenantContext`] to the request and forwards it,
/// or answers with the uniform rejection payload.
pub async fn resolve_tenant(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    // Routes without path parameters simply have none to offer.
    let route_tenant = RawPathParams::from_request_parts(&mut parts, &state)
        .await
        .ok()
        .and_then(|params| {
            params
                .iter()
                .find(|(key, _)| *key == "tenant_id")
                .map(|(_, value)| value.to_string())
        });

    // Correlation id: reuse the one assigned by the request-id layer (or
    // sent by the caller), generate as a last resort.
    let correlation_id = header_str(&parts.headers, "x-request-id")
        .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);

    let header_tenant = header_str(&parts.headers, "x-tenant-id").map(ToString::to_string);
    let authorization = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let host = parts
        .headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(|h| host_without_port(h).to_string());
    let query_tenant = parts
        .uri
        .query()
        .and_then(|q| query_param(q, "tenant_id"))
        .map(ToString::to_string);
    let method = parts.method.as_str().to_string();

    let claim_tenant = state
        .claims
        .as_ref()
        .and_then(|decoder| decoder.tenant_claim(authorization.as_deref()));

    let signals = RequestSignals {
        header_tenant: header_tenant.as_deref(),
        claim_tenant: claim_tenant.as_deref(),
        host: host.as_deref(),
        method: &method,
        query_tenant: query_tenant.as_deref(),
        route_tenant: route_tenant.as_deref(),
    };

    let resolution = tokio::time::timeout(
        state.config.resolve_deadline,
        state.resolver.resolve(&signals, &correlation_id),
    )
    .await;

    match resolution {
        Ok(Ok(context)) => {
            let mut request = Request::from_parts(parts, body);
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Ok(Err(rejection)) => rejection_response(rejection),
        Err(_elapsed) => {
            warn!(correlation_id, "tenant resolution exceeded deadline");
            rejection_response(Rejection::ServiceUnavailable)
        }
    }
}

/// Renders a rejection as the uniform caller-facing response.
pub fn rejection_response(rejection: Rejection) -> Response {
    let status = StatusCode::from_u16(rejection.status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(rejection.body())).into_response()
}

fn header_str<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Strips a port suffix from a Host header value.
fn host_without_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        // Bracketed IPv6 literal; never a tenant subdomain, but keep the
        // address itself so logging stays sane.
        return rest.split(']').next().unwrap_or(host);
    }
    host.split(':').next().unwrap_or(host)
}

/// First value of a query parameter, without percent-decoding.
/// Tenant identifiers are plain tokens, so decoding would never change them.
fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}
