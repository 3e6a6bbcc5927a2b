//! End-to-end resolution tests: a full gateway router served over a real
//! socket, with an in-memory configuration authority behind the trait seam.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_core::{RejectionBody, TenantConfig, TenantId, TenantStatus};
use gatehouse_server::resolver::FetchError;
use gatehouse_server::{
    BinderConfig, ClaimsDecoder, ConfigAuthority, ContextBinder, GatewayConfig, GatewayModule,
    ResolverConfig, TenantResolver,
};

/// In-memory authority: known tenants resolve, everything else fails as if
/// the retry budget were exhausted.
struct TestAuthority {
    tenants: HashMap<String, TenantConfig>,
    calls: AtomicU32,
}

impl TestAuthority {
    fn with_tenants(tenants: Vec<TenantConfig>) -> Arc<Self> {
        Arc::new(Self {
            tenants: tenants
                .into_iter()
                .map(|t| (t.tenant_id.as_str().to_string(), t))
                .collect(),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigAuthority for TestAuthority {
    async fn fetch(
        &self,
        tenant_id: &TenantId,
        _correlation_id: &str,
    ) -> Result<TenantConfig, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tenants
            .get(tenant_id.as_str())
            .cloned()
            .ok_or_else(|| FetchError {
                attempts: 2,
                last_cause: "authority returned status 404".to_string(),
            })
    }
}

fn tenant(id: &str, status: TenantStatus) -> TenantConfig {
    TenantConfig {
        tenant_id: TenantId::from(id),
        status,
        database_host: Some(format!("db-{id}.internal")),
        database_port: None,
        database_name: format!("tenant_{id}"),
        database_username: None,
        plan: "standard".to_string(),
        features: ["reporting"].iter().map(ToString::to_string).collect(),
        max_users: Some(25),
        max_storage: Some(2_048),
    }
}

/// Boots a gateway on an OS-assigned port and returns its base URL.
async fn spawn_gateway(
    resolver_config: ResolverConfig,
    authority: Arc<TestAuthority>,
    claims: Option<Arc<ClaimsDecoder>>,
) -> (String, Arc<TenantResolver>) {
    let binder = ContextBinder::new(BinderConfig {
        secret_path: "/nonexistent/gatehouse-secret".into(),
        ..BinderConfig::default()
    });
    let resolver = Arc::new(TenantResolver::new(&resolver_config, authority, binder));

    let config = GatewayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..GatewayConfig::default()
    };
    let mut module = GatewayModule::new(config, Arc::clone(&resolver), claims);
    let port = module.start().await.expect("bind gateway");
    tokio::spawn(async move {
        module.serve(std::future::pending()).await.expect("serve");
    });

    // `localhost` has no dot, so the subdomain source never fires; an IP
    // literal like `127.0.0.1` would match the pattern as label "127".
    (format!("http://localhost:{port}"), resolver)
}

#[tokio::test]
async fn header_resolution_binds_context_end_to_end() {
    let authority = TestAuthority::with_tenants(vec![tenant("acme", TenantStatus::Active)]);
    let (base, _resolver) =
        spawn_gateway(ResolverConfig::default(), Arc::clone(&authority), None).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base}/api/context"))
        .header("X-Tenant-ID", "acme")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(
        response.headers().contains_key("x-request-id"),
        "request id must propagate to the response"
    );

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["tenant_id"], "acme");
    assert_eq!(body["status"], "active");
    assert_eq!(body["database"]["host"], "db-acme.internal");
    assert_eq!(body["database"]["port"], 5432);
    assert_eq!(body["cache_namespace"], "tenant_acme_");
    assert_eq!(body["session_cookie"], "tenant_acme_session");

    // Second request is served from cache: no extra authority call.
    let again = client
        .get(format!("{base}/api/context"))
        .header("X-Tenant-ID", "acme")
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 200);
    assert_eq!(authority.calls(), 1);
}

#[tokio::test]
async fn missing_identifier_rejects_with_uniform_payload() {
    let authority = TestAuthority::with_tenants(vec![]);
    let (base, _resolver) = spawn_gateway(ResolverConfig::default(), authority, None).await;

    let response = reqwest::get(format!("{base}/api/context")).await.unwrap();
    assert_eq!(response.status(), 400);

    let body: RejectionBody = response.json().await.unwrap();
    assert!(!body.success);
    assert_eq!(body.message, "Tenant not specified");
    assert_eq!(body.error_code.as_str(), "TENANT_NOT_SPECIFIED");
}

#[tokio::test]
async fn unknown_tenant_rejects_as_invalid() {
    let authority = TestAuthority::with_tenants(vec![]);
    let (base, _resolver) =
        spawn_gateway(ResolverConfig::default(), Arc::clone(&authority), None).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base}/api/context"))
        .header("X-Tenant-ID", "ghost")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    let body: RejectionBody = response.json().await.unwrap();
    assert_eq!(body.error_code.as_str(), "INVALID_TENANT");

    // Repeat lookups are absorbed by the negative cache.
    let again = client
        .get(format!("{base}/api/context"))
        .header("X-Tenant-ID", "ghost")
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 403);
    assert_eq!(authority.calls(), 1);
}

#[tokio::test]
async fn suspended_tenant_rejects_as_inactive() {
    let authority = TestAuthority::with_tenants(vec![tenant("dormant", TenantStatus::Suspended)]);
    let (base, resolver) =
        spawn_gateway(ResolverConfig::default(), Arc::clone(&authority), None).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base}/api/context"))
        .header("X-Tenant-ID", "dormant")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    let body: RejectionBody = response.json().await.unwrap();
    assert_eq!(body.error_code.as_str(), "TENANT_INACTIVE");
    assert_eq!(body.message, "Tenant is not active");

    // The suspended snapshot is cached all the same.
    assert_eq!(resolver.cache().len(), 1);
}

#[tokio::test]
async fn open_breaker_sheds_requests_and_degrades_readiness() {
    let authority = TestAuthority::with_tenants(vec![tenant("acme", TenantStatus::Active)]);
    let config = ResolverConfig {
        breaker_threshold: 2,
        ..ResolverConfig::default()
    };
    let (base, _resolver) = spawn_gateway(config, Arc::clone(&authority), None).await;

    let client = reqwest::Client::new();
    for id in ["ghost-1", "ghost-2"] {
        let response = client
            .get(format!("{base}/api/context"))
            .header("X-Tenant-ID", id)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 403);
    }

    // Threshold reached: even the known-good tenant is shed without a fetch.
    let shed = client
        .get(format!("{base}/api/context"))
        .header("X-Tenant-ID", "acme")
        .send()
        .await
        .unwrap();
    assert_eq!(shed.status(), 503);
    let body: RejectionBody = shed.json().await.unwrap();
    assert_eq!(body.error_code.as_str(), "SERVICE_UNAVAILABLE");
    assert_eq!(authority.calls(), 2);

    let ready = reqwest::get(format!("{base}/health/ready")).await.unwrap();
    assert_eq!(ready.status(), 503);

    let health: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["breaker"], "open");
    assert_eq!(health["breaker_failures"], 2);

    // Liveness never follows the breaker.
    let live = reqwest::get(format!("{base}/health/live")).await.unwrap();
    assert_eq!(live.status(), 200);
}

#[tokio::test]
async fn query_parameter_resolves_on_get() {
    let authority = TestAuthority::with_tenants(vec![tenant("acme", TenantStatus::Active)]);
    let (base, _resolver) = spawn_gateway(ResolverConfig::default(), authority, None).await;

    let response = reqwest::get(format!("{base}/api/context?tenant_id=acme"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["tenant_id"], "acme");
}

#[tokio::test]
async fn route_parameter_resolves_as_last_resort() {
    let authority = TestAuthority::with_tenants(vec![tenant("acme", TenantStatus::Active)]);
    let (base, _resolver) = spawn_gateway(ResolverConfig::default(), authority, None).await;

    let response = reqwest::get(format!("{base}/api/tenants/acme/context"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["tenant_id"], "acme");
}

#[tokio::test]
async fn header_overrides_route_parameter() {
    let authority = TestAuthority::with_tenants(vec![
        tenant("acme", TenantStatus::Active),
        tenant("globex", TenantStatus::Active),
    ]);
    let (base, _resolver) = spawn_gateway(ResolverConfig::default(), authority, None).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base}/api/tenants/globex/context"))
        .header("X-Tenant-ID", "acme")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["tenant_id"], "acme", "header has priority over route");
}

#[tokio::test]
async fn bearer_claim_resolves_without_header() {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let secret = "gateway-test-secret";
    let authority = TestAuthority::with_tenants(vec![tenant("acme", TenantStatus::Active)]);
    let (base, _resolver) = spawn_gateway(
        ResolverConfig::default(),
        authority,
        Some(Arc::new(ClaimsDecoder::new(secret))),
    )
    .await;

    let token = encode(
        &Header::default(),
        &serde_json::json!({"sub": "user-1", "tenant_id": "acme", "exp": 9_999_999_999_u64}),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base}/api/context"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["tenant_id"], "acme");
}

#[tokio::test]
async fn health_reports_cached_tenants() {
    let authority = TestAuthority::with_tenants(vec![tenant("acme", TenantStatus::Active)]);
    let (base, _resolver) = spawn_gateway(ResolverConfig::default(), authority, None).await;

    let client = reqwest::Client::new();
    client
        .get(format!("{base}/api/context"))
        .header("X-Tenant-ID", "acme")
        .send()
        .await
        .unwrap();

    let health: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["breaker"], "closed");
    assert_eq!(health["cached_tenants"], 1);
}
