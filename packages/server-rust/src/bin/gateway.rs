//! Gatehouse gateway binary.
//!
//! Wires the resolution engine to its deployment environment: CLI flags
//! with environment fallbacks, structured logging, the Prometheus metrics
//! exporter, and graceful shutdown on SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gatehouse_server::{
    AuthorityConfig, BinderConfig, ClaimsDecoder, ContextBinder, GatewayConfig, GatewayModule,
    HttpAuthorityClient, ResolverConfig, TenantResolver,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gateway", about = "Tenant resolution gateway")]
struct Args {
    /// Bind address.
    #[arg(long, env = "GATEHOUSE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port.
    #[arg(long, env = "GATEHOUSE_PORT", default_value_t = 8080)]
    port: u16,

    /// Base URL of the central configuration authority.
    #[arg(long, env = "CENTRAL_MANAGEMENT_URL", default_value = "http://central-management")]
    authority_url: String,

    /// Service-to-service token sent to the authority.
    #[arg(
        long,
        env = "SERVICE_TOKEN",
        default_value = "default-service-token",
        hide_env_values = true
    )]
    service_token: String,

    /// HS256 secret for verifying bearer tokens. Unset disables claim-based
    /// tenant extraction.
    #[arg(long, env = "GATEHOUSE_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Default tenant database host when the authority omits one.
    #[arg(long, env = "TENANCY_DB_HOST", default_value = "postgres-tenants")]
    db_host: String,

    /// Default tenant database port when the authority omits one.
    #[arg(long, env = "TENANCY_DB_PORT", default_value_t = 5432)]
    db_port: u16,

    /// Default tenant database username when the authority omits one.
    #[arg(long, env = "DB_USERNAME", default_value = "postgres")]
    db_username: String,

    /// Secret file consulted first for the database password.
    #[arg(
        long,
        env = "GATEHOUSE_SECRET_PATH",
        default_value = "/run/secrets/postgres_password"
    )]
    secret_path: PathBuf,

    /// Cache TTL for tenant configuration snapshots, in seconds.
    #[arg(long, env = "GATEHOUSE_CACHE_TTL_SECS", default_value_t = 300)]
    cache_ttl_secs: u64,

    /// Port for the Prometheus metrics exporter. Unset disables the exporter.
    #[arg(long, env = "GATEHOUSE_METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Emit an audit event for every resolution outcome.
    #[arg(long, env = "GATEHOUSE_AUDIT_LOG", default_value_t = false)]
    audit_log: bool,

    /// Emit logs as JSON instead of human-readable lines.
    #[arg(long, env = "GATEHOUSE_LOG_JSON", default_value_t = false)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.log_json);

    if let Some(metrics_port) = args.metrics_port {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], metrics_port))
            .install()?;
        info!(port = metrics_port, "Prometheus exporter listening");
    }

    let authority = HttpAuthorityClient::new(AuthorityConfig {
        base_url: args.authority_url.clone(),
        service_token: args.service_token.clone(),
        ..AuthorityConfig::default()
    })?;

    let resolver_config = ResolverConfig {
        cache_ttl: Duration::from_secs(args.cache_ttl_secs),
        audit_log: args.audit_log,
        ..ResolverConfig::default()
    };

    let binder = ContextBinder::new(BinderConfig {
        default_database_host: args.db_host.clone(),
        default_database_port: args.db_port,
        default_database_username: args.db_username.clone(),
        secret_path: args.secret_path.clone(),
        ..BinderConfig::default()
    });

    let resolver = Arc::new(TenantResolver::new(
        &resolver_config,
        Arc::new(authority),
        binder,
    ));

    let claims = args
        .jwt_secret
        .as_deref()
        .map(|secret| Arc::new(ClaimsDecoder::new(secret)));

    let gateway_config = GatewayConfig {
        host: args.host.clone(),
        port: args.port,
        ..GatewayConfig::default()
    };

    let mut module = GatewayModule::new(gateway_config, resolver, claims);
    let port = module.start().await?;
    info!(
        port,
        authority = %args.authority_url,
        "gatehouse gateway started"
    );

    // Cache expiry is lazy on lookup; sweep periodically so identifiers
    // that are never looked up again do not accumulate.
    let housekeeping = module.resolver();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let purged = housekeeping.cache().purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "purged expired tenant configuration entries");
            }
        }
    });

    module.serve(shutdown_signal()).await
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Completes on SIGINT (ctrl-c) or SIGTERM, triggering graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
