//! Configuration types for the tenant resolution engine.

use std::path::PathBuf;
use std::time::Duration;

/// Orchestrator-level settings: cache TTLs, breaker thresholds, auditing.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long a fetched configuration snapshot is served from cache.
    pub cache_ttl: Duration,
    /// How long a failed lookup is remembered before the authority is
    /// consulted again for the same identifier.
    pub negative_cache_ttl: Duration,
    /// Fetch exhaustions tolerated within the failure window before all
    /// resolution short-circuits.
    pub breaker_threshold: u32,
    /// Failure window; the counter expires when no failure refreshes it.
    pub breaker_window: Duration,
    /// Emit an audit event for every resolution outcome.
    pub audit_log: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            negative_cache_ttl: Duration::from_secs(30),
            breaker_threshold: 5,
            breaker_window: Duration::from_secs(300),
            audit_log: false,
        }
    }
}

/// Settings for the remote configuration authority client.
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    /// Base URL of the authority, e.g. `http://central-management`.
    pub base_url: String,
    /// Service-to-service token sent as `X-Service-Token`.
    pub service_token: String,
    /// Per-attempt timeout for the lookup call.
    pub fetch_timeout: Duration,
    /// Maximum number of attempts per `fetch`.
    pub max_retries: u32,
    /// First backoff pause; doubles after every further failed attempt.
    pub backoff_base: Duration,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://central-management".to_string(),
            service_token: "default-service-token".to_string(),
            fetch_timeout: Duration::from_secs(5),
            max_retries: 2,
            backoff_base: Duration::from_millis(100),
        }
    }
}

/// Deployment defaults the context binder falls back to when the authority
/// snapshot leaves a database field unset.
#[derive(Debug, Clone)]
pub struct BinderConfig {
    pub default_database_host: String,
    pub default_database_port: u16,
    pub default_database_username: String,
    /// Well-known secret file consulted first for the database password.
    pub secret_path: PathBuf,
    /// Environment variable consulted when the secret file is absent.
    pub password_env: String,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            default_database_host: "postgres-tenants".to_string(),
            default_database_port: 5432,
            default_database_username: "postgres".to_string(),
            secret_path: PathBuf::from("/run/secrets/postgres_password"),
            password_env: "DB_PASSWORD".to_string(),
        }
    }
}
