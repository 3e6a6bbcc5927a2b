//! Per-request context binding.
//!
//! Turns an active configuration snapshot into the concrete resources a
//! request operates against: the data-store target (authority overrides
//! over deployment defaults, credentials from the secret store) and the
//! tenant-scoped cache and session namespaces. The result is an explicit
//! per-request value -- nothing process-wide is touched, so concurrent
//! requests for different tenants cannot observe each other's bindings.

use std::sync::Arc;

use gatehouse_core::{cache_namespace, session_cookie, DatabaseTarget, TenantConfig, TenantContext, TenantId};

use super::config::BinderConfig;
use super::secrets::SecretStore;

/// Builds [`TenantContext`] values from resolved configuration snapshots.
pub struct ContextBinder {
    defaults: BinderConfig,
    secrets: SecretStore,
}

impl ContextBinder {
    #[must_use]
    pub fn new(defaults: BinderConfig) -> Self {
        let secrets = SecretStore::new(
            defaults.secret_path.clone(),
            defaults.password_env.clone(),
        );
        Self { defaults, secrets }
    }

    /// Derives the request-scoped bindings for an already-validated tenant.
    ///
    /// The snapshot stays shared (the context holds the same `Arc` the
    /// cache serves); only the derived bindings are per-request.
    #[must_use]
    pub fn bind(&self, tenant_id: &TenantId, config: Arc<TenantConfig>) -> TenantContext {
        let database = DatabaseTarget {
            host: config
                .database_host
                .clone()
                .unwrap_or_else(|| self.defaults.default_database_host.clone()),
            port: config
                .database_port
                .unwrap_or(self.defaults.default_database_port),
            database: config.database_name.clone(),
            username: config
                .database_username
                .clone()
                .unwrap_or_else(|| self.defaults.default_database_username.clone()),
            password: self.secrets.database_password(),
        };

        TenantContext {
            tenant_id: tenant_id.clone(),
            cache_namespace: cache_namespace(tenant_id),
            session_cookie: session_cookie(tenant_id),
            database,
            config,
        }
    }
}
