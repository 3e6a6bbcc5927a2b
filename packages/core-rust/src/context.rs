//! Per-request tenant context.
//!
//! The bound context replaces the ambient "current tenant" configuration a
//! framework would otherwise mutate process-wide: it is an explicit value,
//! created after resolution and owned by exactly one request.

use std::fmt;
use std::sync::Arc;

use crate::tenant::{TenantConfig, TenantId};

/// Data-store target for a single tenant, fully resolved: authority
/// overrides applied, deployment defaults filled in, credentials attached.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    pub host: String,
    pub port: u16,
    /// Database (or schema) name holding the tenant's data.
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DatabaseTarget {
    // Credentials stay out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything a downstream handler needs to act on behalf of one tenant.
///
/// Created by the resolution orchestrator, attached to the request, and
/// dropped with it. Never shared across requests: concurrent requests for
/// different tenants each hold their own context.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    /// Shared configuration snapshot; the cache and all requests resolved
    /// within the TTL window point at the same allocation.
    pub config: Arc<TenantConfig>,
    pub database: DatabaseTarget,
    /// Prefix for every cache key written on behalf of this tenant.
    pub cache_namespace: String,
    /// Session cookie name scoped to this tenant.
    pub session_cookie: String,
}

/// Cache key prefix for a tenant. Distinct tenants can never collide
/// because the identifier itself is embedded.
#[must_use]
pub fn cache_namespace(tenant_id: &TenantId) -> String {
    format!("tenant_{tenant_id}_")
}

/// Session cookie name for a tenant.
#[must_use]
pub fn session_cookie(tenant_id: &TenantId) -> String {
    format!("tenant_{tenant_id}_session")
}
