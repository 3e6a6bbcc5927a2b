//! Tenant identity and configuration snapshot types.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, case-sensitive tenant identifier.
///
/// Extracted once per request and immutable thereafter. The inner string is
/// whatever the identifying source supplied (header value, claim, subdomain
/// label, parameter) -- no normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TenantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle state of a tenant as reported by the configuration authority.
///
/// Only `Active` tenants may proceed past resolution; every other state is
/// rejected with a tenant-inactive outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Pending,
    Active,
    Suspended,
    Cancelled,
}

impl TenantStatus {
    /// Whether requests for this tenant are allowed to proceed.
    #[must_use]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// Configuration snapshot for a single tenant.
///
/// Retrieved from the remote configuration authority and treated as
/// immutable once obtained: a newer fetch replaces the cached snapshot
/// wholesale, never mutates it in place.
///
/// `features` uses `BTreeSet` so repeated serializations of unchanged
/// authority data are byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub tenant_id: TenantId,
    pub status: TenantStatus,
    /// Database host override. `None` falls back to the deployment default.
    #[serde(default)]
    pub database_host: Option<String>,
    /// Database port override. `None` falls back to the deployment default.
    #[serde(default)]
    pub database_port: Option<u16>,
    /// Database (or schema) name holding this tenant's data.
    pub database_name: String,
    /// Database username override. `None` falls back to the deployment default.
    #[serde(default)]
    pub database_username: Option<String>,
    /// Billing plan identifier, e.g. `"free"` or `"enterprise"`.
    pub plan: String,
    /// Feature flags enabled for this tenant.
    #[serde(default)]
    pub features: BTreeSet<String>,
    /// Seat limit, if the plan imposes one.
    #[serde(default)]
    pub max_users: Option<u32>,
    /// Storage limit in megabytes, if the plan imposes one.
    #[serde(default)]
    pub max_storage: Option<u64>,
}

impl TenantConfig {
    /// Whether the given feature flag is enabled.
    #[must_use]
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }
}
