//! Tenant identifier extraction.
//!
//! A fixed priority chain over the identifying signals a request carries:
//! explicit header, verified principal claim, subdomain label, query
//! parameter (read-only methods only), route parameter. First match wins
//! with no fallthrough once matched.

use std::sync::OnceLock;

use regex::Regex;

use crate::tenant::TenantId;

/// Subdomain labels that never identify a tenant.
pub const RESERVED_SUBDOMAINS: [&str; 4] = ["www", "api", "app", "admin"];

/// The identifying signals of a single request, already pulled out of the
/// transport layer. Pure data: building one performs no I/O, and extraction
/// is a pure function over it.
#[derive(Debug, Clone, Copy)]
pub struct RequestSignals<'a> {
    /// Value of the explicit `X-Tenant-ID` header, if present.
    pub header_tenant: Option<&'a str>,
    /// `tenant_id` claim of the verified principal, if the request carried
    /// a valid identity.
    pub claim_tenant: Option<&'a str>,
    /// Host name the request was addressed to, without port.
    pub host: Option<&'a str>,
    /// Request method, e.g. `"GET"`.
    pub method: &'a str,
    /// `tenant_id` query parameter, if present.
    pub query_tenant: Option<&'a str>,
    /// `tenant_id` route parameter, if the matched route binds one.
    pub route_tenant: Option<&'a str>,
}

/// Derives the tenant identifier for a request, or `None` if no source
/// supplies one. The caller must reject `None` as "tenant not specified".
#[must_use]
pub fn extract_tenant_id(signals: &RequestSignals<'_>) -> Option<TenantId> {
    // Priority 1: explicit header, verbatim.
    if let Some(id) = non_empty(signals.header_tenant) {
        return Some(TenantId::from(id));
    }

    // Priority 2: verified principal claim.
    if let Some(id) = non_empty(signals.claim_tenant) {
        return Some(TenantId::from(id));
    }

    // Priority 3: subdomain label, unless reserved.
    if let Some(label) = signals.host.and_then(subdomain_label) {
        if !RESERVED_SUBDOMAINS.contains(&label) {
            return Some(TenantId::from(label));
        }
    }

    // Priority 4: query parameter, only for side-effect-free methods.
    if is_read_only_method(signals.method) {
        if let Some(id) = non_empty(signals.query_tenant) {
            return Some(TenantId::from(id));
        }
    }

    // Priority 5: route parameter.
    non_empty(signals.route_tenant).map(TenantId::from)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn is_read_only_method(method: &str) -> bool {
    method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD")
}

/// First label of the host when it looks like a tenant subdomain:
/// lowercase alphanumerics with interior dashes, followed by a dot.
fn subdomain_label(host: &str) -> Option<&str> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"^([a-z0-9]+(-[a-z0-9]+)*)\.").expect("valid regex literal"));

    pattern
        .captures(host)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}
