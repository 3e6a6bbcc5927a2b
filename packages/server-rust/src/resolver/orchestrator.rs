//! Resolution orchestrator.
//!
//! Composes the breaker, extraction chain, cache, authority client, and
//! binder into the per-request pipeline:
//!
//! breaker check -> identifier extraction -> cache lookup -> [remote fetch]
//! -> active check -> context bind.
//!
//! Every terminal outcome is a value, not a panic: the request either
//! proceeds with a bound [`TenantContext`] or is rejected with a stable
//! machine-readable reason.

use std::sync::Arc;

use gatehouse_core::{
    extract_tenant_id, ErrorCode, RejectionBody, RequestSignals, TenantConfig, TenantContext,
    TenantId,
};
use tracing::{debug, info, warn};

use super::binder::ContextBinder;
use super::breaker::FailureBreaker;
use super::cache::{CachedOutcome, ConfigCache};
use super::client::ConfigAuthority;
use super::config::ResolverConfig;

/// Terminal rejection reasons, one per early-exit state of the pipeline.
///
/// An unresolvable tenant and a tenant that truly does not exist are
/// deliberately indistinguishable to the caller: both are `InvalidTenant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
    #[error("Tenant not specified")]
    TenantNotSpecified,
    #[error("Invalid tenant")]
    InvalidTenant,
    #[error("Tenant is not active")]
    TenantInactive,
}

impl Rejection {
    #[must_use]
    pub fn error_code(self) -> ErrorCode {
        match self {
            Self::ServiceUnavailable => ErrorCode::ServiceUnavailable,
            Self::TenantNotSpecified => ErrorCode::TenantNotSpecified,
            Self::InvalidTenant => ErrorCode::InvalidTenant,
            Self::TenantInactive => ErrorCode::TenantInactive,
        }
    }

    /// HTTP status equivalent.
    #[must_use]
    pub fn status(self) -> u16 {
        self.error_code().status()
    }

    /// The uniform caller-facing payload for this rejection.
    #[must_use]
    pub fn body(self) -> RejectionBody {
        RejectionBody::new(self.error_code(), self.to_string())
    }
}

/// The tenant resolution engine.
///
/// Cache and breaker are process-wide services owned here and shared by
/// every in-flight request; the authority client sits behind a trait seam
/// so tests run without a network. Construction wires everything once; the
/// per-request surface is [`resolve`](Self::resolve).
pub struct TenantResolver {
    cache: ConfigCache,
    breaker: FailureBreaker,
    authority: Arc<dyn ConfigAuthority>,
    binder: ContextBinder,
    audit_log: bool,
}

impl TenantResolver {
    #[must_use]
    pub fn new(
        config: &ResolverConfig,
        authority: Arc<dyn ConfigAuthority>,
        binder: ContextBinder,
    ) -> Self {
        Self {
            cache: ConfigCache::new(config.cache_ttl, config.negative_cache_ttl),
            breaker: FailureBreaker::new(config.breaker_threshold, config.breaker_window),
            authority,
            binder,
            audit_log: config.audit_log,
        }
    }

    /// Resolves one request to a bound tenant context, or a rejection.
    ///
    /// Steps are strictly sequential; the only suspension points are the
    /// remote fetch and its backoff pauses, so dropping the returned future
    /// (caller timeout, disconnect) abandons the resolution cleanly.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] matching the first pipeline step that
    /// refused the request.
    pub async fn resolve(
        &self,
        signals: &RequestSignals<'_>,
        correlation_id: &str,
    ) -> Result<TenantContext, Rejection> {
        let outcome = self.resolve_inner(signals, correlation_id).await;

        match &outcome {
            Ok(context) => {
                metrics::counter!("gatehouse_resolutions_total", "outcome" => "proceed")
                    .increment(1);
                self.audit(signals, Some(&context.tenant_id), "proceed");
            }
            Err(rejection) => {
                metrics::counter!(
                    "gatehouse_resolutions_total",
                    "outcome" => rejection.error_code().as_str()
                )
                .increment(1);
                self.audit(signals, None, rejection.error_code().as_str());
            }
        }
        outcome
    }

    async fn resolve_inner(
        &self,
        signals: &RequestSignals<'_>,
        correlation_id: &str,
    ) -> Result<TenantContext, Rejection> {
        if self.breaker.is_open() {
            return Err(Rejection::ServiceUnavailable);
        }

        let Some(tenant_id) = extract_tenant_id(signals) else {
            return Err(Rejection::TenantNotSpecified);
        };

        let config = match self.cache.lookup(&tenant_id) {
            Some(CachedOutcome::Found(config)) => {
                metrics::counter!("gatehouse_cache_lookups_total", "result" => "hit").increment(1);
                config
            }
            Some(CachedOutcome::Unresolvable) => {
                metrics::counter!("gatehouse_cache_lookups_total", "result" => "negative_hit")
                    .increment(1);
                return Err(Rejection::InvalidTenant);
            }
            None => {
                metrics::counter!("gatehouse_cache_lookups_total", "result" => "miss").increment(1);
                self.fetch_and_cache(tenant_id.clone(), correlation_id)
                    .await?
            }
        };

        if !config.status.is_active() {
            return Err(Rejection::TenantInactive);
        }

        Ok(self.binder.bind(&tenant_id, config))
    }

    /// Fetches a snapshot from the authority, updating breaker and cache.
    ///
    /// One breaker failure per exhausted fetch, regardless of how many
    /// attempts the retry budget spent.
    async fn fetch_and_cache(
        &self,
        tenant_id: TenantId,
        correlation_id: &str,
    ) -> Result<Arc<TenantConfig>, Rejection> {
        match self.authority.fetch(&tenant_id, correlation_id).await {
            Ok(config) => {
                self.breaker.record_success();
                let config = Arc::new(config);
                self.cache.store(tenant_id, Arc::clone(&config));
                Ok(config)
            }
            Err(err) => {
                let failures = self.breaker.record_failure();
                warn!(
                    tenant_id = %tenant_id,
                    correlation_id,
                    failures,
                    error = %err,
                    "tenant configuration unavailable"
                );
                self.cache.store_negative(tenant_id);
                Err(Rejection::InvalidTenant)
            }
        }
    }

    fn audit(&self, signals: &RequestSignals<'_>, tenant_id: Option<&TenantId>, outcome: &str) {
        if !self.audit_log {
            return;
        }
        info!(
            tenant_id = tenant_id.map(TenantId::as_str),
            method = signals.method,
            host = signals.host,
            outcome,
            "tenant access"
        );
    }

    /// Drops the cached snapshot for a tenant so the next request refetches.
    pub fn invalidate(&self, tenant_id: &TenantId) {
        debug!(tenant_id = %tenant_id, "invalidating cached tenant configuration");
        self.cache.invalidate(tenant_id);
    }

    /// Shared breaker, for health reporting and operational tooling.
    #[must_use]
    pub fn breaker(&self) -> &FailureBreaker {
        &self.breaker
    }

    /// Shared cache, for health reporting and housekeeping.
    #[must_use]
    pub fn cache(&self) -> &ConfigCache {
        &self.cache
    }
}
