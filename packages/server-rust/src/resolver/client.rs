//! Remote configuration authority client.
//!
//! Fetches a tenant's configuration snapshot over HTTP with a bounded
//! retry budget and exponential backoff. An attempt only counts as a
//! success when the transport succeeds, the status is 2xx, and the response
//! envelope itself reports success. Every failed attempt is logged with its
//! cause and attempt number; only the final outcome crosses the component
//! boundary.

use async_trait::async_trait;
use gatehouse_core::{AuthorityEnvelope, TenantConfig, TenantId};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::config::AuthorityConfig;

/// Header carrying the service-to-service authentication token.
pub const SERVICE_TOKEN_HEADER: &str = "X-Service-Token";
/// Header carrying the request-correlation identifier.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Terminal fetch failure: the retry budget is exhausted.
///
/// Transient per-attempt failures never surface on their own; they are
/// folded into this error once no attempts remain.
#[derive(Debug, thiserror::Error)]
#[error("tenant configuration fetch failed after {attempts} attempts: {last_cause}")]
pub struct FetchError {
    pub attempts: u32,
    pub last_cause: String,
}

/// Why a single attempt failed. Logged per attempt, never returned.
#[derive(Debug, thiserror::Error)]
enum AttemptFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("authority returned status {0}")]
    Status(StatusCode),
    #[error("authority reported failure: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),
    #[error("authority reported success without a payload")]
    MissingData,
}

/// Seam between the orchestrator and the remote authority.
///
/// The production implementation is [`HttpAuthorityClient`]; tests inject
/// stubs to exercise the orchestrator without a network.
#[async_trait]
pub trait ConfigAuthority: Send + Sync {
    /// Fetches the configuration snapshot for one tenant.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] once the retry budget is exhausted without a
    /// successful, well-formed response.
    async fn fetch(
        &self,
        tenant_id: &TenantId,
        correlation_id: &str,
    ) -> Result<TenantConfig, FetchError>;
}

/// HTTP client for the authority's tenant-lookup endpoint.
pub struct HttpAuthorityClient {
    http: reqwest::Client,
    config: AuthorityConfig,
}

impl HttpAuthorityClient {
    /// Builds the client with the per-attempt timeout baked in.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: AuthorityConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    fn lookup_url(&self, tenant_id: &TenantId) -> String {
        format!(
            "{}/api/tenants/{tenant_id}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn attempt(
        &self,
        url: &str,
        correlation_id: &str,
    ) -> Result<TenantConfig, AttemptFailure> {
        let response = self
            .http
            .get(url)
            .header(SERVICE_TOKEN_HEADER, &self.config.service_token)
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, correlation_id)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptFailure::Status(status));
        }

        let envelope: AuthorityEnvelope<TenantConfig> = response.json().await?;
        if !envelope.success {
            return Err(AttemptFailure::Rejected(envelope.message));
        }
        envelope.data.ok_or(AttemptFailure::MissingData)
    }
}

#[async_trait]
impl ConfigAuthority for HttpAuthorityClient {
    async fn fetch(
        &self,
        tenant_id: &TenantId,
        correlation_id: &str,
    ) -> Result<TenantConfig, FetchError> {
        let url = self.lookup_url(tenant_id);
        let mut last_cause = String::from("no attempts made");

        for attempt in 0..self.config.max_retries {
            match self.attempt(&url, correlation_id).await {
                Ok(config) => {
                    metrics::counter!("gatehouse_fetch_attempts_total", "outcome" => "success")
                        .increment(1);
                    debug!(
                        tenant_id = %tenant_id,
                        attempt = attempt + 1,
                        "fetched tenant configuration"
                    );
                    return Ok(config);
                }
                Err(cause) => {
                    metrics::counter!("gatehouse_fetch_attempts_total", "outcome" => "failure")
                        .increment(1);
                    warn!(
                        tenant_id = %tenant_id,
                        attempt = attempt + 1,
                        error = %cause,
                        "tenant configuration fetch attempt failed"
                    );
                    last_cause = cause.to_string();
                }
            }

            // Backoff between attempts, never after the last one.
            if attempt + 1 < self.config.max_retries {
                tokio::time::sleep(self.config.backoff_base * 2u32.pow(attempt)).await;
            }
        }

        Err(FetchError {
            attempts: self.config.max_retries,
            last_cause,
        })
    }
}
