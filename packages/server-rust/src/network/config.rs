//! Network configuration for the gateway.

use std::time::Duration;

/// Top-level network configuration for the gateway server.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
    /// Budget for one tenant resolution, retries and backoff included.
    /// Expiry mid-resolution surfaces as service-unavailable rather than
    /// blocking the request past its deadline.
    pub resolve_deadline: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            resolve_deadline: Duration::from_secs(12),
        }
    }
}
