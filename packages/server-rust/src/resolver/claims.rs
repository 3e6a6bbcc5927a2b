//! Bearer-token claims for identifier extraction.
//!
//! Token *issuance* belongs to the authentication service; this module only
//! verifies inbound bearer tokens far enough to trust their `tenant_id`
//! claim as extraction priority 2. A missing, malformed, or forged token is
//! not an error here -- the extraction chain simply moves to the next
//! source.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Claims the resolver cares about. Everything else in the token is ignored.
#[derive(Debug, Deserialize)]
pub struct PrincipalClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Verifies bearer tokens and pulls out the tenant claim.
pub struct ClaimsDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl ClaimsDecoder {
    /// HS256 decoder sharing the issuer's signing secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Tenant claim of a verified `Authorization: Bearer` header.
    ///
    /// Returns `None` for absent headers, non-bearer schemes, invalid
    /// signatures, expired tokens, and tokens without the claim.
    #[must_use]
    pub fn tenant_claim(&self, authorization: Option<&str>) -> Option<String> {
        let token = authorization?.strip_prefix("Bearer ")?;
        let data = jsonwebtoken::decode::<PrincipalClaims>(token, &self.key, &self.validation)
            .ok()?;
        data.claims.tenant_id
    }
}
