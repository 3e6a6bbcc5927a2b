//! Wire contracts: the authority response envelope and the uniform
//! rejection payload returned to callers.

use serde::{Deserialize, Serialize};

/// Response envelope used by the configuration authority.
///
/// Success: `{"success": true, "data": {...}}`. Failure: `{"success": false}`
/// with an optional `message`. A 2xx status with `"success": false` is still
/// a failed lookup -- transport and payload success are checked separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct AuthorityEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> AuthorityEnvelope<T> {
    /// Wraps a payload in a successful envelope.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Builds a failed envelope with a human-readable message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Extracts the payload if the envelope reports success and carries one.
    pub fn into_data(self) -> Option<T> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}

/// Machine-readable rejection codes, stable across releases.
///
/// Callers branch on these to distinguish configuration problems from
/// transient unavailability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    TenantNotSpecified,
    InvalidTenant,
    ServiceUnavailable,
    TenantInactive,
    UnknownError,
}

impl ErrorCode {
    /// HTTP status equivalent for this code.
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            Self::TenantNotSpecified => 400,
            Self::InvalidTenant | Self::TenantInactive => 403,
            Self::ServiceUnavailable => 503,
            Self::UnknownError => 500,
        }
    }

    /// The wire string for this code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TenantNotSpecified => "TENANT_NOT_SPECIFIED",
            Self::InvalidTenant => "INVALID_TENANT",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::TenantInactive => "TENANT_INACTIVE",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

/// Uniform body for every rejected request:
/// `{"success": false, "message": ..., "error_code": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionBody {
    pub success: bool,
    pub message: String,
    pub error_code: ErrorCode,
}

impl RejectionBody {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_code: code,
        }
    }
}
