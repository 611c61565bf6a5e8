//! Skald error types and wire classification.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Skald error types
#[derive(Debug, thiserror::Error)]
pub enum SkaldError {
    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("insufficient quota on upstream account")]
    InsufficientQuota,

    #[error("request timed out")]
    Timeout,

    // Admission denials (decided locally, never reach the upstream)
    #[error("daily request or token limit reached")]
    DailyLimitReached,

    #[error("daily request or token limit reached for this client")]
    ClientDailyLimitReached,

    // Configuration errors
    #[error("no upstream generator configured")]
    NoUpstream,

    #[error("configuration error: {0}")]
    Configuration(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Soft errors
    #[error("empty response from model")]
    EmptyResponse,
}

impl SkaldError {
    /// Whether the operation may succeed if simply retried.
    ///
    /// Rate limits, timeouts, and transport-level failures are transient;
    /// credential, billing, and quota denials are not.
    pub fn is_transient(&self) -> bool {
        match self {
            SkaldError::RateLimited { .. }
            | SkaldError::Timeout
            | SkaldError::Http(_)
            | SkaldError::EmptyResponse => true,
            SkaldError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Provider-supplied retry hint, if one was attached to the error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SkaldError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Map this error onto the wire taxonomy.
    ///
    /// Classification is total: every error maps to exactly one kind with a
    /// fixed HTTP status and retryability flag. The raw error never crosses
    /// the gateway boundary, only its classification does.
    pub fn classify(&self) -> ErrorClassification {
        let (kind, http_status, retryable) = match self {
            SkaldError::InsufficientQuota => (ErrorKind::InsufficientQuota, 402, false),
            SkaldError::AuthenticationFailed => (ErrorKind::InvalidApiKey, 401, false),
            SkaldError::RateLimited { .. } => (ErrorKind::RateLimitExceeded, 429, true),
            SkaldError::Timeout => (ErrorKind::RequestTimeout, 408, true),
            SkaldError::DailyLimitReached => (ErrorKind::DailyLimitReached, 429, false),
            SkaldError::ClientDailyLimitReached => {
                (ErrorKind::ClientDailyLimitReached, 429, false)
            }
            SkaldError::NoUpstream => (ErrorKind::ServiceUnavailable, 503, false),
            SkaldError::Http(_)
            | SkaldError::Api { .. }
            | SkaldError::Configuration(_)
            | SkaldError::Json(_)
            | SkaldError::EmptyResponse => (ErrorKind::AiRequestFailed, 500, true),
        };
        ErrorClassification {
            kind,
            http_status,
            message: self.to_string(),
            retryable,
        }
    }
}

/// Wire-level error kinds.
///
/// Serialized in snake_case as the `code` field of failure bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DailyLimitReached,
    ClientDailyLimitReached,
    InsufficientQuota,
    InvalidApiKey,
    RateLimitExceeded,
    RequestTimeout,
    ServiceUnavailable,
    AiRequestFailed,
}

impl ErrorKind {
    /// Snake-case wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DailyLimitReached => "daily_limit_reached",
            ErrorKind::ClientDailyLimitReached => "client_daily_limit_reached",
            ErrorKind::InsufficientQuota => "insufficient_quota",
            ErrorKind::InvalidApiKey => "invalid_api_key",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::RequestTimeout => "request_timeout",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::AiRequestFailed => "ai_request_failed",
        }
    }
}

/// One classified failure, as it propagates past the upstream boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorClassification {
    pub kind: ErrorKind,
    pub http_status: u16,
    pub message: String,
    pub retryable: bool,
}

/// Result type alias for Skald operations
pub type Result<T> = std::result::Result<T, SkaldError>;
