//! Endpoint response bodies and generation results.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorClassification, ErrorKind};
use crate::ledger::QuotaConfig;

/// One completed upstream generation.
///
/// Immutable once produced; the cache and concurrent callers share it
/// behind an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    /// Best-effort structured parse of `text`, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<serde_json::Value>,
    pub tokens_used: u64,
}

/// Token usage attached to success bodies.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageReport {
    pub total_tokens: u64,
}

/// Success body for report summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
    pub model: String,
    pub usage: UsageReport,
    pub request_id: String,
    pub cached: bool,
}

/// Success body for behavioral insights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub insights: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<serde_json::Value>,
    pub usage: UsageReport,
    pub request_id: String,
    pub cached: bool,
}

/// Success body for report enhancement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceResponse {
    pub enhanced_content: String,
    pub original_length: usize,
    pub enhanced_length: usize,
    pub usage: UsageReport,
    pub request_id: String,
    pub cached: bool,
}

/// Failure body returned by every generating endpoint.
///
/// `fallback` is always `true`: any classified failure is a safe signal
/// for callers to substitute locally generated narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorKind,
    pub retryable: bool,
    pub fallback: bool,
    pub request_id: String,
}

/// A classified failure plus the HTTP status it travels under.
#[derive(Debug, Clone)]
pub struct GatewayFailure {
    pub status: u16,
    pub body: ErrorBody,
}

impl GatewayFailure {
    /// Build a wire failure from a classification.
    pub fn from_classification(c: &ErrorClassification, request_id: String) -> Self {
        Self {
            status: c.http_status,
            body: ErrorBody {
                error: c.message.clone(),
                code: c.kind,
                retryable: c.retryable,
                fallback: true,
                request_id,
            },
        }
    }
}

impl std::fmt::Display for GatewayFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.body.code.as_str(),
            self.status,
            self.body.error
        )
    }
}

impl std::error::Error for GatewayFailure {}

/// One entry in the gateway's bounded recent-error ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// RFC 3339 timestamp of the failure.
    pub at: String,
    pub endpoint: String,
    pub code: ErrorKind,
    pub message: String,
}

/// Current day's usage, as reported by the status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub day: String,
    pub requests: u64,
    pub tokens: u64,
    pub clients: usize,
}

/// Cache occupancy, as reported by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheReport {
    pub entries: usize,
    pub capacity: usize,
}

/// Configured model per tier, as reported by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsReport {
    pub standard: String,
    pub premium: String,
}

/// Body of the status endpoint. Degrades to partial data rather than
/// erroring; always quota-exempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// Upstream answered a health probe.
    pub available: bool,
    /// An upstream generator is configured at all.
    pub configured: bool,
    pub model: String,
    pub models: ModelsReport,
    pub limits: QuotaConfig,
    pub daily_usage: UsageSnapshot,
    pub cache: CacheReport,
    #[serde(default)]
    pub recent_errors: Vec<ErrorRecord>,
}
