//! Endpoint request bodies.

use serde::{Deserialize, Serialize};

use super::bundle::CaseBundle;

/// The gateway's logical endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    SummarizeReport,
    BehavioralInsights,
    EnhanceReport,
    Status,
}

impl EndpointKind {
    /// Stable name used for fingerprints, metric labels, and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::SummarizeReport => "summarize_report",
            EndpointKind::BehavioralInsights => "behavioral_insights",
            EndpointKind::EnhanceReport => "enhance_report",
            EndpointKind::Status => "status",
        }
    }
}

/// Request body for report summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub bundle: CaseBundle,
    /// Report kind as named by the record layer, e.g. "monthly-progress".
    pub report_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Request body for behavioral-insight generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsRequest {
    pub bundle: CaseBundle,
}

/// Request body for prose enhancement of an existing report draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceRequest {
    pub bundle: CaseBundle,
    pub report_type: String,
    pub report_content: String,
}
