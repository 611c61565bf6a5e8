//! Caller-side resilience wrapper.
//!
//! [`ResilientNarrativeClient`] guarantees the caller-facing contract of
//! the whole subsystem: you always get usable narrative text. Every
//! gateway failure — quota denial, upstream error, missing upstream, or
//! an empty success body — is logged, swallowed, and replaced by the
//! local fallback generator running on the same case bundle. Degraded
//! quality is an observability concern, never an error surfaced to the
//! UI layer.
//!
//! Successful upstream text passes through the same markdown-stripping
//! normalization as fallback text, so callers receive uniformly plain
//! prose regardless of which path produced it.

use std::sync::Arc;

use jiff::Zoned;
use tracing::warn;

use crate::fallback;
use crate::gateway::NarrativeGateway;
use crate::ledger::ClientKey;
use crate::telemetry;
use crate::types::{
    CaseBundle, EndpointKind, EnhanceRequest, InsightsRequest, SummarizeRequest,
};

/// Infallible narrative client. See module docs.
pub struct ResilientNarrativeClient {
    gateway: Arc<NarrativeGateway>,
    client_key: ClientKey,
}

impl ResilientNarrativeClient {
    pub fn new(gateway: Arc<NarrativeGateway>, client_key: ClientKey) -> Self {
        Self {
            gateway,
            client_key,
        }
    }

    /// Narrative summary for a report. Never fails.
    pub async fn summarize(&self, bundle: &CaseBundle, report_type: &str) -> String {
        let request = SummarizeRequest {
            bundle: bundle.clone(),
            report_type: report_type.to_owned(),
            data: None,
        };
        match self
            .gateway
            .summarize_report(&self.client_key, request)
            .await
        {
            Ok(response) if !response.summary.trim().is_empty() => {
                fallback::strip_markdown(&response.summary)
            }
            Ok(_) => self.local(EndpointKind::SummarizeReport, bundle, "empty summary body"),
            Err(failure) => self.local(
                EndpointKind::SummarizeReport,
                bundle,
                &failure.to_string(),
            ),
        }
    }

    /// Behavioral-insight commentary. Never fails.
    pub async fn insights(&self, bundle: &CaseBundle) -> String {
        let request = InsightsRequest {
            bundle: bundle.clone(),
        };
        match self
            .gateway
            .behavioral_insights(&self.client_key, request)
            .await
        {
            Ok(response) if !response.insights.trim().is_empty() => {
                fallback::strip_markdown(&response.insights)
            }
            Ok(_) => self.local(
                EndpointKind::BehavioralInsights,
                bundle,
                "empty insights body",
            ),
            Err(failure) => self.local(
                EndpointKind::BehavioralInsights,
                bundle,
                &failure.to_string(),
            ),
        }
    }

    /// Polished rewrite of a report draft. Never fails; on fallback the
    /// draft is replaced by a locally generated report rather than
    /// returned unpolished, so downstream rendering sees one shape.
    pub async fn enhance(
        &self,
        bundle: &CaseBundle,
        report_type: &str,
        report_content: &str,
    ) -> String {
        let request = EnhanceRequest {
            bundle: bundle.clone(),
            report_type: report_type.to_owned(),
            report_content: report_content.to_owned(),
        };
        match self.gateway.enhance_report(&self.client_key, request).await {
            Ok(response) if !response.enhanced_content.trim().is_empty() => {
                fallback::strip_markdown(&response.enhanced_content)
            }
            Ok(_) => self.local(EndpointKind::EnhanceReport, bundle, "empty enhancement body"),
            Err(failure) => {
                self.local(EndpointKind::EnhanceReport, bundle, &failure.to_string())
            }
        }
    }

    /// Run the local generator and account for the degradation.
    fn local(&self, kind: EndpointKind, bundle: &CaseBundle, reason: &str) -> String {
        warn!(
            endpoint = kind.as_str(),
            reason, "falling back to local narrative generation"
        );
        metrics::counter!(telemetry::FALLBACKS_TOTAL, "endpoint" => kind.as_str()).increment(1);
        fallback::generate(kind, bundle, Zoned::now().date())
    }
}
