//! Gateway request handler.
//!
//! [`NarrativeGateway`] orchestrates the ledger, cache, tier catalog, and
//! upstream invoker for every inbound request. Each generating endpoint
//! runs the same machine:
//!
//! ```text
//! received -> admitted | denied(429)
//!          -> cache check -> hit: return cached text
//!          -> upstream call -> success: record tokens, cache, return
//!                           -> error: classify, return status + body
//! ```
//!
//! Admission runs before the cache check, so a hit still charges one
//! request unit; tokens are charged only for real upstream calls. The
//! status endpoint skips admission entirely so callers can inspect
//! remaining quota even when exhausted.
//!
//! Admission and both cache operations are synchronous critical sections;
//! the upstream call is the only suspension point. Two concurrent misses
//! on one fingerprint both call upstream and the second write overwrites
//! with an equivalent value — accepted in preference to an in-flight
//! de-duplication map.

mod builder;
mod prompts;

pub use builder::{EndpointTtls, Skald, SkaldBuilder};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jiff::Timestamp;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{ResponseCache, fingerprint};
use crate::error::ErrorClassification;
use crate::ledger::{Admission, ClientKey, UsageLedger};
use crate::models::{ModelCatalog, ModelTier};
use crate::telemetry;
use crate::types::{
    CacheReport, EndpointKind, EnhanceRequest, EnhanceResponse, ErrorRecord, GatewayFailure,
    GenerationResult, InsightsRequest, InsightsResponse, ModelsReport, StatusReport,
    SummarizeRequest, SummarizeResponse, UsageReport,
};
use crate::upstream::{GenerationRequest, RetryConfig, TextGenerator, with_retry};
use crate::SkaldError;

/// How many recent failures the status endpoint exposes.
const ERROR_RING_CAP: usize = 16;

/// Result type for gateway endpoints: success body or classified wire
/// failure.
pub type EndpointResult<T> = std::result::Result<T, GatewayFailure>;

struct Generated {
    result: Arc<GenerationResult>,
    cached: bool,
}

/// The AI-assisted narrative gateway. Construct via [`Skald::builder()`].
pub struct NarrativeGateway {
    upstream: Option<Arc<dyn TextGenerator>>,
    ledger: UsageLedger,
    cache: ResponseCache,
    models: ModelCatalog,
    retry: RetryConfig,
    ttls: EndpointTtls,
    recent_errors: Mutex<VecDeque<ErrorRecord>>,
}

impl NarrativeGateway {
    pub(crate) fn new(
        upstream: Option<Arc<dyn TextGenerator>>,
        ledger: UsageLedger,
        cache: ResponseCache,
        models: ModelCatalog,
        retry: RetryConfig,
        ttls: EndpointTtls,
    ) -> Self {
        Self {
            upstream,
            ledger,
            cache,
            models,
            retry,
            ttls,
            recent_errors: Mutex::new(VecDeque::with_capacity(ERROR_RING_CAP)),
        }
    }

    /// Generate the narrative section of a report.
    pub async fn summarize_report(
        &self,
        client: &ClientKey,
        request: SummarizeRequest,
    ) -> EndpointResult<SummarizeResponse> {
        let kind = EndpointKind::SummarizeReport;
        let request_id = new_request_id();
        let model = self.models.resolve(ModelTier::Standard).to_owned();
        let payload = self.payload(kind, &request, &request_id)?;
        let (system, user) = prompts::summarize(&request);
        let generated = self
            .generate(
                client,
                kind,
                &model,
                system,
                user,
                payload,
                self.ttls.summarize,
                900,
                0.4,
                false,
                &request_id,
            )
            .await?;
        Ok(SummarizeResponse {
            summary: generated.result.text.clone(),
            model,
            usage: UsageReport {
                total_tokens: generated.result.tokens_used,
            },
            request_id,
            cached: generated.cached,
        })
    }

    /// Generate behavioral insights from behavior-point data.
    pub async fn behavioral_insights(
        &self,
        client: &ClientKey,
        request: InsightsRequest,
    ) -> EndpointResult<InsightsResponse> {
        let kind = EndpointKind::BehavioralInsights;
        let request_id = new_request_id();
        let model = self.models.resolve(ModelTier::Standard).to_owned();
        let payload = self.payload(kind, &request, &request_id)?;
        let (system, user) = prompts::insights(&request);
        let generated = self
            .generate(
                client,
                kind,
                &model,
                system,
                user,
                payload,
                self.ttls.insights,
                700,
                0.3,
                true,
                &request_id,
            )
            .await?;
        Ok(InsightsResponse {
            insights: generated.result.text.clone(),
            structured: generated.result.structured.clone(),
            usage: UsageReport {
                total_tokens: generated.result.tokens_used,
            },
            request_id,
            cached: generated.cached,
        })
    }

    /// Rewrite an existing report draft into polished clinical prose.
    pub async fn enhance_report(
        &self,
        client: &ClientKey,
        request: EnhanceRequest,
    ) -> EndpointResult<EnhanceResponse> {
        let kind = EndpointKind::EnhanceReport;
        let request_id = new_request_id();
        let model = self.models.resolve(ModelTier::Premium).to_owned();
        let original_length = request.report_content.len();
        let payload = self.payload(kind, &request, &request_id)?;
        let (system, user) = prompts::enhance(&request);
        let generated = self
            .generate(
                client,
                kind,
                &model,
                system,
                user,
                payload,
                self.ttls.enhance,
                1400,
                0.5,
                false,
                &request_id,
            )
            .await?;
        Ok(EnhanceResponse {
            enhanced_length: generated.result.text.len(),
            enhanced_content: generated.result.text.clone(),
            original_length,
            usage: UsageReport {
                total_tokens: generated.result.tokens_used,
            },
            request_id,
            cached: generated.cached,
        })
    }

    /// Report ledger, cache, and upstream state.
    ///
    /// Quota-exempt so callers can always inspect remaining capacity, and
    /// degrades to partial data rather than erroring. The upstream probe
    /// consumes no generation quota on either side.
    pub async fn status(&self) -> StatusReport {
        metrics::counter!(
            telemetry::REQUESTS_TOTAL,
            "endpoint" => EndpointKind::Status.as_str(),
            "status" => "ok"
        )
        .increment(1);
        let configured = self.upstream.is_some();
        let available = match &self.upstream {
            Some(upstream) => upstream.probe().await,
            None => false,
        };
        let recent_errors = {
            let ring = self.recent_errors.lock().unwrap_or_else(|e| e.into_inner());
            ring.iter().cloned().collect()
        };
        StatusReport {
            available,
            configured,
            model: self.models.resolve(ModelTier::Standard).to_owned(),
            models: ModelsReport {
                standard: self.models.resolve(ModelTier::Standard).to_owned(),
                premium: self.models.resolve(ModelTier::Premium).to_owned(),
            },
            limits: self.ledger.quota().clone(),
            daily_usage: self.ledger.snapshot(),
            cache: CacheReport {
                entries: self.cache.len(),
                capacity: self.cache.capacity(),
            },
            recent_errors,
        }
    }

    /// Serialize a request body into the fingerprint payload.
    fn payload<T: serde::Serialize>(
        &self,
        kind: EndpointKind,
        request: &T,
        request_id: &str,
    ) -> EndpointResult<serde_json::Value> {
        serde_json::to_value(request).map_err(|e| self.fail(kind, SkaldError::from(e), request_id))
    }

    /// Run the shared request machine for one generating endpoint.
    #[allow(clippy::too_many_arguments)]
    async fn generate(
        &self,
        client: &ClientKey,
        kind: EndpointKind,
        model: &str,
        system_prompt: String,
        user_prompt: String,
        payload: serde_json::Value,
        ttl: Duration,
        max_tokens: u32,
        temperature: f32,
        structured_output: bool,
        request_id: &str,
    ) -> EndpointResult<Generated> {
        let endpoint = kind.as_str();

        let Some(upstream) = self.upstream.as_ref() else {
            return Err(self.fail(kind, SkaldError::NoUpstream, request_id));
        };

        match self.ledger.admit(client) {
            Admission::Granted => {}
            Admission::DeniedGlobal => {
                return Err(self.fail(kind, SkaldError::DailyLimitReached, request_id));
            }
            Admission::DeniedClient => {
                return Err(self.fail(kind, SkaldError::ClientDailyLimitReached, request_id));
            }
        }

        let key = fingerprint(endpoint, model, &payload);
        if let Some(result) = self.cache.lookup(&key, endpoint) {
            debug!(endpoint, fingerprint = %&key[..12], "cache hit");
            metrics::counter!(telemetry::REQUESTS_TOTAL, "endpoint" => endpoint, "status" => "ok")
                .increment(1);
            return Ok(Generated {
                result,
                cached: true,
            });
        }

        let generation = GenerationRequest {
            model: model.to_owned(),
            system_prompt,
            user_prompt,
            max_tokens,
            temperature,
            structured_output,
        };
        let started = std::time::Instant::now();
        let outcome = with_retry(&self.retry, endpoint, || upstream.generate(&generation)).await;
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "endpoint" => endpoint)
            .record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(result) => {
                self.ledger.record_tokens(client, result.tokens_used);
                metrics::counter!(telemetry::TOKENS_TOTAL, "endpoint" => endpoint)
                    .increment(result.tokens_used);
                metrics::counter!(telemetry::REQUESTS_TOTAL, "endpoint" => endpoint, "status" => "ok")
                    .increment(1);
                let result = Arc::new(result);
                self.cache.store(&key, Arc::clone(&result), ttl);
                Ok(Generated {
                    result,
                    cached: false,
                })
            }
            Err(e) => Err(self.fail(kind, e, request_id)),
        }
    }

    /// Classify a failure, log and ring-record it, and shape the wire body.
    fn fail(&self, kind: EndpointKind, error: SkaldError, request_id: &str) -> GatewayFailure {
        let classification = error.classify();
        warn!(
            endpoint = kind.as_str(),
            code = classification.kind.as_str(),
            retryable = classification.retryable,
            error = %error,
            "narrative request failed"
        );
        metrics::counter!(
            telemetry::REQUESTS_TOTAL,
            "endpoint" => kind.as_str(),
            "status" => "error"
        )
        .increment(1);
        self.record_error(kind, &classification);
        GatewayFailure::from_classification(&classification, request_id.to_owned())
    }

    fn record_error(&self, kind: EndpointKind, classification: &ErrorClassification) {
        let mut ring = self.recent_errors.lock().unwrap_or_else(|e| e.into_inner());
        if ring.len() == ERROR_RING_CAP {
            ring.pop_front();
        }
        ring.push_back(ErrorRecord {
            at: Timestamp::now().to_string(),
            endpoint: kind.as_str().to_owned(),
            code: classification.kind,
            message: classification.message.clone(),
        });
    }
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}
