//! End-to-end tests for [`NarrativeGateway`] against a scriptable upstream.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use jiff::Zoned;

use skald::upstream::{GenerationRequest, RetryConfig, TextGenerator};
use skald::{
    CacheConfig, CaseBundle, CaseNote, ClientKey, ErrorKind, GenerationResult, ModelCatalog,
    QuotaConfig, Result, Skald, SkaldError, SummarizeRequest, YouthProfile,
};

// ============================================================================
// Scriptable upstream
// ============================================================================

enum Script {
    Succeed { text: &'static str, tokens: u64 },
    Fail(fn() -> SkaldError),
}

struct ScriptedUpstream {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedUpstream {
    fn succeeding(text: &'static str, tokens: u64) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Succeed { text, tokens },
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(make: fn() -> SkaldError) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Fail(make),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedUpstream {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Succeed { text, tokens } => Ok(GenerationResult {
                text: (*text).to_owned(),
                structured: None,
                tokens_used: *tokens,
            }),
            Script::Fail(make) => Err(make()),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn caller() -> ClientKey {
    ClientKey::derive("10.0.0.1", "sk-caller-credential")
}

fn bundle() -> CaseBundle {
    CaseBundle {
        youth: YouthProfile::named("Jordan Reyes"),
        notes: vec![CaseNote::new("Participated in group without prompting.")],
        ratings: vec![],
        period: Some("June 2026".into()),
    }
}

fn summarize_request() -> SummarizeRequest {
    SummarizeRequest {
        bundle: bundle(),
        report_type: "monthly-progress".into(),
        data: None,
    }
}

fn catalog() -> ModelCatalog {
    ModelCatalog::new("test-standard", Some("test-premium".into()))
}

// ============================================================================
// Scenario A: quota available, cache empty, upstream succeeds
// ============================================================================

#[tokio::test]
async fn fresh_request_calls_upstream_and_accounts_tokens() {
    let upstream = ScriptedUpstream::succeeding("X", 50);
    let gateway = Skald::builder()
        .upstream(upstream.clone())
        .models(catalog())
        .retry(RetryConfig::disabled())
        .build();

    let response = gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .expect("summarize should succeed");

    assert_eq!(response.summary, "X");
    assert!(!response.cached);
    assert_eq!(response.model, "test-standard");
    assert_eq!(response.usage.total_tokens, 50);
    assert_eq!(upstream.calls(), 1);

    let status = gateway.status().await;
    let today = Zoned::now().date().to_string();
    assert_eq!(status.daily_usage.day, today);
    assert_eq!(status.daily_usage.requests, 1);
    assert_eq!(status.daily_usage.tokens, 50);
}

// ============================================================================
// Scenario B: identical request twice within TTL
// ============================================================================

#[tokio::test]
async fn repeat_request_hits_cache_without_token_accounting() {
    let upstream = ScriptedUpstream::succeeding("X", 50);
    let gateway = Skald::builder()
        .upstream(upstream.clone())
        .models(catalog())
        .retry(RetryConfig::disabled())
        .build();

    let first = gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .unwrap();
    let second = gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(second.summary, first.summary);
    assert_eq!(upstream.calls(), 1);

    let status = gateway.status().await;
    // the hit charged a request unit but no tokens
    assert_eq!(status.daily_usage.requests, 2);
    assert_eq!(status.daily_usage.tokens, 50);
}

#[tokio::test]
async fn different_payloads_do_not_share_cache_entries() {
    let upstream = ScriptedUpstream::succeeding("X", 10);
    let gateway = Skald::builder()
        .upstream(upstream.clone())
        .models(catalog())
        .retry(RetryConfig::disabled())
        .build();

    gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .unwrap();

    let mut changed = summarize_request();
    changed.report_type = "discharge".into();
    let response = gateway.summarize_report(&caller(), changed).await.unwrap();

    assert!(!response.cached);
    assert_eq!(upstream.calls(), 2);
}

// ============================================================================
// Scenario C: quota exhausted, upstream never invoked
// ============================================================================

#[tokio::test]
async fn exhausted_global_quota_denies_without_upstream_call() {
    let upstream = ScriptedUpstream::succeeding("X", 10);
    let gateway = Skald::builder()
        .upstream(upstream.clone())
        .models(catalog())
        .quota(QuotaConfig::new().global_daily_requests(1))
        .retry(RetryConfig::disabled())
        .build();

    gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .unwrap();

    let mut changed = summarize_request();
    changed.report_type = "discharge".into();
    let failure = gateway
        .summarize_report(&caller(), changed)
        .await
        .expect_err("second request should be denied");

    assert_eq!(failure.status, 429);
    assert_eq!(failure.body.code, ErrorKind::DailyLimitReached);
    assert!(failure.body.fallback);
    assert!(!failure.body.retryable);
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn per_client_quota_denies_with_client_reason() {
    let upstream = ScriptedUpstream::succeeding("X", 10);
    let gateway = Skald::builder()
        .upstream(upstream.clone())
        .models(catalog())
        .quota(
            QuotaConfig::new()
                .global_daily_requests(100)
                .per_client_daily_requests(1),
        )
        .retry(RetryConfig::disabled())
        .build();

    gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .unwrap();

    let mut changed = summarize_request();
    changed.report_type = "discharge".into();
    let failure = gateway
        .summarize_report(&caller(), changed)
        .await
        .expect_err("second request should be denied");

    assert_eq!(failure.body.code, ErrorKind::ClientDailyLimitReached);
    assert_eq!(upstream.calls(), 1);

    // a different caller still gets through
    let other = ClientKey::derive("10.0.0.9", "sk-other-credential");
    let mut other_request = summarize_request();
    other_request.report_type = "weekly".into();
    assert!(gateway.summarize_report(&other, other_request).await.is_ok());
}

// ============================================================================
// Upstream failures are classified, not propagated raw
// ============================================================================

#[tokio::test]
async fn auth_failure_maps_to_401_invalid_api_key() {
    let upstream = ScriptedUpstream::failing(|| SkaldError::AuthenticationFailed);
    let gateway = Skald::builder()
        .upstream(upstream)
        .models(catalog())
        .retry(RetryConfig::disabled())
        .build();

    let failure = gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .expect_err("auth failure should surface as a classified error");

    assert_eq!(failure.status, 401);
    assert_eq!(failure.body.code, ErrorKind::InvalidApiKey);
    assert!(failure.body.fallback);
    assert!(!failure.body.retryable);
}

#[tokio::test]
async fn failures_do_not_account_tokens() {
    let upstream = ScriptedUpstream::failing(|| SkaldError::AuthenticationFailed);
    let gateway = Skald::builder()
        .upstream(upstream)
        .models(catalog())
        .retry(RetryConfig::disabled())
        .build();

    let _ = gateway
        .summarize_report(&caller(), summarize_request())
        .await;

    let status = gateway.status().await;
    assert_eq!(status.daily_usage.tokens, 0);
    // the failed request was still admitted and charged one request unit
    assert_eq!(status.daily_usage.requests, 1);
}

#[tokio::test]
async fn failures_are_recorded_for_the_status_ring() {
    let upstream = ScriptedUpstream::failing(|| SkaldError::InsufficientQuota);
    let gateway = Skald::builder()
        .upstream(upstream)
        .models(catalog())
        .retry(RetryConfig::disabled())
        .build();

    let _ = gateway
        .summarize_report(&caller(), summarize_request())
        .await;

    let status = gateway.status().await;
    assert_eq!(status.recent_errors.len(), 1);
    assert_eq!(status.recent_errors[0].code, ErrorKind::InsufficientQuota);
    assert_eq!(status.recent_errors[0].endpoint, "summarize_report");
}

// ============================================================================
// Degraded mode: no upstream configured
// ============================================================================

#[tokio::test]
async fn missing_upstream_returns_503_with_fallback_flag() {
    let gateway = Skald::builder().models(catalog()).build();

    let failure = gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .expect_err("no upstream should fail closed");

    assert_eq!(failure.status, 503);
    assert_eq!(failure.body.code, ErrorKind::ServiceUnavailable);
    assert!(failure.body.fallback);
}

// ============================================================================
// Status endpoint
// ============================================================================

#[tokio::test]
async fn status_is_quota_exempt() {
    let upstream = ScriptedUpstream::succeeding("X", 10);
    let gateway = Skald::builder()
        .upstream(upstream)
        .models(catalog())
        .quota(QuotaConfig::new().global_daily_requests(1))
        .retry(RetryConfig::disabled())
        .build();

    gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .unwrap();

    // quota exhausted; status still answers, repeatedly, without charging
    for _ in 0..3 {
        let status = gateway.status().await;
        assert!(status.configured);
        assert!(status.available);
        assert_eq!(status.daily_usage.requests, 1);
    }
}

#[tokio::test]
async fn status_reports_configuration_and_cache() {
    let upstream = ScriptedUpstream::succeeding("X", 10);
    let gateway = Skald::builder()
        .upstream(upstream)
        .models(catalog())
        .cache(CacheConfig::new().max_entries(7))
        .build();

    let status = gateway.status().await;
    assert_eq!(status.model, "test-standard");
    assert_eq!(status.models.premium, "test-premium");
    assert_eq!(status.cache.entries, 0);
    assert_eq!(status.cache.capacity, 7);

    gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .unwrap();
    assert_eq!(gateway.status().await.cache.entries, 1);
}

#[tokio::test]
async fn status_degrades_gracefully_without_upstream() {
    let gateway = Skald::builder().models(catalog()).build();
    let status = gateway.status().await;
    assert!(!status.configured);
    assert!(!status.available);
    assert_eq!(status.daily_usage.requests, 0);
}

// ============================================================================
// Enhance and insights endpoints run the same machine
// ============================================================================

#[tokio::test]
async fn enhance_reports_length_deltas_and_premium_model() {
    let upstream = ScriptedUpstream::succeeding("A polished rewrite of the draft.", 30);
    let gateway = Skald::builder()
        .upstream(upstream)
        .models(catalog())
        .retry(RetryConfig::disabled())
        .build();

    let request = skald::EnhanceRequest {
        bundle: bundle(),
        report_type: "monthly-progress".into(),
        report_content: "draft".into(),
    };
    let response = gateway
        .enhance_report(&caller(), request)
        .await
        .expect("enhance should succeed");

    assert_eq!(response.original_length, 5);
    assert_eq!(
        response.enhanced_length,
        "A polished rewrite of the draft.".len()
    );
    assert!(!response.cached);
}

#[tokio::test]
async fn insights_share_quota_with_other_endpoints() {
    let upstream = ScriptedUpstream::succeeding("insight text", 20);
    let gateway = Skald::builder()
        .upstream(upstream)
        .models(catalog())
        .quota(QuotaConfig::new().global_daily_requests(1))
        .retry(RetryConfig::disabled())
        .build();

    let request = skald::InsightsRequest { bundle: bundle() };
    gateway
        .behavioral_insights(&caller(), request)
        .await
        .expect("first request fits the quota");

    let failure = gateway
        .summarize_report(&caller(), summarize_request())
        .await
        .expect_err("global quota is shared across endpoints");
    assert_eq!(failure.body.code, ErrorKind::DailyLimitReached);
}
