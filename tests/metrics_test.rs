//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use skald::telemetry;
use skald::upstream::{GenerationRequest, RetryConfig, TextGenerator};
use skald::{
    ClientKey, GenerationResult, ModelCatalog, QuotaConfig, Result, Skald, SummarizeRequest,
    YouthProfile,
};

// ============================================================================
// Mock upstream
// ============================================================================

struct StaticUpstream;

#[async_trait]
impl TextGenerator for StaticUpstream {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationResult> {
        Ok(GenerationResult {
            text: "narrative".into(),
            structured: None,
            tokens_used: 42,
        })
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

fn caller() -> ClientKey {
    ClientKey::derive("10.0.0.1", "sk-caller-credential")
}

fn request() -> SummarizeRequest {
    SummarizeRequest {
        bundle: skald::CaseBundle {
            youth: YouthProfile::named("Jordan Reyes"),
            ..skald::CaseBundle::default()
        },
        report_type: "monthly-progress".into(),
        data: None,
    }
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn successful_request_records_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let gateway = Skald::builder()
                    .upstream(Arc::new(StaticUpstream))
                    .models(ModelCatalog::new("test-standard", None))
                    .retry(RetryConfig::disabled())
                    .build();
                gateway.summarize_report(&caller(), request()).await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::TOKENS_TOTAL), 42);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert!(
        has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn quota_denial_records_denial_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let _result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let gateway = Skald::builder()
                    .upstream(Arc::new(StaticUpstream))
                    .models(ModelCatalog::new("test-standard", None))
                    .quota(QuotaConfig::new().global_daily_requests(0))
                    .retry(RetryConfig::disabled())
                    .build();
                gateway.summarize_report(&caller(), request()).await
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::QUOTA_DENIALS_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::TOKENS_TOTAL), 0);
    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn cache_hit_records_hit_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let gateway = Skald::builder()
                    .upstream(Arc::new(StaticUpstream))
                    .models(ModelCatalog::new("test-standard", None))
                    .retry(RetryConfig::disabled())
                    .build();
                gateway
                    .summarize_report(&caller(), request())
                    .await
                    .unwrap();
                gateway
                    .summarize_report(&caller(), request())
                    .await
                    .unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    // tokens were charged exactly once despite two successful requests
    assert_eq!(counter_total(&snapshot, telemetry::TOKENS_TOTAL), 42);
}
