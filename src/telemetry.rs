//! Telemetry metric name constants.
//!
//! Centralised metric names for skald operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `skald_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `endpoint` — gateway operation (e.g. "summarize_report", "status")
//! - `status` — outcome: "ok" or "error"
//! - `scope` — quota scope: "global" or "client"

/// Total requests handled by the gateway.
///
/// Labels: `endpoint`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "skald_requests_total";

/// Upstream call duration in seconds.
///
/// Labels: `endpoint`.
pub const REQUEST_DURATION_SECONDS: &str = "skald_request_duration_seconds";

/// Total retry attempts against the upstream (not counting the initial call).
///
/// Labels: `endpoint`.
pub const RETRIES_TOTAL: &str = "skald_retries_total";

/// Total tokens consumed by real upstream calls.
///
/// Labels: `endpoint`.
pub const TOKENS_TOTAL: &str = "skald_tokens_total";

/// Total response cache hits.
///
/// Labels: `endpoint`.
pub const CACHE_HITS_TOTAL: &str = "skald_cache_hits_total";

/// Total response cache misses.
///
/// Labels: `endpoint`.
pub const CACHE_MISSES_TOTAL: &str = "skald_cache_misses_total";

/// Total admission denials from the usage ledger.
///
/// Labels: `scope` ("global" | "client").
pub const QUOTA_DENIALS_TOTAL: &str = "skald_quota_denials_total";

/// Total locally generated fallback narratives.
///
/// Labels: `endpoint`.
pub const FALLBACKS_TOTAL: &str = "skald_fallbacks_total";
