//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use super::NarrativeGateway;
use crate::cache::{CacheConfig, ResponseCache};
use crate::ledger::{QuotaConfig, UsageLedger};
use crate::models::ModelCatalog;
use crate::upstream::{ChatCompletionsClient, RetryConfig, TextGenerator};

/// Per-endpoint cache freshness windows.
///
/// Summaries regenerate often as notes land; enhancement output is far
/// more stable, so it keeps a longer window.
#[derive(Debug, Clone)]
pub struct EndpointTtls {
    pub summarize: Duration,
    pub insights: Duration,
    pub enhance: Duration,
}

impl Default for EndpointTtls {
    fn default() -> Self {
        Self {
            summarize: Duration::from_secs(5 * 60),
            insights: Duration::from_secs(10 * 60),
            enhance: Duration::from_secs(30 * 60),
        }
    }
}

/// Main entry point for creating gateway instances.
pub struct Skald;

impl Skald {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> SkaldBuilder {
        SkaldBuilder::new()
    }
}

/// Builder for configuring gateway instances.
///
/// A gateway built without an upstream runs in degraded mode: every
/// generating endpoint returns a 503 `service_unavailable` failure with
/// `fallback: true`, and callers synthesize narratives locally.
pub struct SkaldBuilder {
    upstream: Option<Arc<dyn TextGenerator>>,
    quota: QuotaConfig,
    cache: CacheConfig,
    models: Option<ModelCatalog>,
    retry: RetryConfig,
    ttls: EndpointTtls,
}

impl SkaldBuilder {
    pub fn new() -> Self {
        Self {
            upstream: None,
            quota: QuotaConfig::default(),
            cache: CacheConfig::default(),
            models: None,
            retry: RetryConfig::default(),
            ttls: EndpointTtls::default(),
        }
    }

    /// Configure an OpenAI-compatible chat-completions upstream.
    pub fn chat_completions(self, api_key: impl Into<String>) -> Self {
        self.upstream(Arc::new(ChatCompletionsClient::new(api_key)))
    }

    /// Configure a chat-completions upstream at a custom base URL.
    pub fn chat_completions_at(
        self,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        self.upstream(Arc::new(ChatCompletionsClient::with_base_url(
            api_key, base_url,
        )))
    }

    /// Configure any upstream generator implementation.
    pub fn upstream(mut self, upstream: Arc<dyn TextGenerator>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Set daily quota ceilings.
    pub fn quota(mut self, quota: QuotaConfig) -> Self {
        self.quota = quota;
        self
    }

    /// Set response cache bounds.
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set the tier-to-model catalog explicitly. Without this, the
    /// catalog is read from the environment.
    pub fn models(mut self, models: ModelCatalog) -> Self {
        self.models = Some(models);
        self
    }

    /// Set retry behaviour for transient upstream errors.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set per-endpoint cache freshness windows.
    pub fn ttls(mut self, ttls: EndpointTtls) -> Self {
        self.ttls = ttls;
        self
    }

    /// Build the gateway.
    pub fn build(self) -> NarrativeGateway {
        NarrativeGateway::new(
            self.upstream,
            UsageLedger::new(self.quota),
            ResponseCache::new(&self.cache),
            self.models.unwrap_or_else(ModelCatalog::from_env),
            self.retry,
            self.ttls,
        )
    }
}

impl Default for SkaldBuilder {
    fn default() -> Self {
        Self::new()
    }
}
