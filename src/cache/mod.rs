//! Response cache — content-addressed, TTL-and-capacity-bounded.
//!
//! Maps a normalized request fingerprint to a previously generated
//! response. A hit bypasses the upstream call and token accounting
//! entirely; a miss costs nothing beyond the lookup. The cache is
//! best-effort and never blocks correctness — any anomaly is treated as
//! a miss.
//!
//! # Eviction
//!
//! Two mechanisms, both cheap and both lock-local:
//!
//! - **Lazy expiry:** entries carry an absolute deadline; an expired entry
//!   found during `lookup` is deleted and reported absent. No background
//!   sweep runs.
//! - **Capacity pressure:** when an insert would push the map past its
//!   configured maximum, the oldest-*inserted* entry is dropped first.
//!   This is insertion-order eviction, not LRU — a deliberate choice,
//!   preserved from the system this replaces (see DESIGN.md).
//!
//! # Future extensibility: shared/distributed caching
//!
//! The key design (stable digest of endpoint + model + canonical payload)
//! is backend-agnostic. When shared caching is needed across gateway
//! instances, extract `lookup`/`store` into a trait and inject a networked
//! implementation via the builder; no other module needs changes.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::time::Instant;

use crate::telemetry;
use crate::types::GenerationResult;

/// Configuration for the response cache.
///
/// ```rust
/// # use skald::cache::CacheConfig;
/// let config = CacheConfig::new().max_entries(500);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 1,000.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 1_000 }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }
}

struct CacheEntry {
    value: Arc<GenerationResult>,
    expires_at: Instant,
}

struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Fingerprints in insertion order; the front is evicted first.
    order: VecDeque<String>,
}

/// In-memory response cache. See module docs for eviction semantics.
pub struct ResponseCache {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: config.max_entries.max(1),
        }
    }

    /// Look up a cached result by fingerprint.
    ///
    /// Returns `None` on miss. An expired entry is removed and treated as
    /// absent. Emits cache hit/miss metrics under the given endpoint label.
    pub fn lookup(&self, fingerprint: &str, endpoint: &'static str) -> Option<Arc<GenerationResult>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let (hit, expired) = match state.entries.get(fingerprint) {
            Some(entry) if now < entry.expires_at => (Some(Arc::clone(&entry.value)), false),
            Some(_) => (None, true),
            None => (None, false),
        };
        if expired {
            state.entries.remove(fingerprint);
            state.order.retain(|k| k != fingerprint);
        }
        match &hit {
            Some(_) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "endpoint" => endpoint).increment(1)
            }
            None => metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "endpoint" => endpoint)
                .increment(1),
        }
        hit
    }

    /// Insert (or overwrite) a result under `fingerprint`, live for `ttl`.
    ///
    /// Evicts the oldest-inserted entry first when the map would exceed
    /// its capacity. Overwriting an existing fingerprint keeps its
    /// original insertion position.
    pub fn store(&self, fingerprint: &str, value: Arc<GenerationResult>, ttl: Duration) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        if state.entries.insert(fingerprint.to_owned(), entry).is_none() {
            state.order.push_back(fingerprint.to_owned());
            while state.entries.len() > self.capacity {
                match state.order.pop_front() {
                    Some(oldest) => {
                        state.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured maximum entry count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Compute the fingerprint of a request.
///
/// Serializes `(endpoint, model, payload)` canonically and hashes it to a
/// fixed-length hex digest. `serde_json::Value` objects are backed by a
/// sorted map, so two payloads with the same logical content but different
/// field insertion order serialize identically; the value tree is acyclic
/// by construction.
///
/// SHA-256 keeps the digest stable across processes, so the key scheme
/// survives a move to a shared backend unchanged.
pub fn fingerprint(endpoint: &str, model: &str, payload: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(endpoint.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(model.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(payload.to_string().as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
