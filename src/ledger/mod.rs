//! Usage ledger — daily request/token accounting and admission control.
//!
//! Tracks consumption at two scopes, whole-service and per-caller, against
//! a calendar day. Counters live in process memory only: they reset lazily
//! when first touched on a new day and are discarded on shutdown. For
//! horizontal scale-out, put an externally shared implementation behind the
//! same `admit`/`record_tokens` surface instead of replicating this one.
//!
//! Admission is a single synchronous check-and-increment under one lock,
//! with no await inside. Two concurrent requests racing for the last slot
//! therefore cannot both be admitted.

use std::collections::HashMap;
use std::sync::Mutex;

use jiff::Zoned;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::telemetry;
use crate::types::UsageSnapshot;

/// Daily request and token ceilings. Read-only after gateway construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub global_daily_requests: u64,
    pub global_daily_tokens: u64,
    pub per_client_daily_requests: u64,
    pub per_client_daily_tokens: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            global_daily_requests: 1_000,
            global_daily_tokens: 1_000_000,
            per_client_daily_requests: 100,
            per_client_daily_tokens: 150_000,
        }
    }
}

impl QuotaConfig {
    /// Create a config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the whole-service daily request ceiling.
    pub fn global_daily_requests(mut self, n: u64) -> Self {
        self.global_daily_requests = n;
        self
    }

    /// Set the whole-service daily token ceiling.
    pub fn global_daily_tokens(mut self, n: u64) -> Self {
        self.global_daily_tokens = n;
        self
    }

    /// Set the per-caller daily request ceiling.
    pub fn per_client_daily_requests(mut self, n: u64) -> Self {
        self.per_client_daily_requests = n;
        self
    }

    /// Set the per-caller daily token ceiling.
    pub fn per_client_daily_tokens(mut self, n: u64) -> Self {
        self.per_client_daily_tokens = n;
        self
    }
}

/// Stable, non-reversible caller identifier.
///
/// Derived by hashing the caller's network origin together with a trailing
/// slice of its credential, so different credentials from one origin, or
/// one credential used from different origins, separate into distinct keys
/// without the ledger ever holding the credential itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientKey(String);

impl ClientKey {
    /// Derive a key from a caller's origin and credential.
    pub fn derive(origin: &str, credential: &str) -> Self {
        let credential = credential.as_bytes();
        let tail_start = credential.len().saturating_sub(8);
        let mut hasher = Sha256::new();
        hasher.update(origin.as_bytes());
        hasher.update(b":");
        hasher.update(&credential[tail_start..]);
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(16);
        for byte in &digest[..8] {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Granted,
    /// The whole-service daily ceiling is exhausted.
    DeniedGlobal,
    /// This caller's daily ceiling is exhausted.
    DeniedClient,
}

impl Admission {
    pub fn is_granted(&self) -> bool {
        matches!(self, Admission::Granted)
    }
}

/// Request/token consumption for one scope on one calendar day.
#[derive(Debug, Clone, Copy)]
struct UsageCounter {
    day: Date,
    requests: u64,
    tokens: u64,
}

impl UsageCounter {
    fn zeroed(day: Date) -> Self {
        Self {
            day,
            requests: 0,
            tokens: 0,
        }
    }

    /// Replace a stale-day counter with a fresh zeroed one.
    fn normalize(&mut self, day: Date) {
        if self.day != day {
            *self = Self::zeroed(day);
        }
    }
}

struct LedgerState {
    global: UsageCounter,
    clients: HashMap<ClientKey, UsageCounter>,
}

/// In-memory usage ledger. See module docs for scope and lifetime.
pub struct UsageLedger {
    quota: QuotaConfig,
    state: Mutex<LedgerState>,
}

impl UsageLedger {
    pub fn new(quota: QuotaConfig) -> Self {
        Self {
            quota,
            state: Mutex::new(LedgerState {
                global: UsageCounter::zeroed(today()),
                clients: HashMap::new(),
            }),
        }
    }

    pub fn quota(&self) -> &QuotaConfig {
        &self.quota
    }

    /// Check quotas for `client` and, if admitted, charge one request unit
    /// to both scopes. Never fails; denial is a normal return value.
    pub fn admit(&self, client: &ClientKey) -> Admission {
        self.admit_on(today(), client)
    }

    /// Admission against an explicit day. Exposed so rollover behavior is
    /// testable without controlling the wall clock.
    pub fn admit_on(&self, day: Date, client: &ClientKey) -> Admission {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.global.normalize(day);
        let counter = state
            .clients
            .entry(client.clone())
            .or_insert_with(|| UsageCounter::zeroed(day));
        counter.normalize(day);
        let (client_requests, client_tokens) = (counter.requests, counter.tokens);

        if state.global.requests >= self.quota.global_daily_requests
            || state.global.tokens >= self.quota.global_daily_tokens
        {
            metrics::counter!(telemetry::QUOTA_DENIALS_TOTAL, "scope" => "global").increment(1);
            return Admission::DeniedGlobal;
        }

        if client_requests >= self.quota.per_client_daily_requests
            || client_tokens >= self.quota.per_client_daily_tokens
        {
            metrics::counter!(telemetry::QUOTA_DENIALS_TOTAL, "scope" => "client").increment(1);
            return Admission::DeniedClient;
        }

        state.global.requests += 1;
        if let Some(counter) = state.clients.get_mut(client) {
            counter.requests += 1;
        }
        Admission::Granted
    }

    /// Charge `tokens` to both scopes.
    ///
    /// Called only after a real upstream call completes; cache hits and
    /// fallbacks contribute zero tokens.
    pub fn record_tokens(&self, client: &ClientKey, tokens: u64) {
        self.record_tokens_on(today(), client, tokens);
    }

    /// Token accounting against an explicit day, for tests.
    pub fn record_tokens_on(&self, day: Date, client: &ClientKey, tokens: u64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.global.normalize(day);
        state.global.tokens += tokens;
        let counter = state
            .clients
            .entry(client.clone())
            .or_insert_with(|| UsageCounter::zeroed(day));
        counter.normalize(day);
        counter.tokens += tokens;
    }

    /// Current-day service-wide usage, for the status endpoint.
    pub fn snapshot(&self) -> UsageSnapshot {
        self.snapshot_on(today())
    }

    /// Snapshot against an explicit day, for tests.
    pub fn snapshot_on(&self, day: Date) -> UsageSnapshot {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.global.normalize(day);
        UsageSnapshot {
            day: state.global.day.to_string(),
            requests: state.global.requests,
            tokens: state.global.tokens,
            clients: state.clients.len(),
        }
    }

    /// This caller's current-day `(requests, tokens)` consumption.
    pub fn client_usage_on(&self, day: Date, client: &ClientKey) -> (u64, u64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state.clients.get_mut(client) {
            Some(counter) => {
                counter.normalize(day);
                (counter.requests, counter.tokens)
            }
            None => (0, 0),
        }
    }
}

fn today() -> Date {
    Zoned::now().date()
}
