//! Skald - AI narrative gateway for clinical case reporting
//!
//! This crate turns structured case data into prose report sections by
//! calling an external LLM service, while protecting that expensive,
//! rate-limited, occasionally-unavailable upstream behind usage
//! governance, response caching, and a deterministic offline fallback.
//!
//! The caller-facing contract is "you always get usable narrative text":
//! when the upstream is absent, over quota, or erroring, the
//! [`ResilientNarrativeClient`] synthesizes clinically formatted prose
//! locally instead of failing.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use skald::{CaseBundle, CaseNote, ClientKey, ResilientNarrativeClient, Skald, YouthProfile};
//!
//! #[tokio::main]
//! async fn main() {
//!     let gateway = Arc::new(
//!         Skald::builder()
//!             .chat_completions("sk-your-key")
//!             .build(),
//!     );
//!
//!     let client = ResilientNarrativeClient::new(
//!         gateway,
//!         ClientKey::derive("10.1.4.22", "sk-your-key"),
//!     );
//!
//!     let bundle = CaseBundle {
//!         youth: YouthProfile::named("Jordan Reyes"),
//!         notes: vec![CaseNote::new("Participated in group without prompting.")],
//!         ..CaseBundle::default()
//!     };
//!
//!     // Always returns prose, even with no upstream reachable.
//!     let summary = client.summarize(&bundle, "monthly-progress").await;
//!     println!("{summary}");
//! }
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod ledger;
pub mod models;
pub mod telemetry;
pub mod types;
pub mod upstream;

// Re-export main types at crate root
pub use cache::{CacheConfig, ResponseCache};
pub use client::ResilientNarrativeClient;
pub use error::{ErrorClassification, ErrorKind, Result, SkaldError};
pub use gateway::{EndpointResult, EndpointTtls, NarrativeGateway, Skald, SkaldBuilder};
pub use ledger::{Admission, ClientKey, QuotaConfig, UsageLedger};
pub use models::{ModelCatalog, ModelTier};
pub use upstream::{ChatCompletionsClient, GenerationRequest, RetryConfig, TextGenerator};

// Re-export all types
pub use types::{
    BehaviorRating, CacheReport, CaseBundle, CaseNote, EndpointKind, EnhanceRequest,
    EnhanceResponse, ErrorBody, ErrorRecord, GatewayFailure, GenerationResult, InsightsRequest,
    InsightsResponse, ModelsReport, StatusReport, SummarizeRequest, SummarizeResponse,
    UsageReport, UsageSnapshot, YouthProfile,
};
