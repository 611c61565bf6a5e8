//! Public types for the Skald API.

mod bundle;
mod request;
mod response;

pub use bundle::{BehaviorRating, CaseBundle, CaseNote, YouthProfile};
pub use request::{EndpointKind, EnhanceRequest, InsightsRequest, SummarizeRequest};
pub use response::{
    CacheReport, EnhanceResponse, ErrorBody, ErrorRecord, GatewayFailure, GenerationResult,
    InsightsResponse, ModelsReport, StatusReport, SummarizeResponse, UsageReport, UsageSnapshot,
};
