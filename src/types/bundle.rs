//! Case bundle types handed to the gateway by the record layer.
//!
//! The record layer (out of scope for this crate) assembles a youth's
//! attributes plus their recent case notes and behavior ratings into a
//! [`CaseBundle`]. The gateway makes no assumption about how the bundle
//! was persisted or queried; it only reads from it.

use serde::{Deserialize, Serialize};

/// Youth attributes relevant to narrative generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YouthProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strengths: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub areas_of_growth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
}

impl YouthProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One case note as stored by the record layer.
///
/// `text` may hold plain prose or one of two historical JSON encodings;
/// decoding happens in the fallback generator's note module, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub text: String,
}

impl CaseNote {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            date: None,
            text: text.into(),
        }
    }
}

/// Averaged behavior-point rating for one category over the report period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorRating {
    pub category: String,
    pub average: f64,
    /// Scale maximum the average was computed against.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    5.0
}

/// Youth attributes plus recent notes and ratings.
///
/// Notes are expected newest-first; the fallback generator excerpts from
/// the front of the list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseBundle {
    pub youth: YouthProfile,
    #[serde(default)]
    pub notes: Vec<CaseNote>,
    #[serde(default)]
    pub ratings: Vec<BehaviorRating>,
    /// Human-readable report period, e.g. "June 2026".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}
