//! Case-note decoding.
//!
//! Case notes arrive as free text that may carry one of two historical
//! JSON encodings: the current shape, a flat object with per-section
//! fields, and the legacy shape, the same object wrapped in a `formData`
//! envelope by an older form component. Anything that parses as neither
//! is kept verbatim as plain prose.
//!
//! Decoding happens once, here, into a tagged [`NoteContent`]; the
//! generator never re-parses ambiguous JSON downstream.

use serde::Deserialize;

/// A case note, decoded.
#[derive(Debug, Clone)]
pub enum NoteContent {
    Structured(StructuredNote),
    Plain(String),
}

impl NoteContent {
    /// All free text carried by the note, for keyword scanning.
    pub fn free_text(&self) -> String {
        match self {
            NoteContent::Plain(text) => text.clone(),
            NoteContent::Structured(note) => note.free_text(),
        }
    }
}

/// Per-section fields of a structured case note.
///
/// Field aliases cover both the camelCase wire names written by the form
/// layer and the snake_case names of later exports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredNote {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, alias = "peerInteractions")]
    pub peer_interactions: Option<String>,
    #[serde(default, alias = "adultInteractions")]
    pub adult_interactions: Option<String>,
    #[serde(default, alias = "programInvestment")]
    pub program_investment: Option<String>,
    #[serde(default, alias = "authorityResponse")]
    pub authority_response: Option<String>,
}

impl StructuredNote {
    /// Whether any section carries text.
    fn has_content(&self) -> bool {
        [
            &self.summary,
            &self.peer_interactions,
            &self.adult_interactions,
            &self.program_investment,
            &self.authority_response,
        ]
        .into_iter()
        .any(|field| field.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    fn free_text(&self) -> String {
        [
            &self.summary,
            &self.peer_interactions,
            &self.adult_interactions,
            &self.program_investment,
            &self.authority_response,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Legacy envelope written by the old form component.
#[derive(Deserialize)]
struct LegacyEnvelope {
    #[serde(rename = "formData")]
    form_data: StructuredNote,
}

/// Decode one raw note body.
///
/// Tries the current flat shape, then the legacy `formData` envelope;
/// anything else is plain text as-is. Never fails.
pub fn decode(raw: &str) -> NoteContent {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        if let Ok(envelope) = serde_json::from_str::<LegacyEnvelope>(trimmed)
            && envelope.form_data.has_content()
        {
            return NoteContent::Structured(envelope.form_data);
        }
        if let Ok(note) = serde_json::from_str::<StructuredNote>(trimmed)
            && note.has_content()
        {
            return NoteContent::Structured(note);
        }
    }
    NoteContent::Plain(raw.to_owned())
}
