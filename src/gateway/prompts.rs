//! Prompt construction per endpoint.
//!
//! Endpoints share one state machine and differ only here: what the
//! upstream model is told, and with which case data inlined.

use crate::types::{CaseBundle, EnhanceRequest, InsightsRequest, SummarizeRequest};

const CLINICAL_VOICE: &str = "You are a clinical documentation assistant for a youth residential \
treatment facility. Write in a professional, objective, strengths-based voice. Use plain prose \
with no markdown formatting. Never invent events that are not present in the provided data.";

fn describe_bundle(bundle: &CaseBundle) -> String {
    let mut lines = vec![format!("Youth: {}", bundle.youth.name)];
    if let Some(program) = bundle.youth.program.as_deref() {
        lines.push(format!("Program: {program}"));
    }
    if let Some(diagnosis) = bundle.youth.diagnosis.as_deref() {
        lines.push(format!("Diagnosis: {diagnosis}"));
    }
    if let Some(strengths) = bundle.youth.strengths.as_deref() {
        lines.push(format!("Strengths: {strengths}"));
    }
    if let Some(areas) = bundle.youth.areas_of_growth.as_deref() {
        lines.push(format!("Areas of growth: {areas}"));
    }
    if let Some(period) = bundle.period.as_deref() {
        lines.push(format!("Reporting period: {period}"));
    }
    if !bundle.ratings.is_empty() {
        lines.push("Behavior ratings (category: average/scale):".to_owned());
        for rating in &bundle.ratings {
            lines.push(format!(
                "- {}: {:.1}/{:.0}",
                rating.category, rating.average, rating.scale
            ));
        }
    }
    if !bundle.notes.is_empty() {
        lines.push("Recent case notes, newest first:".to_owned());
        for note in &bundle.notes {
            match note.date.as_deref() {
                Some(date) => lines.push(format!("- [{date}] {}", note.text)),
                None => lines.push(format!("- {}", note.text)),
            }
        }
    }
    lines.join("\n")
}

/// System and user prompt for report summarization.
pub fn summarize(request: &SummarizeRequest) -> (String, String) {
    let mut user = format!(
        "Write the narrative section of a {} report from the following case data. Cover: overall \
         summary, peer interactions, adult interactions, program investment, response to \
         authority, strengths, and areas for growth.\n\n{}",
        request.report_type,
        describe_bundle(&request.bundle)
    );
    if let Some(data) = &request.data {
        user.push_str(&format!("\n\nAdditional report data:\n{data}"));
    }
    (CLINICAL_VOICE.to_owned(), user)
}

/// System and user prompt for behavioral insights.
pub fn insights(request: &InsightsRequest) -> (String, String) {
    let user = format!(
        "Analyze the following behavior-point data and case notes. Respond with a JSON object \
         containing \"insights\" (plain-prose analysis), \"strongest_area\", \
         \"growth_area\", and \"recommendations\" (array of short strings).\n\n{}",
        describe_bundle(&request.bundle)
    );
    (CLINICAL_VOICE.to_owned(), user)
}

/// System and user prompt for report enhancement.
pub fn enhance(request: &EnhanceRequest) -> (String, String) {
    let user = format!(
        "Rewrite the following {} report draft into polished clinical prose. Preserve every \
         factual statement; improve structure, tone, and clarity. Return only the rewritten \
         report.\n\nCase context:\n{}\n\nDraft:\n{}",
        request.report_type,
        describe_bundle(&request.bundle),
        request.report_content
    );
    (CLINICAL_VOICE.to_owned(), user)
}
