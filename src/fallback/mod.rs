//! Deterministic fallback narrative generation.
//!
//! The upstream LLM is a convenience, not a dependency the service may
//! block on. This module re-implements, as rule-based text assembly, the
//! structural sections a reviewer expects in a progress report, so every
//! report-producing path still yields clinically usable prose when the
//! upstream is absent, over quota, or erroring.
//!
//! Generation is pure and offline: no network, no randomness, same input
//! and date always yield the same output.
//!
//! # Signal selection
//!
//! Section wording is chosen by scanning the decoded note text against a
//! ranked table of keyword rules — conflict vocabulary selects the
//! "needs improvement" wording, cooperation vocabulary the "making
//! progress" wording, and the absence of either a neutral "developing"
//! wording. The table is ordered; the first matching rule wins, so new
//! rules extend behavior without touching the assembly code.

pub mod notes;

use jiff::civil::Date;

use crate::types::{CaseBundle, EndpointKind};
use notes::NoteContent;

/// Maximum note excerpts woven into the narrative summary.
const MAX_EXCERPTS: usize = 3;

/// Maximum length of a single note excerpt, in characters.
const EXCERPT_CAP: usize = 160;

/// Behavioral signal detected in documentation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Struggling,
    Improving,
    Steady,
}

struct SignalRule {
    terms: &'static [&'static str],
    signal: Signal,
}

/// Ranked rules, first match wins. Conflict indicators outrank
/// cooperation indicators so a mixed week reads cautiously.
const SIGNAL_RULES: &[SignalRule] = &[
    SignalRule {
        terms: &[
            "fight", "argu", "refus", "aggress", "conflict", "defian", "disrespect", "escalat",
            "outburst", "restrain", "threat", "yell",
        ],
        signal: Signal::Struggling,
    },
    SignalRule {
        terms: &[
            "cooperat", "improv", "positive", "respectful", "helpful", "engag", "particip",
            "progress", "calm", "responsib", "encourag",
        ],
        signal: Signal::Improving,
    },
];

fn detect_signal(text: &str) -> Signal {
    let haystack = text.to_lowercase();
    for rule in SIGNAL_RULES {
        if rule.terms.iter().any(|term| haystack.contains(term)) {
            return rule.signal;
        }
    }
    Signal::Steady
}

/// Generate narrative text for an endpoint without calling the upstream.
///
/// `today` is the report date stamped into the output; callers pass the
/// current civil date, tests pass a fixed one.
pub fn generate(kind: EndpointKind, bundle: &CaseBundle, today: Date) -> String {
    let text = match kind {
        EndpointKind::BehavioralInsights => insights_narrative(bundle),
        _ => progress_report(bundle, today),
    };
    strip_markdown(&text)
}

/// First name, for mid-sentence references.
fn first_name(bundle: &CaseBundle) -> &str {
    bundle
        .youth
        .name
        .split_whitespace()
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("the resident")
}

fn decoded_notes(bundle: &CaseBundle) -> Vec<NoteContent> {
    bundle
        .notes
        .iter()
        .map(|note| notes::decode(&note.text))
        .collect()
}

/// Most recent non-empty value of one structured-note section.
fn latest_section<F>(decoded: &[NoteContent], pick: F) -> Option<String>
where
    F: Fn(&notes::StructuredNote) -> Option<&String>,
{
    decoded.iter().find_map(|note| match note {
        NoteContent::Structured(structured) => pick(structured)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        NoteContent::Plain(_) => None,
    })
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= EXCERPT_CAP {
        return trimmed.to_owned();
    }
    let capped: String = trimmed.chars().take(EXCERPT_CAP).collect();
    format!("{}...", capped.trim_end())
}

fn progress_report(bundle: &CaseBundle, today: Date) -> String {
    let name = first_name(bundle);
    let decoded = decoded_notes(bundle);
    let combined: String = decoded
        .iter()
        .map(NoteContent::free_text)
        .collect::<Vec<_>>()
        .join(" ");
    let signal = detect_signal(&combined);

    let mut sections: Vec<String> = Vec::new();

    sections.push(format!(
        "Progress Summary for {}\nPrepared {}",
        bundle.youth.name,
        today.strftime("%B %d, %Y")
    ));
    if let Some(period) = bundle.period.as_deref() {
        sections.push(format!("Reporting period: {period}."));
    }

    sections.push(narrative_summary(bundle, &decoded, signal));

    sections.push(format!(
        "Peer Interactions\n{}",
        latest_section(&decoded, |n| n.peer_interactions.as_ref()).unwrap_or_else(|| {
            match signal {
                Signal::Struggling => format!(
                    "{name} has had difficulty managing peer conflict this period and has needed \
                     staff support to de-escalate disagreements. Continued coaching on peer \
                     boundaries is indicated."
                ),
                Signal::Improving => format!(
                    "{name} is making progress in peer relationships, joining group activities \
                     more readily and resolving everyday disagreements with less staff \
                     involvement."
                ),
                Signal::Steady => format!(
                    "{name} is developing age-appropriate peer relationships. Interactions with \
                     peers have been generally unremarkable this period."
                ),
            }
        })
    ));

    sections.push(format!(
        "Adult Interactions\n{}",
        latest_section(&decoded, |n| n.adult_interactions.as_ref()).unwrap_or_else(|| {
            match signal {
                Signal::Struggling => format!(
                    "{name} has been inconsistent in interactions with staff, at times \
                     responding to adult direction with frustration. Staff continue to model \
                     respectful communication."
                ),
                Signal::Improving => format!(
                    "{name} engages respectfully with staff and has been receptive to adult \
                     guidance and feedback this period."
                ),
                Signal::Steady => format!(
                    "{name} maintains appropriate interactions with adults and responds to \
                     staff direction within expected limits."
                ),
            }
        })
    ));

    sections.push(format!(
        "Program Investment\n{}",
        latest_section(&decoded, |n| n.program_investment.as_ref()).unwrap_or_else(|| {
            match signal {
                Signal::Struggling => format!(
                    "{name}'s investment in programming has been limited this period, with \
                     inconsistent participation in scheduled groups and daily routines."
                ),
                Signal::Improving => format!(
                    "{name} is showing growing investment in the program, participating in \
                     groups and working toward level goals."
                ),
                Signal::Steady => format!(
                    "{name} participates in daily programming at a developing level, meeting \
                     basic expectations with occasional prompting."
                ),
            }
        })
    ));

    sections.push(format!(
        "Response to Authority\n{}",
        latest_section(&decoded, |n| n.authority_response.as_ref()).unwrap_or_else(|| {
            match signal {
                Signal::Struggling => format!(
                    "{name} has struggled to accept limits from authority figures this period \
                     and has required additional structure following redirection."
                ),
                Signal::Improving => format!(
                    "{name} is responding well to authority, accepting redirection and \
                     following program rules with increasing consistency."
                ),
                Signal::Steady => format!(
                    "{name} generally accepts direction from authority figures, with occasional \
                     reminders about program expectations."
                ),
            }
        })
    ));

    sections.push(format!(
        "Strengths\n{}",
        match bundle.youth.strengths.as_deref().map(str::trim) {
            Some(strengths) if !strengths.is_empty() => format!(
                "Identified strengths include {strengths}. Staff incorporate these strengths \
                 into daily programming."
            ),
            _ => format!(
                "{name} demonstrates resilience in adjusting to the structure of the program. \
                 A fuller strengths inventory is being developed with the treatment team."
            ),
        }
    ));

    sections.push(format!(
        "Areas for Growth\n{}",
        match bundle.youth.areas_of_growth.as_deref().map(str::trim) {
            Some(areas) if !areas.is_empty() =>
                format!("Current treatment focus areas include {areas}."),
            _ => match signal {
                Signal::Struggling => format!(
                    "Primary growth areas for {name} include emotional regulation and accepting \
                     staff feedback during conflict."
                ),
                _ => format!(
                    "Treatment goals for {name} continue to focus on consistent daily structure, \
                     healthy peer relationships, and self-advocacy skills."
                ),
            },
        }
    ));

    sections.join("\n\n")
}

fn narrative_summary(bundle: &CaseBundle, decoded: &[NoteContent], signal: Signal) -> String {
    let name = first_name(bundle);
    let mut paragraph = latest_section(decoded, |n| n.summary.as_ref()).unwrap_or_else(|| {
        match signal {
            Signal::Struggling => format!(
                "{name} has had a challenging period with documented conflicts, and the \
                 treatment team is focusing on de-escalation and coping strategies."
            ),
            Signal::Improving => format!(
                "{name} is making measurable progress this period, engaging with programming \
                 and demonstrating more consistent positive behavior."
            ),
            Signal::Steady => format!(
                "{name} is developing steadily within the program this period, with no major \
                 behavioral concerns documented."
            ),
        }
    });

    if let Some(diagnosis) = bundle.youth.diagnosis.as_deref().map(str::trim)
        && !diagnosis.is_empty()
    {
        paragraph.push_str(&format!(
            " Programming remains informed by {name}'s working diagnosis of {diagnosis}."
        ));
    }

    let excerpts: Vec<String> = bundle
        .notes
        .iter()
        .take(MAX_EXCERPTS)
        .map(|note| excerpt(&notes::decode(&note.text).free_text()))
        .filter(|e| !e.is_empty())
        .collect();

    if excerpts.is_empty() {
        paragraph.push_str(
            " Documentation for this period is ongoing and will be incorporated into future \
             reports as it is completed.",
        );
    } else {
        paragraph.push_str(&format!(
            " Recent documentation notes: {}",
            excerpts.join(" | ")
        ));
    }

    format!("Narrative Summary\n{paragraph}")
}

fn insights_narrative(bundle: &CaseBundle) -> String {
    let name = first_name(bundle);
    let decoded = decoded_notes(bundle);
    let combined: String = decoded
        .iter()
        .map(NoteContent::free_text)
        .collect::<Vec<_>>()
        .join(" ");
    let signal = detect_signal(&combined);

    let mut paragraphs: Vec<String> = Vec::new();

    paragraphs.push(format!("Behavioral Insights for {}", bundle.youth.name));

    if bundle.ratings.is_empty() {
        paragraphs.push(format!(
            "Behavior-point data for {name} is not yet available for this period; observations \
             below are drawn from case documentation."
        ));
    } else {
        let mut ratings = bundle.ratings.clone();
        ratings.sort_by(|a, b| {
            b.average
                .partial_cmp(&a.average)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        // sort is descending; first is strongest, last is weakest
        if let Some(strongest) = ratings.first() {
            paragraphs.push(format!(
                "Strongest area: {} with an average rating of {:.1} out of {:.0}.",
                strongest.category, strongest.average, strongest.scale
            ));
        }
        if ratings.len() > 1
            && let Some(weakest) = ratings.last()
        {
            paragraphs.push(format!(
                "Greatest opportunity for growth: {} with an average rating of {:.1} out of \
                 {:.0}. Staff should reinforce expectations in this area during daily check-ins.",
                weakest.category, weakest.average, weakest.scale
            ));
        }
    }

    paragraphs.push(match signal {
        Signal::Struggling => format!(
            "Documentation from this period indicates {name} needs improvement in conflict \
             management. Recommended focus: proactive de-escalation support and consistent, \
             predictable consequences."
        ),
        Signal::Improving => format!(
            "Documentation from this period indicates {name} is making progress. Recommended \
             focus: reinforce the current routine and expand opportunities for positive peer \
             leadership."
        ),
        Signal::Steady => format!(
            "Documentation from this period shows {name} developing at a steady baseline. \
             Recommended focus: maintain current programming and continue regular observation."
        ),
    });

    paragraphs.join("\n\n")
}

/// Strip markdown formatting characters so output is plain prose.
///
/// Applied to both fallback text and upstream text, so callers see one
/// uniform format regardless of which path produced the narrative.
pub fn strip_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let stripped = line.trim_start_matches(['#', '>']);
        let stripped = if stripped.len() != line.len() {
            stripped.trim_start()
        } else {
            stripped
        };
        let cleaned: String = stripped
            .chars()
            .filter(|c| !matches!(c, '*' | '`'))
            .collect();
        out.push_str(cleaned.replace("__", "").trim_end());
        out.push('\n');
    }
    let trimmed = out.trim_end_matches('\n');
    trimmed.to_owned()
}
