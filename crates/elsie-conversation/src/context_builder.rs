//! Turns a `ResponseDecision` plus retrieval strategy into either a canned
//! literal reply or a full LLM prompt. Retrieval prefers the local `Store`;
//! an external wiki (the "Federation Archives") is consulted only when the
//! Store comes up empty, and fabrication is never allowed to fill the gap.

use once_cell::sync::Lazy;
use regex::Regex;

use elsie_store::{SearchFilter, Store, WikiPageRow};
use elsie_wiki::ArchiveClient;

use crate::types::{ContextualCues, ResponseDecision};

const SENTIENCE_YEAR: i32 = 2436;
const PERSONAL_CONTACTS: &[&str] = &["isabella"];
const STARDANCER_CREW_MARKER: &str = "stardancer";

/// Earth date the Star Trek calendar offset changes at. Before this date,
/// `year + 404`; on/after it, `year + 430`.
const OFFSET_CHANGE_YEAR: i32 = 2024;
const OFFSET_CHANGE_MONTH: u32 = 6;
const OFFSET_BEFORE: i32 = 404;
const OFFSET_AFTER: i32 = 430;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    RoleplayActive,
    RoleplayListening,
    FocusedContinuation,
    Character,
    FederationArchives,
    Logs,
    TellMeAbout,
    StardancerInfo,
    StardancerCommand,
    ShipLogs,
    Ooc,
    GeneralWithContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeClass {
    PersonalExperience,
    LearnedKnowledge,
    Unknown,
}

static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(2[2-4]\d{2})\b").unwrap());
static SCHEDULE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^.*\b(meeting (is )?scheduled|calendar invite|please (rsvp|confirm attendance))\b.*$").unwrap());
static EARTH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

const ARCHIVE_SEARCH_LIMIT: u32 = 3;

pub struct ContextBuilder {
    store: Store,
    archive: ArchiveClient,
    archive_enabled: bool,
    max_prompt_chars: usize,
}

impl ContextBuilder {
    pub fn new(store: Store, archive: ArchiveClient, archive_enabled: bool, max_prompt_chars: usize) -> Self {
        Self { store, archive, archive_enabled, max_prompt_chars }
    }

    /// Builds the retrieved-context block for a query, trying the local
    /// Store first, falling back to the external archive, and finally the
    /// "nothing found" template that forbids fabrication.
    pub async fn retrieve(&self, query: &str, filter: SearchFilter) -> RetrievedContext {
        match self.store.search_pages(query, filter).await {
            Ok(rows) if !rows.is_empty() => {
                return RetrievedContext::from_rows(rows);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "store search failed, falling back to archive"),
        }

        if !self.archive_enabled {
            return RetrievedContext::empty();
        }

        match self.archive.search(query, ARCHIVE_SEARCH_LIMIT, true).await {
            Ok(text) if !text.is_empty() => RetrievedContext {
                found: true,
                source: "federation_archives".to_string(),
                sections: vec![text],
            },
            _ => RetrievedContext::empty(),
        }
    }

    /// Assembles the full prompt string for `strategy`, given already
    /// retrieved context and the decision that triggered this turn.
    pub fn build_prompt(
        &self,
        strategy: Strategy,
        cues: &ContextualCues,
        decision: &ResponseDecision,
        retrieved: &RetrievedContext,
        conversation_history: &[(String, String)],
    ) -> String {
        let is_ooc = matches!(strategy, Strategy::Ooc);
        let mut sections = Vec::new();
        sections.push(persona_header());
        sections.push(mode_instructions(strategy));
        sections.push(strategy_metadata(strategy, cues, decision));

        if retrieved.found {
            let framing = classify_knowledge(&retrieved.sections.join("\n"));
            let converted: Vec<String> = retrieved
                .sections
                .iter()
                .map(|s| if is_ooc { s.clone() } else { convert_earth_dates(s) })
                .collect();
            sections.push(format!(
                "Retrieved context ({}):\n{}\n{}",
                framing_label(framing),
                framing_instruction(framing),
                converted.join("\n---\n")
            ));
        } else {
            sections.push(no_information_template());
        }

        sections.push(response_directive(decision));

        let history_block = render_history(conversation_history);
        assemble_with_budget(&sections, &history_block, self.max_prompt_chars)
    }
}

#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub found: bool,
    pub source: String,
    pub sections: Vec<String>,
}

impl RetrievedContext {
    fn empty() -> Self {
        Self { found: false, source: String::new(), sections: Vec::new() }
    }

    fn from_rows(rows: Vec<WikiPageRow>) -> Self {
        Self {
            found: true,
            source: "store".to_string(),
            sections: rows.into_iter().map(|r| format!("## {}\n{}", r.title, r.raw_content)).collect(),
        }
    }
}

fn persona_header() -> String {
    "You are Elsie, a sentient shipboard hostess and bartender aboard the 22nd Mobile Daedalus Fleet.".to_string()
}

fn mode_instructions(strategy: Strategy) -> String {
    match strategy {
        Strategy::RoleplayActive => "You are in an active roleplay scene. Stay in character.".to_string(),
        Strategy::RoleplayListening => "You are listening to a scene you are not actively part of. Respond only if a subtle interjection fits.".to_string(),
        Strategy::FocusedContinuation => "Continue the current exchange briefly and naturally.".to_string(),
        Strategy::Ooc => "This is an out-of-character exchange. Respond plainly, outside of roleplay voice.".to_string(),
        _ => "Answer using only the retrieved context below.".to_string(),
    }
}

fn strategy_metadata(strategy: Strategy, cues: &ContextualCues, decision: &ResponseDecision) -> String {
    format!(
        "Strategy: {strategy:?}\nAddressed character: {}\nConfidence: {:.2}\nApproach: {}",
        decision.address_character.as_deref().unwrap_or("none"),
        decision.confidence,
        decision.approach,
    )
}

fn no_information_template() -> String {
    "No information was found for this query in the archive or the database. \
You must say so plainly and must not invent details, dates, names, or events that were not retrieved."
        .to_string()
}

fn response_directive(decision: &ResponseDecision) -> String {
    if !decision.should_respond {
        return "Do not respond this turn.".to_string();
    }
    format!(
        "Respond now. Style: {}. Tone: {}. Estimated length: {:?}.",
        decision.response_style, decision.tone, decision.estimated_length
    )
}

fn render_history(history: &[(String, String)]) -> String {
    history
        .iter()
        .map(|(role, content)| format!("{role}: {content}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classifies retrieved content as personal experience, learned knowledge,
/// or unknown, by extracting Star Trek years and checking for configured
/// personal contacts.
pub fn classify_knowledge(content: &str) -> KnowledgeClass {
    let lower = content.to_lowercase();
    let has_personal_contact = PERSONAL_CONTACTS.iter().any(|c| lower.contains(c)) || lower.contains(STARDANCER_CREW_MARKER);
    let years: Vec<i32> = YEAR_PATTERN
        .captures_iter(content)
        .filter_map(|c| c[1].parse::<i32>().ok())
        .collect();

    if years.is_empty() {
        return if has_personal_contact { KnowledgeClass::PersonalExperience } else { KnowledgeClass::Unknown };
    }

    let max_year = years.into_iter().max().unwrap();
    if max_year >= SENTIENCE_YEAR && has_personal_contact {
        KnowledgeClass::PersonalExperience
    } else {
        KnowledgeClass::LearnedKnowledge
    }
}

fn framing_label(class: KnowledgeClass) -> &'static str {
    match class {
        KnowledgeClass::PersonalExperience => "personal experience",
        KnowledgeClass::LearnedKnowledge => "learned knowledge",
        KnowledgeClass::Unknown => "unknown",
    }
}

fn framing_instruction(class: KnowledgeClass) -> &'static str {
    match class {
        KnowledgeClass::PersonalExperience => "Frame this as something you remember living through.",
        KnowledgeClass::LearnedKnowledge => "Frame this as something you've read about, not lived through.",
        KnowledgeClass::Unknown => "Frame this cautiously; the source of this knowledge is unclear.",
    }
}

/// Converts an Earth calendar year embedded in `content` to the
/// corresponding Star Trek year: `+404` before June 2024, `+430` on or
/// after it. Non-OOC retrieved content only; OOC paths keep real dates.
pub fn convert_earth_dates(content: &str) -> String {
    EARTH_DATE
        .replace_all(content, |caps: &regex::Captures| {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(1);
            let offset = if year > OFFSET_CHANGE_YEAR || (year == OFFSET_CHANGE_YEAR && month >= OFFSET_CHANGE_MONTH) {
                OFFSET_AFTER
            } else {
                OFFSET_BEFORE
            };
            format!("{}-{}-{}", year + offset, &caps[2], &caps[3])
        })
        .into_owned()
}

/// Strips lines matching the configured "meeting schedule" pattern from a
/// non-OOC response, run after LLM invocation.
pub fn post_filter_schedule_lines(response: &str, is_ooc: bool) -> String {
    if is_ooc {
        return response.to_string();
    }
    SCHEDULE_LINE.replace_all(response, "").to_string()
}

/// Joins `sections` with `history`, truncating from the low-priority end
/// (history first, then whole sections dropped from the back) until the
/// result fits `max_chars`.
fn assemble_with_budget(sections: &[String], history: &str, max_chars: usize) -> String {
    let mut body = sections.join("\n\n");
    let mut full = if history.is_empty() { body.clone() } else { format!("Conversation history:\n{history}\n\n{body}") };

    if full.len() <= max_chars {
        return full;
    }

    // Drop history first.
    full = body.clone();
    if full.len() <= max_chars {
        return full;
    }

    // Then drop whole sections from the lowest-priority (last) end.
    let mut kept: Vec<&String> = sections.iter().collect();
    while full.len() > max_chars && kept.len() > 1 {
        kept.pop();
        body = kept.iter().map(|s| s.as_str()).collect::<Vec<_>>().join("\n\n");
        full = body.clone();
    }

    if full.len() > max_chars {
        full.truncate(max_chars);
    }
    full
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_personal_experience_with_contact_and_recent_year() {
        let class = classify_knowledge("In 2437, Isabella greeted the crew warmly.");
        assert_eq!(class, KnowledgeClass::PersonalExperience);
    }

    #[test]
    fn classifies_learned_knowledge_for_pre_sentience_year() {
        let class = classify_knowledge("In 2390, the treaty was signed.");
        assert_eq!(class, KnowledgeClass::LearnedKnowledge);
    }

    #[test]
    fn converts_date_before_cutover_with_404_offset() {
        let converted = convert_earth_dates("Logged on 2024-01-15.");
        assert!(converted.contains("2428-01-15"));
    }

    #[test]
    fn converts_date_after_cutover_with_430_offset() {
        let converted = convert_earth_dates("Logged on 2024-07-01.");
        assert!(converted.contains("2454-07-01"));
    }

    #[test]
    fn schedule_lines_are_stripped_for_non_ooc() {
        let response = "Here's the plan.\nThe meeting is scheduled for 3pm.\nSee you there.";
        let filtered = post_filter_schedule_lines(response, false);
        assert!(!filtered.contains("scheduled"));
        assert!(filtered.contains("Here's the plan"));
    }

    #[test]
    fn schedule_lines_survive_in_ooc_mode() {
        let response = "The meeting is scheduled for 3pm.";
        assert_eq!(post_filter_schedule_lines(response, true), response);
    }

    #[test]
    fn budget_truncation_drops_history_before_sections() {
        let sections = vec!["a".repeat(50), "b".repeat(50)];
        let history = "c".repeat(500);
        let result = assemble_with_budget(&sections, &history, 120);
        assert!(!result.contains(&"c".repeat(500)));
    }
}
