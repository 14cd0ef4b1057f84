//! Decides whether Elsie should respond to a turn and, if so, how. Runs
//! emotional analysis and addressing analysis over `ContextualCues`, then
//! walks a fixed priority cascade down to a single `ResponseDecision`,
//! falling back to a weighted-score comparison only where the cascade
//! itself has a genuine conflict to resolve.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::session::SessionState;
use crate::types::{
    AddressingContext, ContextualCues, EstimatedLength, IntimacyLevel, Relationship,
    ResponseDecision, ResponseType, SceneImpact, Urgency,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmotionalTone {
    Happy,
    Sad,
    Frustrated,
    Anxious,
    Tired,
    Grateful,
    Excited,
    Concerned,
    Overwhelmed,
    Confident,
    Vulnerable,
    Neutral,
}

struct TonePattern {
    tone: EmotionalTone,
    keywords: &'static [&'static str],
    phrases: &'static [&'static str],
}

const TONE_PATTERNS: &[TonePattern] = &[
    TonePattern { tone: EmotionalTone::Overwhelmed, keywords: &["overwhelmed", "too much", "can't cope"], phrases: &["i can't take this", "it's all too much"] },
    TonePattern { tone: EmotionalTone::Vulnerable, keywords: &["scared", "afraid", "vulnerable", "exposed"], phrases: &["i don't know what to do", "i feel so alone"] },
    TonePattern { tone: EmotionalTone::Anxious, keywords: &["anxious", "nervous", "worried", "on edge"], phrases: &["what if something goes wrong"] },
    TonePattern { tone: EmotionalTone::Sad, keywords: &["sad", "down", "heartbroken", "grieving"], phrases: &["i lost someone", "it hurts"] },
    TonePattern { tone: EmotionalTone::Frustrated, keywords: &["frustrated", "annoyed", "fed up"], phrases: &["i've had enough"] },
    TonePattern { tone: EmotionalTone::Tired, keywords: &["exhausted", "tired", "drained", "worn out"], phrases: &["i need to rest"] },
    TonePattern { tone: EmotionalTone::Concerned, keywords: &["concerned", "worried about", "troubling"], phrases: &["i'm not sure this is safe"] },
    TonePattern { tone: EmotionalTone::Grateful, keywords: &["grateful", "thankful", "appreciate"], phrases: &["thank you so much"] },
    TonePattern { tone: EmotionalTone::Excited, keywords: &["excited", "thrilled", "can't wait"], phrases: &["this is amazing"] },
    TonePattern { tone: EmotionalTone::Happy, keywords: &["happy", "glad", "delighted", "joyful"], phrases: &["this made my day"] },
    TonePattern { tone: EmotionalTone::Confident, keywords: &["confident", "sure of myself", "ready"], phrases: &["i've got this"] },
];

static VULNERABILITY_HIGH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(i('m| am) (scared|terrified|breaking down)|i can't (do this|cope) anymore)\b").unwrap());
static VULNERABILITY_MODERATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(i('m| am) (struggling|not okay|having a hard time))\b").unwrap());

static EVERYONE_EXPECTATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\beveryone('s| is)? expect(s|ations)?\b").unwrap());

static VOCATIVE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)^\s*["'\[]*\s*elsie\s*[,:]"#).unwrap());
static VOCATIVE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i),\s*elsie\s*[.?!]?\s*["')\]]*\s*$"#).unwrap());
static VOCATIVE_INLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)["']\s*elsie\s*[,:]"#).unwrap());

const SERVICE_REQUEST_PHRASES: &[&str] = &[
    "can you get me",
    "can you bring me",
    "could you get me",
    "could you bring me",
    "could you pour",
    "i'll have",
    "i would like",
    "i'd like",
    "pour me",
    "another round",
    "same again",
    "get me a",
    "bring me a",
    "order me",
    "fix me a drink",
    "top me off",
    "refill my",
];

static CHARACTER_ADDRESS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[([^\]]+)\]\s*["']([A-Z][a-z]+)[,\s]"#).unwrap());

const QUESTION_WORDS: &[&str] =
    &["can", "could", "would", "do", "does", "what", "where", "when", "why", "who", "how"];

static FACTUAL_QUESTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)what (?:did|was) (\w+) (?:say|saying|want|wanting|ask|asking|request|requesting|tell)").unwrap()
});

static TECHNICAL_ENTITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(stellar nurser(?:y|ies)|ngc\s*\d+|constellation\s+\w+|nebula\s+\w+|galaxy\s+\w+|star system\s+\w+|coordinates?\s+(?:for|of|to))\b").unwrap()
});

const EXPERTISE_GATE_TOPICS: &[&str] = &["stellar_cartography", "ship_operations"];

/// Whether `message` vocatively addresses Elsie by name ("Elsie, ...", a
/// quoted "...Elsie, ..." inside roleplay dialogue, or "..., Elsie.").
fn detect_direct_mentions(message: &str) -> Vec<String> {
    if VOCATIVE_PREFIX.is_match(message) || VOCATIVE_SUFFIX.is_match(message) || VOCATIVE_INLINE.is_match(message) {
        vec!["Elsie".to_string()]
    } else {
        Vec::new()
    }
}

/// Lexical service-request phrases ("pour me another", "I'll have...") that
/// don't require naming Elsie directly — she's tending bar, she's listening.
fn detect_service_requests(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    SERVICE_REQUEST_PHRASES
        .iter()
        .filter(|phrase| lower.contains(*phrase))
        .map(|phrase| phrase.to_string())
        .collect()
}

/// One character directly addressing another, e.g. `[Maeve] "Samwise, ..."`.
/// A name immediately followed by a question word ("Samwise, what...") is a
/// question aimed at whoever's present, not an addressing cue, and is
/// excluded.
fn detect_character_addressing(message: &str) -> Vec<String> {
    let Some(caps) = CHARACTER_ADDRESS_PATTERN.captures(message) else {
        return Vec::new();
    };
    let target = caps[2].to_string();
    let target_lower = target.to_lowercase();
    if QUESTION_WORDS.contains(&target_lower.as_str()) || target_lower == "elsie" || target_lower == "el" {
        return Vec::new();
    }
    vec![target]
}

/// Builds the addressing context for a live message: direct vocative
/// mentions, service-request phrasing and character-to-character addressing
/// are detected straight from the text; group addressing falls back to the
/// lexical `distinguish_group_vs_contextual` check.
pub fn build_addressing_context(message: &str) -> AddressingContext {
    let mut ctx = distinguish_group_vs_contextual(message);
    ctx.direct_mentions = detect_direct_mentions(message);
    ctx.service_requests = detect_service_requests(message);
    ctx.other_interactions = detect_character_addressing(message);
    ctx
}

/// Analyzed emotional read of the current message: dominant tone, an
/// optional secondary tone, an intensity in `0.0..=1.0` and a vulnerability
/// tier used for the emotional-support bonus.
#[derive(Debug, Clone)]
pub struct EmotionalAnalysis {
    pub primary_tone: EmotionalTone,
    pub secondary_tone: Option<EmotionalTone>,
    pub intensity: f32,
    pub vulnerability: Vulnerability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vulnerability {
    None,
    Moderate,
    High,
}

pub fn analyze_emotion(message: &str) -> EmotionalAnalysis {
    let lower = message.to_lowercase();
    let mut matches: Vec<(EmotionalTone, f32)> = Vec::new();
    for pattern in TONE_PATTERNS {
        let mut score: f32 = 0.0;
        for kw in pattern.keywords {
            if lower.contains(kw) {
                score += 0.3;
            }
        }
        for phrase in pattern.phrases {
            if lower.contains(phrase) {
                score += 0.5;
            }
        }
        if score > 0.0 {
            matches.push((pattern.tone, score.min(1.0)));
        }
    }
    matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    let vulnerability = if VULNERABILITY_HIGH.is_match(message) {
        Vulnerability::High
    } else if VULNERABILITY_MODERATE.is_match(message) {
        Vulnerability::Moderate
    } else {
        Vulnerability::None
    };

    match matches.first() {
        Some((primary, intensity)) => EmotionalAnalysis {
            primary_tone: *primary,
            secondary_tone: matches.get(1).map(|(tone, _)| *tone),
            intensity: *intensity,
            vulnerability,
        },
        None => EmotionalAnalysis {
            primary_tone: EmotionalTone::Neutral,
            secondary_tone: None,
            intensity: 0.0,
            vulnerability,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Fallback,
}

impl Priority {
    fn weight(self) -> f32 {
        match self {
            Priority::Critical => 1.0,
            Priority::High => 0.8,
            Priority::Medium => 0.6,
            Priority::Low => 0.4,
            Priority::Fallback => 0.2,
        }
    }
}

struct Candidate {
    response_type: ResponseType,
    priority: Priority,
    confidence: f32,
    bonuses: f32,
    reasoning: String,
}

impl Candidate {
    fn weighted_score(&self) -> f32 {
        (self.confidence * self.priority.weight() + self.bonuses).min(1.0)
    }
}

fn direct_addressing_candidate(cues: &ContextualCues) -> Option<Candidate> {
    if cues.addressing_context.direct_mentions.is_empty() {
        return None;
    }
    let mut bonuses = 0.2;
    if cues.current_message.trim_end().ends_with('?') || cues.current_message.to_lowercase().contains("please") {
        bonuses += 0.1;
    }
    Some(Candidate {
        response_type: ResponseType::ActiveDialogue,
        priority: Priority::Critical,
        confidence: 0.9,
        bonuses,
        reasoning: "direct addressing by name".to_string(),
    })
}

fn service_request_candidate(cues: &ContextualCues) -> Option<Candidate> {
    if cues.addressing_context.service_requests.is_empty() {
        return None;
    }
    Some(Candidate {
        response_type: ResponseType::SubtleService,
        priority: Priority::High,
        confidence: 0.75,
        bonuses: 0.0,
        reasoning: "service request detected".to_string(),
    })
}

fn emotional_support_candidate(cues: &ContextualCues, emotion: &EmotionalAnalysis, known_relationship: Relationship) -> Option<Candidate> {
    let everyone_override = EVERYONE_EXPECTATIONS.is_match(&cues.current_message);
    if matches!(emotion.primary_tone, EmotionalTone::Neutral) && emotion.vulnerability == Vulnerability::None && !everyone_override {
        return None;
    }
    let mut bonuses = 0.0;
    if matches!(known_relationship, Relationship::CloseFriend | Relationship::SpecialAffection) {
        bonuses += 0.15;
    }
    bonuses += match emotion.vulnerability {
        Vulnerability::High | Vulnerability::Moderate => 0.2,
        Vulnerability::None => 0.0,
    };
    if matches!(cues.conversation_dynamics.intimacy_level, IntimacyLevel::Personal | IntimacyLevel::Intimate) {
        bonuses += 0.15;
    }
    if cues.scene_setting.is_some() {
        bonuses += 0.1;
    }
    if everyone_override {
        bonuses += 0.3;
    }
    Some(Candidate {
        response_type: ResponseType::SupportiveListen,
        priority: Priority::High,
        confidence: 0.5 + emotion.intensity * 0.4,
        bonuses,
        reasoning: format!("emotional support opportunity ({:?})", emotion.primary_tone),
    })
}

fn group_addressing_candidate(cues: &ContextualCues) -> Option<Candidate> {
    if !cues.addressing_context.group_addressing {
        return None;
    }
    let mut bonuses = 0.1;
    let lower = cues.current_message.to_lowercase();
    if lower.contains("everyone") || lower.contains("all of you") {
        bonuses += 0.1;
    }
    if EVERYONE_EXPECTATIONS.is_match(&cues.current_message) {
        bonuses -= 0.3;
    }
    if GREETING_PATTERN.is_match(&cues.current_message) {
        bonuses += 0.1;
    }
    Some(Candidate {
        response_type: ResponseType::GroupAcknowledgment,
        priority: Priority::Medium,
        confidence: 0.6,
        bonuses,
        reasoning: "group addressing detected".to_string(),
    })
}

static GREETING_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(hi|hello|hey)\b.*\b(everyone|all|folks)\b").unwrap());

fn technical_expertise_candidate(cues: &ContextualCues) -> Option<Candidate> {
    let gated = EXPERTISE_GATE_TOPICS.iter().any(|topic| {
        cues.current_expertise.iter().any(|e| e == topic) && cues.conversation_dynamics.themes.iter().any(|t| t == topic)
    });
    if !gated {
        return None;
    }
    Some(Candidate {
        response_type: ResponseType::TechnicalExpertise,
        priority: Priority::Medium,
        confidence: 0.55,
        bonuses: 0.0,
        reasoning: "technical expertise requested".to_string(),
    })
}

/// True when the turn is one character addressing another, with no opening
/// for Elsie: present only to suppress a response, never to generate one.
fn is_character_to_character(cues: &ContextualCues) -> bool {
    cues.addressing_context.direct_mentions.is_empty()
        && !cues.addressing_context.group_addressing
        && cues.addressing_context.service_requests.is_empty()
        && !cues.addressing_context.other_interactions.is_empty()
}

/// The full decision pipeline: analyze, then walk the fixed priority cascade
/// (individual addressing → service request → emotional support/group
/// addressing → technical expertise → character-to-character → standard),
/// applying fabrication controls to whichever candidate wins.
///
/// The weighted-score resolver is used for exactly one thing: picking
/// between emotional support and group addressing when both cross their
/// thresholds on the same turn. Every other step in the cascade is a plain
/// ordered check, not a score comparison — an unconditional individual
/// addressing match always wins, even against a maxed-out emotional-support
/// score.
pub fn decide(cues: &ContextualCues, session: &SessionState) -> ResponseDecision {
    let emotion = analyze_emotion(&cues.current_message);
    let relationship = cues
        .current_speaker
        .as_ref()
        .and_then(|name| cues.known_characters.get(name))
        .map(|profile| profile.relationship)
        .unwrap_or_default();

    if let Some(candidate) = direct_addressing_candidate(cues) {
        return finalize(cues, candidate);
    }
    if let Some(candidate) = service_request_candidate(cues) {
        return finalize(cues, candidate);
    }

    let emotional = emotional_support_candidate(cues, &emotion, relationship);
    let group = group_addressing_candidate(cues);
    let emotional_meets = emotional.as_ref().map_or(false, |c| c.weighted_score() >= 0.4);
    let group_meets = group.as_ref().map_or(false, |c| c.weighted_score() >= 0.6);

    let resolved = match (emotional_meets, group_meets) {
        (true, true) => {
            let e = emotional.unwrap();
            let g = group.unwrap();
            Some(if e.weighted_score() >= g.weighted_score() { e } else { g })
        }
        (true, false) => emotional,
        (false, true) => group,
        (false, false) => None,
    };
    if let Some(candidate) = resolved {
        return finalize(cues, candidate);
    }

    if let Some(candidate) = technical_expertise_candidate(cues) {
        return finalize(cues, candidate);
    }

    if is_character_to_character(cues) {
        return ResponseDecision::no_response("character-to-character interaction, no opening for Elsie");
    }

    if session.is_simple_implicit_response(session.last_response_turn + 1, &cues.current_message) {
        let decision = standard_decision(cues, ResponseType::ImplicitResponse, 0.4, "short implicit continuation");
        return apply_fabrication_controls(cues, decision);
    }
    ResponseDecision::no_response("no addressing, service, emotional or expertise signal found")
}

fn finalize(cues: &ContextualCues, candidate: Candidate) -> ResponseDecision {
    let score = candidate.weighted_score();
    let decision = standard_decision(cues, candidate.response_type, score, &candidate.reasoning);
    apply_fabrication_controls(cues, decision)
}

/// Fabrication controls: flags questions that invite the LLM to invent facts
/// ("what did X say", stellar-cartography entities named without context)
/// and pushes an explicit accuracy instruction, switching to an
/// `honest_and_accurate` tone. A factual question about what someone said is
/// additionally checked against `recent_activity`; if that person's actual
/// words aren't in the recent record, a limitation notice is attached too.
fn apply_fabrication_controls(cues: &ContextualCues, mut decision: ResponseDecision) -> ResponseDecision {
    if !decision.should_respond {
        return decision;
    }
    let message = &cues.current_message;
    let factual_target = FACTUAL_QUESTION_PATTERN.captures(message).map(|c| c[1].to_string());
    let technical_hit = TECHNICAL_ENTITY_PATTERN.is_match(message);

    if factual_target.is_none() && !technical_hit {
        return decision;
    }

    decision.tone = "honest_and_accurate".to_string();
    decision
        .knowledge_to_use
        .push("Respond only from what is actually known or was actually said; do not invent specifics.".to_string());

    if let Some(target) = factual_target {
        let target_lower = target.to_lowercase();
        let has_reliable_history = cues.recent_activity.len() >= 2
            && cues
                .recent_activity
                .iter()
                .any(|(speaker, content)| speaker.to_lowercase().contains(&target_lower) && !content.trim().is_empty());
        if !has_reliable_history {
            decision.knowledge_to_use.push(format!(
                "You don't have a clear record of what {target} actually said here; admit that limitation rather than guessing."
            ));
        }
    }

    decision
}

fn standard_decision(cues: &ContextualCues, response_type: ResponseType, confidence: f32, reasoning: &str) -> ResponseDecision {
    let address_character = cues.addressing_context.direct_mentions.first().cloned();
    let estimated_length = match response_type {
        ResponseType::SupportiveListen | ResponseType::ActiveDialogue => EstimatedLength::Medium,
        ResponseType::TechnicalExpertise => EstimatedLength::Long,
        _ => EstimatedLength::Short,
    };
    let urgency = match response_type {
        ResponseType::SupportiveListen if confidence > 0.8 => Urgency::High,
        ResponseType::ActiveDialogue => Urgency::Normal,
        _ => Urgency::Low,
    };
    let scene_impact = match response_type {
        ResponseType::ActiveDialogue | ResponseType::SupportiveListen => SceneImpact::Moderate,
        _ => SceneImpact::Minor,
    };
    ResponseDecision {
        should_respond: true,
        response_type,
        confidence,
        reasoning: reasoning.to_string(),
        response_style: style_for(response_type),
        tone: cues.conversation_dynamics.emotional_tone.clone(),
        approach: approach_for(response_type),
        address_character,
        suggested_themes: cues.conversation_dynamics.themes.clone(),
        continuation_cues: Vec::new(),
        knowledge_to_use: cues.current_expertise.clone(),
        estimated_length,
        urgency,
        scene_impact,
    }
}

fn style_for(response_type: ResponseType) -> String {
    match response_type {
        ResponseType::ActiveDialogue => "direct and in character",
        ResponseType::SubtleService => "brief, service-oriented",
        ResponseType::GroupAcknowledgment => "light, addressed to the room",
        ResponseType::ImplicitResponse => "short continuation",
        ResponseType::SupportiveListen => "warm, unhurried",
        ResponseType::TechnicalExpertise => "precise, informative",
        ResponseType::None => "",
    }
    .to_string()
}

fn approach_for(response_type: ResponseType) -> String {
    match response_type {
        ResponseType::SupportiveListen => "listen first, offer support without fixing",
        ResponseType::TechnicalExpertise => "answer the question, cite what's known",
        _ => "respond naturally in character",
    }
    .to_string()
}

/// Distinguishes a message naming the whole room from one that merely
/// mentions a group in passing, when `ContextualCues` doesn't already say.
pub fn distinguish_group_vs_contextual(message: &str) -> AddressingContext {
    let lower = message.to_lowercase();
    let mut ctx = AddressingContext::default();
    if lower.contains("everyone") || lower.contains("all of you") || lower.starts_with("hey all") {
        ctx.group_addressing = true;
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConversationDynamics, PersonalityMode};
    use elsie_core::ChannelContext;
    use std::collections::HashMap;

    fn base_cues(message: &str) -> ContextualCues {
        ContextualCues {
            current_message: message.to_string(),
            current_speaker: None,
            known_characters: HashMap::new(),
            addressing_context: AddressingContext::default(),
            conversation_dynamics: ConversationDynamics::default(),
            personality_mode: PersonalityMode::Balanced,
            current_expertise: Vec::new(),
            scene_setting: None,
            session_mode: false,
            scene_control: None,
            channel_context: ChannelContext::dm("test"),
            recent_activity: Vec::new(),
        }
    }

    #[test]
    fn direct_mention_always_responds() {
        let mut cues = base_cues("Elsie, what's the status?");
        cues.addressing_context.direct_mentions.push("Elsie".to_string());
        let session = SessionState::new(ChannelContext::dm("test"));
        let decision = decide(&cues, &session);
        assert!(decision.should_respond);
        assert_eq!(decision.response_type, ResponseType::ActiveDialogue);
    }

    #[test]
    fn character_to_character_suppresses_response() {
        let mut cues = base_cues("Maeve nods at Samwise.");
        cues.addressing_context.other_interactions.push("Samwise".to_string());
        let session = SessionState::new(ChannelContext::dm("test"));
        let decision = decide(&cues, &session);
        assert!(!decision.should_respond);
    }

    #[test]
    fn vulnerable_message_triggers_emotional_support() {
        let cues = base_cues("I'm struggling and I don't know what to do.");
        let session = SessionState::new(ChannelContext::dm("test"));
        let decision = decide(&cues, &session);
        assert!(decision.should_respond);
        assert_eq!(decision.response_type, ResponseType::SupportiveListen);
    }

    #[test]
    fn everyone_expectations_favors_support_over_group() {
        let mut cues = base_cues("I feel like everyone expects me to be strong all the time.");
        cues.addressing_context.group_addressing = true;
        let session = SessionState::new(ChannelContext::dm("test"));
        let decision = decide(&cues, &session);
        assert_eq!(decision.response_type, ResponseType::SupportiveListen);
    }

    #[test]
    fn neutral_unaddressed_message_does_not_respond() {
        let cues = base_cues("The ship hums quietly in the dark.");
        let session = SessionState::new(ChannelContext::dm("test"));
        let decision = decide(&cues, &session);
        assert!(!decision.should_respond);
    }

    #[test]
    fn build_addressing_context_detects_direct_vocative_mention() {
        let ctx = build_addressing_context("Elsie, what's the status?");
        assert_eq!(ctx.direct_mentions, vec!["Elsie".to_string()]);
    }

    #[test]
    fn build_addressing_context_detects_service_request() {
        let ctx = build_addressing_context("Could you pour me another round, please?");
        assert!(!ctx.service_requests.is_empty());
    }

    #[test]
    fn build_addressing_context_detects_character_to_character_addressing() {
        let ctx = build_addressing_context(r#"[Maeve] "Samwise, pull up the sensor logs.""#);
        assert_eq!(ctx.other_interactions, vec!["Samwise".to_string()]);
    }

    #[test]
    fn build_addressing_context_excludes_question_word_targets() {
        let ctx = build_addressing_context(r#"[Maeve] "What happened out there?""#);
        assert!(ctx.other_interactions.is_empty());
    }

    #[test]
    fn decide_prefers_individual_addressing_over_tied_emotional_support() {
        let mut cues = base_cues(
            "Elsie, I can't cope anymore, it's all too much, and everyone expects me to be strong.",
        );
        let session = SessionState::new(ChannelContext::dm("test"));
        cues.addressing_context = build_addressing_context(&cues.current_message);
        let decision = decide(&cues, &session);
        assert!(decision.should_respond);
        assert_eq!(decision.response_type, ResponseType::ActiveDialogue);
    }

    #[test]
    fn fabrication_controls_flag_unverified_factual_question() {
        let mut cues = base_cues("Elsie, what did Maeve say earlier?");
        cues.addressing_context = build_addressing_context(&cues.current_message);
        let session = SessionState::new(ChannelContext::dm("test"));
        let decision = decide(&cues, &session);
        assert!(decision.should_respond);
        assert_eq!(decision.tone, "honest_and_accurate");
        assert!(decision.knowledge_to_use.iter().any(|k| k.contains("Maeve")));
    }

    #[test]
    fn fabrication_controls_skip_limitation_when_recent_activity_confirms_speaker() {
        let mut cues = base_cues("Elsie, what did Maeve say earlier?");
        cues.addressing_context = build_addressing_context(&cues.current_message);
        cues.recent_activity = vec![
            ("Maeve".to_string(), "I'm heading to the bridge.".to_string()),
            ("Elsie".to_string(), "Noted.".to_string()),
        ];
        let session = SessionState::new(ChannelContext::dm("test"));
        let decision = decide(&cues, &session);
        assert_eq!(decision.tone, "honest_and_accurate");
        assert!(!decision.knowledge_to_use.iter().any(|k| k.contains("admit that limitation")));
    }

    #[test]
    fn technical_expertise_requires_overlap_between_expertise_and_themes() {
        let mut cues = base_cues("Can you plot a course?");
        cues.current_expertise = vec!["stellar_cartography".to_string()];
        assert!(technical_expertise_candidate(&cues).is_none());
        cues.conversation_dynamics.themes = vec!["stellar_cartography".to_string()];
        assert!(technical_expertise_candidate(&cues).is_some());
    }
}
