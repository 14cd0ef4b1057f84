//! Confidence-scored roleplay detection: whether a message should be
//! treated as an in-character turn, plus the `[DGM]` (Deputy Game Master)
//! tag dialect that can force a scene to start, end, or have Elsie speak
//! under direct narrator control.

use once_cell::sync::Lazy;
use regex::Regex;

use elsie_core::{ChannelContext, ChannelType};

const BASE_THRESHOLD: f32 = 0.25;
const THREAD_THRESHOLD: f32 = 0.20;

static BRACKET_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[[A-Z][A-Za-z' .]+\]").unwrap());
static EMOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*[^*]+\*").unwrap());
static QUOTED_DIALOGUE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]{2,}""#).unwrap());
static SECOND_PERSON_IMPERATIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(look|listen|go|stop|wait|come|sit|stand|leave|give|take)\b").unwrap());
static NARRATIVE_PROSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(she|he|they)\s+\w+ed\b|\bwalks? (in|over|toward)\b").unwrap());
static THREAD_RP_VERBS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(says?|looks? at|whispers?|glances?|nods?|smiles?)\b").unwrap());

static DGM_ELSIE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\[DGM\]\s*\[Elsie\]\s*(.*)$").unwrap());
static DGM_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\[DGM\]\s*(.*)$").unwrap());
static END_SCENE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\*\s*(end scene|roll credits|scene end)\s*\*").unwrap());
static PROPER_NOUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z][a-z]{2,})\b").unwrap());

static EXIT_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(stop roleplay|end roleplay|exit roleplay|stop rp|end scene)\b").unwrap());
static OOC_BRACKET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*\(\(|^\s*//|^\s*\[ooc\b|^\s*ooc:").unwrap());
static TECHNICAL_META: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(are you an? (ai|bot)|how do you work|what model are you)\b").unwrap());

#[derive(Debug, Clone)]
pub struct RoleplaySignal {
    pub is_roleplay: bool,
    pub confidence: f32,
    pub triggers: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum DgmAction {
    /// `[DGM][Elsie] ...`: DGM speaks as Elsie; force roleplay on, no bot
    /// response this turn, content recorded as if Elsie said it.
    ElsieControlled(String),
    /// An end-scene marker inside a `[DGM]` message.
    EndScene,
    /// Any other `[DGM]` content: scene-setting, extracted character names.
    SceneSetting { characters: Vec<String> },
}

/// Parses a leading `[DGM]` tag, if present. DGM handling overrides the
/// channel eligibility gate entirely.
pub fn parse_dgm(message: &str) -> Option<DgmAction> {
    let trimmed = message.trim();
    if let Some(caps) = DGM_ELSIE.captures(trimmed) {
        return Some(DgmAction::ElsieControlled(caps[1].trim().to_string()));
    }
    if let Some(caps) = DGM_TAG.captures(trimmed) {
        let content = &caps[1];
        if END_SCENE.is_match(content) {
            return Some(DgmAction::EndScene);
        }
        let characters = extract_proper_nouns(content);
        return Some(DgmAction::SceneSetting { characters });
    }
    None
}

fn extract_proper_nouns(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for caps in PROPER_NOUN.captures_iter(text) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// True when the channel gate allows roleplay at all, independent of
/// detector confidence. DMs, threads, private channels and unknown channel
/// types are permissive; a named general/announcement channel is not.
pub fn channel_allows_roleplay(channel: &ChannelContext) -> bool {
    channel.is_dm
        || channel.is_thread
        || matches!(channel.channel_type, ChannelType::Private | ChannelType::Unknown | ChannelType::Thread | ChannelType::Dm)
}

/// True when the message looks like a request to leave roleplay: an
/// explicit exit command, an OOC bracket, or a question about the system
/// itself.
pub fn is_exit_condition(message: &str) -> bool {
    EXIT_COMMAND.is_match(message) || OOC_BRACKET.is_match(message) || TECHNICAL_META.is_match(message)
}

/// Scores `message` for roleplay signals. Does not consult the channel
/// gate — callers apply `channel_allows_roleplay` first.
pub fn detect(message: &str, channel: &ChannelContext) -> RoleplaySignal {
    let mut confidence = 0.0f32;
    let mut triggers = Vec::new();
    let has_brackets = BRACKET_NAME.is_match(message);
    let has_quotes = QUOTED_DIALOGUE.is_match(message);

    if has_brackets {
        confidence += 0.7;
        triggers.push("character_bracket".to_string());
    }
    if EMOTE.is_match(message) {
        confidence += 0.6;
        triggers.push("emote".to_string());
    }
    if has_quotes {
        confidence += if has_brackets { 0.4 } else { 0.3 };
        triggers.push("quoted_dialogue".to_string());
    }
    if SECOND_PERSON_IMPERATIVE.is_match(message) {
        confidence += 0.25;
        triggers.push("second_person_imperative".to_string());
    }
    if NARRATIVE_PROSE.is_match(message) {
        confidence += 0.18;
        triggers.push("narrative_prose".to_string());
    }
    if channel.is_thread {
        if message.split_whitespace().count() >= 8 {
            confidence += 0.10;
            triggers.push("thread_substantial_message".to_string());
        }
        if THREAD_RP_VERBS.is_match(message) {
            confidence += 0.25;
            triggers.push("thread_rp_verb".to_string());
        }
    }

    let threshold = if channel.is_thread { THREAD_THRESHOLD } else { BASE_THRESHOLD };
    RoleplaySignal {
        is_roleplay: confidence >= threshold,
        confidence: confidence.min(1.0),
        triggers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elsie_core::ChannelType;

    fn dm() -> ChannelContext {
        ChannelContext::dm("test")
    }

    #[test]
    fn bracket_and_emote_clears_threshold() {
        let signal = detect("[Maeve] *adjusts her jacket* \"Report status.\"", &dm());
        assert!(signal.is_roleplay);
        assert!(signal.confidence > 0.25);
    }

    #[test]
    fn plain_question_is_not_roleplay() {
        let signal = detect("What time is it?", &dm());
        assert!(!signal.is_roleplay);
    }

    #[test]
    fn thread_lowers_threshold_for_rp_verbs() {
        let mut ctx = dm();
        ctx.is_thread = true;
        ctx.channel_type = ChannelType::Thread;
        let signal = detect("She looks at the console quietly.", &ctx);
        assert!(signal.confidence >= THREAD_THRESHOLD);
    }

    #[test]
    fn general_channel_blocks_roleplay() {
        let ctx = ChannelContext::general("test", "announcements");
        assert!(!channel_allows_roleplay(&ctx));
    }

    #[test]
    fn dgm_elsie_tag_is_parsed() {
        match parse_dgm("[DGM][Elsie] \"Welcome aboard.\"") {
            Some(DgmAction::ElsieControlled(content)) => assert!(content.contains("Welcome aboard")),
            other => panic!("expected ElsieControlled, got {other:?}"),
        }
    }

    #[test]
    fn dgm_end_scene_is_parsed() {
        assert!(matches!(parse_dgm("[DGM] *end scene*"), Some(DgmAction::EndScene)));
    }

    #[test]
    fn dgm_scene_setting_extracts_names() {
        match parse_dgm("[DGM] Maeve and Samwise enter the bridge.") {
            Some(DgmAction::SceneSetting { characters }) => {
                assert!(characters.contains(&"Maeve".to_string()));
                assert!(characters.contains(&"Samwise".to_string()));
            }
            other => panic!("expected SceneSetting, got {other:?}"),
        }
    }

    #[test]
    fn exit_condition_detects_ooc_bracket() {
        assert!(is_exit_condition("((let's pause the scene))"));
        assert!(!is_exit_condition("[Maeve] \"Let's continue.\""));
    }
}
