//! Classifies a standard (non-roleplay) user message into one retrieval
//! bucket. Detectors run in fixed priority order and the first match wins;
//! each is a pure function of the message text.

use once_cell::sync::Lazy;
use regex::Regex;

use elsie_category::fleet::find_ship_mention;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Continuation,
    LogUrl,
    Character,
    SpecificLog,
    TellMeAbout,
    StardancerInfo,
    StardancerCommand,
    ShipLog,
    Ooc,
    Log,
    FederationArchives,
    ShipPlusLog,
    CharacterPlusLog,
    SimpleGreeting,
    SimpleFarewell,
    SimpleStatus,
    SimpleConversational,
    MenuRequest,
    ResetRequest,
    General,
}

static LOG_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+/wiki/\S*log").unwrap());
static SPECIFIC_LOG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\blog\s*(#|number|no\.?)\s*\d+|\bmission log \d+").unwrap());
static TELL_ME_ABOUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\btell me about\b|\bwhat (is|are|was|were)\b").unwrap());
static STARDANCER_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bstardancer\b.*\b(status|command|bridge|report)\b").unwrap());
static OOC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*\(\(|^\s*//|^\s*\[ooc\b|^\s*ooc:").unwrap());
static LOG_GENERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\blog(s)?\b").unwrap());
static FEDERATION_ARCHIVES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(memory alpha|federation archive|federation database)\b").unwrap());
static GREETING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(hi|hello|hey|greetings|good (morning|afternoon|evening))\b").unwrap());
static FAREWELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(bye|goodbye|farewell|see you|later|good night)\b").unwrap());
static STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bhow are you\b|\bwhat'?s up\b|\bstatus report\b").unwrap());
static MENU: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmenu\b|\bwhat do you (have|serve)\b|\bdrinks? list\b").unwrap());
static RESET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\breset\b|\bstart over\b|\bclear (the )?session\b").unwrap());
static CONTINUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(and|also|what about|continue)\b").unwrap());
static WHO_IS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bwho (is|was|are)\b|\bcaptain\b").unwrap());

/// Common names consulted by character detection when no other signal
/// (bracket, "who is", title) establishes that a proper noun is a person.
const COMMON_CHARACTER_NAMES: &[&str] = &[
    "marcus", "maeve", "talia", "samwise", "lilith", "cetas", "tatpha", "beryxian", "tiberius", "sif",
    "saiv", "surithrae", "jiratha", "aija",
];

/// Classify `message` into a single query bucket, in fixed priority order.
pub fn detect(message: &str) -> QueryKind {
    let trimmed = message.trim();
    let lower = trimmed.to_lowercase();

    if CONTINUATION.is_match(trimmed) {
        return QueryKind::Continuation;
    }
    if LOG_URL.is_match(trimmed) {
        return QueryKind::LogUrl;
    }
    if is_character_query(trimmed, &lower) {
        return QueryKind::Character;
    }
    if SPECIFIC_LOG.is_match(trimmed) {
        return QueryKind::SpecificLog;
    }
    if TELL_ME_ABOUT.is_match(trimmed) {
        return QueryKind::TellMeAbout;
    }
    if lower.contains("stardancer") && STARDANCER_COMMAND.is_match(trimmed) {
        return QueryKind::StardancerCommand;
    }
    if lower.contains("stardancer") {
        return QueryKind::StardancerInfo;
    }
    if find_ship_mention(trimmed).is_some() && LOG_GENERIC.is_match(trimmed) {
        return if is_character_mention(&lower) {
            QueryKind::CharacterPlusLog
        } else {
            QueryKind::ShipPlusLog
        };
    }
    if find_ship_mention(trimmed).is_some() {
        return QueryKind::ShipLog;
    }
    if OOC.is_match(trimmed) {
        return QueryKind::Ooc;
    }
    if LOG_GENERIC.is_match(trimmed) {
        return QueryKind::Log;
    }
    if FEDERATION_ARCHIVES.is_match(trimmed) {
        return QueryKind::FederationArchives;
    }
    if GREETING.is_match(trimmed) {
        return QueryKind::SimpleGreeting;
    }
    if FAREWELL.is_match(trimmed) {
        return QueryKind::SimpleFarewell;
    }
    if STATUS.is_match(trimmed) {
        return QueryKind::SimpleStatus;
    }
    if MENU.is_match(trimmed) {
        return QueryKind::MenuRequest;
    }
    if RESET.is_match(trimmed) {
        return QueryKind::ResetRequest;
    }
    if trimmed.split_whitespace().count() <= 4 && !trimmed.is_empty() {
        return QueryKind::SimpleConversational;
    }

    QueryKind::General
}

/// Rejects ship-indicator messages outright, then matches a curated
/// common-name list, capitalized n-gram patterns, or context clues like
/// "who is"/"captain".
fn is_character_query(message: &str, lower: &str) -> bool {
    if find_ship_mention(message).is_some() {
        return false;
    }
    if COMMON_CHARACTER_NAMES.iter().any(|name| lower.contains(name)) {
        return true;
    }
    if WHO_IS.is_match(message) {
        return true;
    }
    capitalized_ngram(message)
}

fn is_character_mention(lower: &str) -> bool {
    COMMON_CHARACTER_NAMES.iter().any(|name| lower.contains(name))
}

/// A 1-2 word run of capitalized tokens not at the start of a sentence,
/// the cheap proxy for "looks like a proper name".
fn capitalized_ngram(message: &str) -> bool {
    let words: Vec<&str> = message.split_whitespace().collect();
    words.iter().enumerate().any(|(i, w)| {
        i > 0
            && w.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
            && w.chars().skip(1).all(|c| c.is_lowercase())
            && w.len() > 2
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_is_detected() {
        assert_eq!(detect("Hello there!"), QueryKind::SimpleGreeting);
    }

    #[test]
    fn ship_mention_without_log_is_stardancer_info() {
        assert_eq!(detect("Tell me about the USS Stardancer"), QueryKind::TellMeAbout);
    }

    #[test]
    fn ship_plus_log_detected() {
        assert_eq!(detect("show me the Adagio logs"), QueryKind::ShipPlusLog);
    }

    #[test]
    fn ooc_bracket_detected() {
        assert_eq!(detect("((can we pause for a sec))"), QueryKind::Ooc);
    }

    #[test]
    fn who_is_triggers_character() {
        assert_eq!(detect("who is Marcus Blaine?"), QueryKind::Character);
    }

    #[test]
    fn menu_request_detected() {
        assert_eq!(detect("what do you have on the menu?"), QueryKind::MenuRequest);
    }
}
