//! Canonical character name resolution.
//!
//! The real correction tables are fleet lore — who goes by a nickname on
//! which ship, which handles map to which character — and are treated as
//! injected configuration rather than something this crate should guess at.
//! The tables below are a small, honest starting set; swapping them for a
//! fuller roster does not change any caller's contract.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Per-ship corrections checked first: the same short name can mean a
/// different character depending on which ship's log it appears in.
static SHIP_SPECIFIC_CORRECTIONS: Lazy<HashMap<&'static str, HashMap<&'static str, &'static str>>> =
    Lazy::new(|| {
        let mut by_ship = HashMap::new();

        let mut stardancer = HashMap::new();
        stardancer.insert("maeve", "Maeve Blaine");
        stardancer.insert("fallo", "Fallo Scoria");
        stardancer.insert("kass", "Kassandra Lynn");
        by_ship.insert("stardancer", stardancer);

        let mut adagio = HashMap::new();
        adagio.insert("zarina", "Zarina Gold");
        adagio.insert("reyes", "Commander Reyes");
        by_ship.insert("adagio", adagio);

        by_ship
    });

/// Checked when no ship-specific entry matches, or when there is no ship
/// context at all (e.g. a personnel page with no inferred ship).
static FALLBACK_CORRECTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("elsie", "Elsie");
    m.insert("narrator", "Narrator");
    m
});

const UNKNOWN: &str = "Unknown";

/// Resolve a raw name (as it appears in a `[Name]` bracket or `Name:` prefix)
/// to its canonical form, consulting the ship-specific table first and the
/// global fallback table second. Unrecognized names resolve to `"Unknown"`,
/// never an error — callers treat `"Unknown"` as "not a known character" for
/// gating purposes (e.g. bracket-speaker detection in the log parser).
pub fn resolve_character_name(name: &str, ship_context: Option<&str>) -> String {
    let key = normalize_key(name);
    if key.is_empty() {
        return UNKNOWN.to_string();
    }

    if let Some(ship) = ship_context {
        let ship_key = ship.trim().to_lowercase();
        if let Some(table) = SHIP_SPECIFIC_CORRECTIONS.get(ship_key.as_str()) {
            if let Some(canonical) = table.get(key.as_str()) {
                return canonical.to_string();
            }
        }
    }

    if let Some(canonical) = FALLBACK_CORRECTIONS.get(key.as_str()) {
        return canonical.to_string();
    }

    // Names that are already well formed (two capitalized words) are taken
    // as their own canonical form rather than rejected outright — the
    // correction tables exist to fix known nicknames and handles, not to
    // gatekeep every character who has ever appeared in a log.
    if looks_like_proper_name(name) {
        return name.trim().to_string();
    }

    UNKNOWN.to_string()
}

fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn looks_like_proper_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains('@') {
        return false;
    }
    trimmed
        .chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false)
        && trimmed.chars().all(|c| c.is_alphanumeric() || c.is_whitespace() || c == '\'' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ship_specific_correction_wins_over_fallback() {
        assert_eq!(
            resolve_character_name("maeve", Some("Stardancer")),
            "Maeve Blaine"
        );
    }

    #[test]
    fn unknown_short_handle_resolves_to_unknown() {
        assert_eq!(resolve_character_name("xq9", None), UNKNOWN);
    }

    #[test]
    fn well_formed_full_name_passes_through() {
        assert_eq!(
            resolve_character_name("Captain Reyes", None),
            "Captain Reyes"
        );
    }

    #[test]
    fn handle_with_at_sign_is_not_a_proper_name() {
        assert_eq!(resolve_character_name("gm@table", None), UNKNOWN);
    }
}
