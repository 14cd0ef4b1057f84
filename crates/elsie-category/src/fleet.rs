//! Fleet ship roster used for title→ship inference and ship-log category
//! derivation. This list is genuinely fleet-specific configuration data —
//! it is kept here as a single, easily-swapped table rather than scattered
//! through the crawler and retrieval code.

/// The 22nd Mobile Daedalus Fleet roster. Names are matched case-insensitively
/// against wiki page titles to infer ship context.
const FLEET_SHIPS: &[&str] = &[
    "stardancer",
    "adagio",
    "pilgrim",
    "protector",
    "manta",
    "sentinel",
    "caelian",
    "montagnier",
    "faraday",
    "cook",
    "mjolnir",
    "rendino",
    "gigantes",
    "banshee",
];

/// All fleet ship names, title-cased for display (e.g. category strings).
pub fn fleet_ship_names() -> Vec<String> {
    FLEET_SHIPS.iter().map(|s| title_case(s)).collect()
}

/// Whether `name` (any case, optionally prefixed "USS ") refers to a known
/// fleet ship.
pub fn is_fleet_ship(name: &str) -> bool {
    normalize_ship(name).is_some()
}

fn normalize_ship(name: &str) -> Option<&'static str> {
    let cleaned = name
        .trim()
        .to_lowercase()
        .trim_start_matches("uss ")
        .trim()
        .to_string();
    FLEET_SHIPS.iter().find(|s| **s == cleaned).copied()
}

/// The ship-log category string for one fleet ship, e.g. "Stardancer Logs".
pub fn ship_log_category(ship: &str) -> String {
    match normalize_ship(ship) {
        Some(canonical) => format!("{} Logs", title_case(canonical)),
        None => "Mission Logs".to_string(),
    }
}

/// Every ship-log category in the fleet, used when a search has no specific
/// ship to narrow against.
pub fn ship_log_categories() -> Vec<String> {
    FLEET_SHIPS.iter().map(|s| ship_log_category(s)).collect()
}

/// Find the first fleet ship name mentioned anywhere in `text` (title or
/// message), case-insensitively. Used both by the log parser (to establish
/// ship context for speaker resolution) and by the query detector (to spot
/// direct ship-name matches in a search).
pub fn find_ship_mention(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    FLEET_SHIPS
        .iter()
        .find(|ship| lower.contains(*ship))
        .map(|s| title_case(s))
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_fleet_ship_with_uss_prefix() {
        assert!(is_fleet_ship("USS Stardancer"));
        assert!(is_fleet_ship("adagio"));
        assert!(!is_fleet_ship("Enterprise"));
    }

    #[test]
    fn finds_ship_mention_in_title() {
        assert_eq!(
            find_ship_mention("USS Stardancer Mission Log 42"),
            Some("Stardancer".to_string())
        );
        assert_eq!(find_ship_mention("General Federation History"), None);
    }

    #[test]
    fn log_category_for_unknown_ship_falls_back() {
        assert_eq!(ship_log_category("Enterprise"), "Mission Logs");
    }
}
