//! Pure, declarative mapping between wiki categories, page classification and
//! canonical character names. This crate has no knowledge of HTTP, SQL or the
//! conversation pipeline — it is a leaf every other component builds on.

pub mod fleet;
pub mod page_type;
pub mod resolve;

pub use fleet::{fleet_ship_names, is_fleet_ship, ship_log_category, ship_log_categories};
pub use page_type::PageType;
pub use resolve::resolve_character_name;

/// Default category attached to any page that cannot be classified more
/// specifically. Every persisted page carries at least this one.
pub const GENERAL_INFORMATION: &str = "General Information";

/// Categories that mark a page as being about a named character.
pub const CHARACTER_CATEGORIES: &[&str] = &["Characters", "Personnel", "Crew Members"];

/// Categories that mark a page as being about a starship.
pub const SHIP_CATEGORIES: &[&str] = &["Starships", "Federation Starships", "Ships"];

/// Convert a `(page_type, ship)` pair into the category set a search should
/// use to find pages of that kind. Mirrors the crawler's own classification
/// so the retrieval side and the ingestion side never disagree about what a
/// "ship log" or "personnel" page looks like.
pub fn convert_page_type_to_categories(page_type: PageType, ship: Option<&str>) -> Vec<String> {
    match page_type {
        PageType::MissionLog => match ship {
            Some(ship) if is_fleet_ship(ship) => vec![ship_log_category(ship)],
            _ => ship_log_categories(),
        },
        PageType::ShipInfo => SHIP_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        PageType::Personnel => CHARACTER_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        PageType::Location => vec!["Locations".to_string()],
        PageType::General => vec![GENERAL_INFORMATION.to_string()],
    }
}

/// True when any category string contains the substring "log" (case
/// insensitive). This is the single rule that routes a page to the log
/// parser instead of the general content formatter.
pub fn categories_indicate_log(categories: &[String]) -> bool {
    categories.iter().any(|c| c.to_lowercase().contains("log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mission_log_with_known_ship_uses_ship_category() {
        let cats = convert_page_type_to_categories(PageType::MissionLog, Some("Stardancer"));
        assert_eq!(cats, vec!["Stardancer Logs".to_string()]);
    }

    #[test]
    fn mission_log_without_ship_falls_back_to_all_log_categories() {
        let cats = convert_page_type_to_categories(PageType::MissionLog, None);
        assert!(cats.len() > 1);
        assert!(cats.iter().all(|c| c.to_lowercase().contains("log")));
    }

    #[test]
    fn general_page_gets_default_category() {
        let cats = convert_page_type_to_categories(PageType::General, None);
        assert_eq!(cats, vec![GENERAL_INFORMATION.to_string()]);
    }

    #[test]
    fn log_detection_is_case_insensitive() {
        assert!(categories_indicate_log(&["Stardancer LOGS".to_string()]));
        assert!(!categories_indicate_log(&["Starships".to_string()]));
    }
}
