use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification assigned to every crawled wiki page.
///
/// `MissionLog` is the only variant with load-bearing downstream behaviour:
/// it routes `ContentProcessor` into the line-by-line log parser instead of
/// the generic markdown formatter, and it is the only variant expected to
/// carry a `log_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    MissionLog,
    ShipInfo,
    Personnel,
    Location,
    General,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::MissionLog => "mission_log",
            PageType::ShipInfo => "ship_info",
            PageType::Personnel => "personnel",
            PageType::Location => "location",
            PageType::General => "general",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mission_log" => Ok(PageType::MissionLog),
            "ship_info" => Ok(PageType::ShipInfo),
            "personnel" => Ok(PageType::Personnel),
            "location" => Ok(PageType::Location),
            "general" => Ok(PageType::General),
            _ => Err(()),
        }
    }
}

/// Classify a page from its wiki categories.
///
/// This is intentionally conservative: when categories give no clear signal
/// (an empty or genuinely ambiguous category set) the page defaults to
/// `General` rather than guessing, matching the `ClassificationAmbiguous`
/// error-kind contract — classification never fails, it degrades.
pub fn classify_from_categories(categories: &[String]) -> PageType {
    let lower: Vec<String> = categories.iter().map(|c| c.to_lowercase()).collect();

    if lower.iter().any(|c| c.contains("log")) {
        return PageType::MissionLog;
    }
    if lower
        .iter()
        .any(|c| super::SHIP_CATEGORIES.iter().any(|sc| c.contains(&sc.to_lowercase())))
    {
        return PageType::ShipInfo;
    }
    if lower
        .iter()
        .any(|c| super::CHARACTER_CATEGORIES.iter().any(|cc| c.contains(&cc.to_lowercase())))
    {
        return PageType::Personnel;
    }
    if lower.iter().any(|c| c.contains("location") || c.contains("planet") || c.contains("station")) {
        return PageType::Location;
    }
    PageType::General
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_categories_default_to_general() {
        assert_eq!(classify_from_categories(&[]), PageType::General);
        assert_eq!(
            classify_from_categories(&["Miscellaneous".to_string()]),
            PageType::General
        );
    }

    #[test]
    fn log_category_wins_even_when_mixed_with_others() {
        let cats = vec!["Starships".to_string(), "Stardancer Logs".to_string()];
        assert_eq!(classify_from_categories(&cats), PageType::MissionLog);
    }

    #[test]
    fn display_roundtrips_through_from_str() {
        for pt in [
            PageType::MissionLog,
            PageType::ShipInfo,
            PageType::Personnel,
            PageType::Location,
            PageType::General,
        ] {
            assert_eq!(pt.as_str().parse::<PageType>().unwrap(), pt);
        }
    }
}
