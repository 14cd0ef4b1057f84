//! Pulls the in-title date out of a mission-log page title, e.g.
//! `"USS Stardancer Mission Log 2026/3/14"` or `"...03/14/2026"`.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static YMD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})/(\d{1,2})/(\d{1,2})").unwrap());
static MDY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap());

pub fn extract_log_date(title: &str) -> Option<NaiveDate> {
    if let Some(caps) = YMD.captures(title) {
        return NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
    }
    if let Some(caps) = MDY.captures(title) {
        return NaiveDate::from_ymd_opt(caps[3].parse().ok()?, caps[1].parse().ok()?, caps[2].parse().ok()?);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_year_first_date() {
        assert_eq!(
            extract_log_date("USS Stardancer Mission Log 2026/3/14"),
            NaiveDate::from_ymd_opt(2026, 3, 14)
        );
    }

    #[test]
    fn extracts_month_first_date() {
        assert_eq!(
            extract_log_date("USS Adagio Mission Log 03/14/2026"),
            NaiveDate::from_ymd_opt(2026, 3, 14)
        );
    }

    #[test]
    fn returns_none_when_no_date_present() {
        assert_eq!(extract_log_date("USS Stardancer"), None);
    }
}
