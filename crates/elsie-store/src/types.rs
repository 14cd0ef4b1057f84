use chrono::{DateTime, NaiveDate, Utc};
use elsie_category::PageType;
use serde::{Deserialize, Serialize};

/// A page as it is handed to `Store::upsert_page`, already run through
/// `elsie-content`'s processor — the store itself does no formatting.
#[derive(Debug, Clone)]
pub struct NewPage {
    pub title: String,
    pub url: String,
    pub raw_content: String,
    pub page_type: PageType,
    pub ship_name: Option<String>,
    pub log_date: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub lastrevid: Option<i64>,
    pub touched: Option<String>,
}

/// A persisted row from `wiki_pages`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WikiPageRow {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub raw_content: String,
    pub page_type: String,
    pub ship_name: Option<String>,
    pub log_date: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub content_hash: String,
    pub lastrevid: Option<i64>,
    pub touched: Option<String>,
    pub content_accessed: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Active,
    Error,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Active => "active",
            PageStatus::Error => "error",
        }
    }
}

/// Filters accepted by `Store::search_pages`.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub page_type: Option<PageType>,
    pub ship_name: Option<String>,
    pub limit: i64,
    pub force_mission_logs_only: bool,
    pub categories: Vec<String>,
}

impl SearchFilter {
    pub fn with_limit(limit: i64) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }
}

/// Date-bucket selection for `Store::get_selected_logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSelection {
    Latest,
    Earliest,
    Random,
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
}
