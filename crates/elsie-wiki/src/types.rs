use serde::{Deserialize, Serialize};

/// Result of the combined extracts+info+revisions query for a single title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedPageData {
    pub title: String,
    pub page_id: i64,
    pub extract: String,
    pub raw_wikitext: String,
    pub categories: Vec<String>,
    pub canonical_url: String,
    pub touched: Option<String>,
    pub lastrevid: Option<i64>,
    pub page_exists: bool,
}

/// Result of `action=parse`, used only when the plain-text extract is
/// insufficient for structured extraction (infoboxes, sections).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedHtml {
    pub html: String,
    pub sections: Vec<WikiSection>,
    pub display_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiSection {
    pub anchor: String,
    pub heading: String,
    pub level: u8,
}
