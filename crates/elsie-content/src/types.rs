use elsie_category::PageType;

/// The formatted, storage-ready form of a wiki page: markdown body plus the
/// classification facts the store and retrieval layers need without having
/// to re-derive them from raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPage {
    pub title: String,
    pub page_type: PageType,
    pub ship: Option<String>,
    pub content: String,
    pub categories: Vec<String>,
}
