use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("page has no usable content (empty extract and wikitext)")]
    Empty,
    #[error("wiki client error: {0}")]
    Wiki(#[from] elsie_wiki::WikiError),
}

pub type Result<T> = std::result::Result<T, ContentError>;
