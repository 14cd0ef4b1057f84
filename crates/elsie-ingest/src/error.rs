use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("wiki client error: {0}")]
    Wiki(#[from] elsie_wiki::WikiError),
    #[error("content processing error: {0}")]
    Content(#[from] elsie_content::ContentError),
    #[error("store error: {0}")]
    Store(#[from] elsie_store::StoreError),
    #[error("could not reach the store after {attempts} attempts")]
    StoreUnavailable { attempts: u32 },
}

pub type Result<T> = std::result::Result<T, IngestError>;
