use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("store error: {0}")]
    Store(#[from] elsie_store::StoreError),
    #[error("archive error: {0}")]
    Archive(#[from] elsie_wiki::WikiError),
}

pub type Result<T> = std::result::Result<T, ConversationError>;
