use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("page not found: {title}")]
    NotFound { title: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
