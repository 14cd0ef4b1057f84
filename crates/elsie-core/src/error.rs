use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElsieError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("wiki client error: {0}")]
    Wiki(String),

    #[error("content processing error: {0}")]
    Content(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("page not found: {title}")]
    PageNotFound { title: String },

    #[error("session not found for channel: {channel_id}")]
    SessionNotFound { channel_id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ElsieError {
    /// Short error code, attached to structured log events and surfaced to
    /// the CLI's non-zero exit diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            ElsieError::Config(_) => "CONFIG_ERROR",
            ElsieError::Wiki(_) => "WIKI_ERROR",
            ElsieError::Content(_) => "CONTENT_ERROR",
            ElsieError::Database(_) => "DATABASE_ERROR",
            ElsieError::PageNotFound { .. } => "PAGE_NOT_FOUND",
            ElsieError::SessionNotFound { .. } => "SESSION_NOT_FOUND",
            ElsieError::Serialization(_) => "SERIALIZATION_ERROR",
            ElsieError::Io(_) => "IO_ERROR",
            ElsieError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ElsieError>;
