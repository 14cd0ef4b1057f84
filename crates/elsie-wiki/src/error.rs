use thiserror::Error;

/// Errors surfaced by `WikiClient`. Every variant maps to the `RemoteUnavailable`
/// / `RemoteMalformed` error kinds in the project notes — callers are expected
/// to treat both as "no content available" rather than crash.
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("network error contacting wiki API: {0}")]
    Network(#[from] reqwest::Error),

    #[error("wiki API returned HTTP {status}")]
    Http { status: u16 },

    #[error("malformed JSON response from wiki API: {0}")]
    Malformed(String),

    #[error("page not found: {title}")]
    PageAbsent { title: String },
}

impl WikiError {
    /// True for anything that should be treated as `RemoteUnavailable`:
    /// network failures, bad status codes and malformed payloads all fold
    /// into the same "nothing came back" bucket for callers.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, WikiError::PageAbsent { .. })
    }
}

pub type Result<T> = std::result::Result<T, WikiError>;
