//! Typed client over the remote MediaWiki query/parse endpoints, plus a
//! separate client for the external encyclopedic archive used as a
//! fallback when the local store has nothing.

pub mod archive;
pub mod client;
pub mod error;
pub mod types;

pub use archive::ArchiveClient;
pub use client::WikiClient;
pub use error::{Result, WikiError};
pub use types::{CombinedPageData, ParsedHtml, WikiSection};
