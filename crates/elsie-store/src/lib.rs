//! Postgres-backed persistence for wiki pages and their crawl metadata:
//! content-hash deduped upserts, chunked storage for oversized pages, and
//! layered full-text/category search.

pub mod chunk;
pub mod error;
pub mod hash;
pub mod schema;
pub mod store;
pub mod types;

pub use chunk::chunk_content;
pub use error::{Result, StoreError};
pub use hash::content_hash;
pub use store::Store;
pub use types::{LogSelection, NewPage, PageStatus, SearchFilter, WikiPageRow};
