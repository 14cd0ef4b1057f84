//! Orchestrates the wiki client, content processor and store into a
//! single crawl loop: resolve a scope to titles, skip ones that haven't
//! changed, process and upsert the rest.

pub mod error;
pub mod ingestor;
pub mod logdate;
pub mod mode;
pub mod report;

pub use error::{IngestError, Result};
pub use ingestor::Ingestor;
pub use mode::{IncrementalMode, Scope, CURATED_TITLES};
pub use report::IngestReport;
