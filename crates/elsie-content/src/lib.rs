//! Content formatting: turns raw wiki fetch results into the markdown bodies
//! and classification facts the store persists, including dedicated
//! line-by-line attribution for mission log transcripts.

pub mod error;
pub mod log_parser;
pub mod processor;
pub mod types;
pub mod wikitext;

pub use error::{ContentError, Result};
pub use log_parser::{parse_log, render_log, LogTurn};
pub use processor::process_page;
pub use types::ProcessedPage;
pub use wikitext::wikitext_to_markdown;
