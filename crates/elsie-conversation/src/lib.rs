//! Conversation router and retrieval engine: mode detection, roleplay and
//! DGM handling, response decisioning, context retrieval, and prompt
//! assembly for the external LLM.

pub mod context_builder;
pub mod decision;
pub mod error;
pub mod query_detector;
pub mod roleplay_detector;
pub mod router;
pub mod session;
pub mod types;

pub use context_builder::{ContextBuilder, RetrievedContext, Strategy};
pub use error::{ConversationError, Result};
pub use query_detector::QueryKind;
pub use roleplay_detector::{DgmAction, RoleplaySignal};
pub use router::{ResponseDirective, Router};
pub use session::SessionState;
