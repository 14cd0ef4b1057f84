//! Shared types, configuration and error handling used across every Elsie
//! crate: channel/session identifiers, the conversation `Role` enum, and the
//! `elsie.toml`-backed `ElsieConfig`.

pub mod config;
pub mod error;
pub mod types;

pub use config::ElsieConfig;
pub use error::{ElsieError, Result};
pub use types::{ChannelContext, ChannelId, ChannelType, Role};
