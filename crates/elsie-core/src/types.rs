use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a channel/thread/DM the router keeps session state
/// for. Callers own the format (Discord snowflake, CLI session name, …); this
/// crate only needs it as a stable map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Broad shape of the channel a turn arrived on. Drives the roleplay
/// channel gate: permissive in DMs/threads/private channels, restrictive in
/// named general/announcement channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Dm,
    Thread,
    Private,
    General,
    Unknown,
}

impl ChannelType {
    /// Roleplay is allowed by default here; `General` is the only type a
    /// caller must explicitly permit via channel configuration.
    pub fn permits_roleplay_by_default(&self) -> bool {
        !matches!(self, ChannelType::General)
    }
}

/// Everything the decision engine and context builder need to know about
/// where a turn came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelContext {
    pub channel_type: ChannelType,
    pub is_thread: bool,
    pub is_dm: bool,
    pub name: Option<String>,
    pub session_id: ChannelId,
}

impl ChannelContext {
    pub fn dm(session_id: impl Into<ChannelId>) -> Self {
        Self {
            channel_type: ChannelType::Dm,
            is_thread: false,
            is_dm: true,
            name: None,
            session_id: session_id.into(),
        }
    }

    pub fn general(session_id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Self {
            channel_type: ChannelType::General,
            is_thread: false,
            is_dm: false,
            name: Some(name.into()),
            session_id: session_id.into(),
        }
    }
}

/// Who spoke a given turn, for conversation history rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Elsie,
    Narrator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Elsie => write!(f, "elsie"),
            Role::Narrator => write!(f, "narrator"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_channel_does_not_permit_roleplay_by_default() {
        assert!(!ChannelType::General.permits_roleplay_by_default());
        assert!(ChannelType::Dm.permits_roleplay_by_default());
        assert!(ChannelType::Unknown.permits_roleplay_by_default());
    }
}
