//! Transient, request-scoped structures passed between the roleplay
//! detector, decision engine and context builder. None of this is
//! persisted — `Store` owns everything durable.

use std::collections::HashMap;

use elsie_core::ChannelContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    None,
    ActiveDialogue,
    SubtleService,
    GroupAcknowledgment,
    ImplicitResponse,
    SupportiveListen,
    TechnicalExpertise,
}

/// The decision engine's verdict for the current turn: whether to respond,
/// and the shape of the response if so.
#[derive(Debug, Clone)]
pub struct ResponseDecision {
    pub should_respond: bool,
    pub response_type: ResponseType,
    pub confidence: f32,
    pub reasoning: String,
    pub response_style: String,
    pub tone: String,
    pub approach: String,
    pub address_character: Option<String>,
    pub suggested_themes: Vec<String>,
    pub continuation_cues: Vec<String>,
    pub knowledge_to_use: Vec<String>,
    pub estimated_length: EstimatedLength,
    pub urgency: Urgency,
    pub scene_impact: SceneImpact,
}

impl ResponseDecision {
    pub fn no_response(reasoning: impl Into<String>) -> Self {
        Self {
            should_respond: false,
            response_type: ResponseType::None,
            confidence: 0.0,
            reasoning: reasoning.into(),
            response_style: String::new(),
            tone: String::new(),
            approach: String::new(),
            address_character: None,
            suggested_themes: Vec::new(),
            continuation_cues: Vec::new(),
            knowledge_to_use: Vec::new(),
            estimated_length: EstimatedLength::Short,
            urgency: Urgency::Low,
            scene_impact: SceneImpact::Minor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatedLength {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneImpact {
    Minor,
    Moderate,
    Major,
}

/// A known character's relationship profile, as surfaced to the decision
/// engine and prompt builder.
#[derive(Debug, Clone, Default)]
pub struct CharacterProfile {
    pub relationship: Relationship,
    pub notes: Vec<String>,
    pub preferences: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Relationship {
    #[default]
    Acquaintance,
    Friend,
    CloseFriend,
    SpecialAffection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntimacyLevel {
    Casual,
    Personal,
    Intimate,
}

#[derive(Debug, Clone, Default)]
pub struct AddressingContext {
    pub direct_mentions: Vec<String>,
    pub group_addressing: bool,
    pub service_requests: Vec<String>,
    pub other_interactions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConversationDynamics {
    pub emotional_tone: String,
    pub direction: String,
    pub intensity: f32,
    pub intimacy_level: IntimacyLevel,
    pub themes: Vec<String>,
    pub recent_events: Vec<String>,
}

impl Default for ConversationDynamics {
    fn default() -> Self {
        Self {
            emotional_tone: "neutral".to_string(),
            direction: "stable".to_string(),
            intensity: 0.0,
            intimacy_level: IntimacyLevel::Casual,
            themes: Vec::new(),
            recent_events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalityMode {
    Bartender,
    StellarCartographer,
    Counselor,
    ServiceOriented,
    Balanced,
}

/// Built by the router from the current message, session and turn history;
/// consumed by `DecisionEngine` and discarded once the directive is
/// dispatched.
#[derive(Debug, Clone)]
pub struct ContextualCues {
    pub current_message: String,
    pub current_speaker: Option<String>,
    pub known_characters: HashMap<String, CharacterProfile>,
    pub addressing_context: AddressingContext,
    pub conversation_dynamics: ConversationDynamics,
    pub personality_mode: PersonalityMode,
    pub current_expertise: Vec<String>,
    pub scene_setting: Option<String>,
    pub session_mode: bool,
    pub scene_control: Option<String>,
    pub channel_context: ChannelContext,
    pub recent_activity: Vec<(String, String)>,
}
