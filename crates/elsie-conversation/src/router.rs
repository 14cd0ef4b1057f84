//! Top-level entry point. Resolves per-channel session state, runs the
//! roleplay and DGM handling, and dispatches to either the roleplay or
//! standard handler to produce a `ResponseDirective`.

use std::collections::HashMap;

use tokio::sync::Mutex;

use elsie_category::fleet::find_ship_mention;
use elsie_core::{ChannelContext, ChannelId};
use elsie_store::SearchFilter;

use crate::context_builder::{ContextBuilder, Strategy};
use crate::decision;
use crate::query_detector::{self, QueryKind};
use crate::roleplay_detector::{self, DgmAction};
use crate::session::SessionState;
use crate::types::{AddressingContext, ContextualCues, ConversationDynamics, PersonalityMode, ResponseDecision};

#[derive(Debug, Clone)]
pub enum ResponseDirective {
    LiteralReply(String),
    InvokeLlm { prompt: String, is_ooc: bool },
    NoResponse,
}

pub struct Router {
    context_builder: ContextBuilder,
    sessions: Mutex<HashMap<ChannelId, SessionState>>,
}

impl Router {
    pub fn new(context_builder: ContextBuilder) -> Self {
        Self { context_builder, sessions: Mutex::new(HashMap::new()) }
    }

    pub async fn route(
        &self,
        user_message: &str,
        conversation_history: &[(String, String)],
        channel_context: ChannelContext,
    ) -> ResponseDirective {
        let turn = conversation_history.len() as u64 + 1;
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .entry(channel_context.session_id.clone())
            .or_insert_with(|| SessionState::new(channel_context.clone()));

        if let Some(action) = roleplay_detector::parse_dgm(user_message) {
            return self.handle_dgm(session, action, turn);
        }

        let channel_allows = roleplay_detector::channel_allows_roleplay(&channel_context);
        let signal = if channel_allows {
            roleplay_detector::detect(user_message, &channel_context)
        } else {
            roleplay_detector::RoleplaySignal { is_roleplay: false, confidence: 0.0, triggers: Vec::new() }
        };

        if session.is_roleplaying || (channel_allows && signal.is_roleplay) {
            if !session.is_roleplaying {
                session.start_session(turn, None);
            }
            self.handle_roleplay_turn(session, user_message, conversation_history, signal.confidence, turn).await
        } else {
            self.handle_standard_turn(user_message, conversation_history).await
        }
    }

    fn handle_dgm(&self, session: &mut SessionState, action: DgmAction, turn: u64) -> ResponseDirective {
        match action {
            DgmAction::ElsieControlled(content) => {
                session.start_session(turn, None);
                session.mark_character_turn(turn, "Elsie");
                tracing::debug!(%content, "DGM spoke as Elsie");
                ResponseDirective::NoResponse
            }
            DgmAction::EndScene => {
                session.end_session("dgm end scene marker");
                ResponseDirective::NoResponse
            }
            DgmAction::SceneSetting { characters } => {
                session.start_session(turn, Some(characters.clone()));
                for name in &characters {
                    session.add_participant(name, "dgm_scene_setting", turn);
                }
                ResponseDirective::NoResponse
            }
        }
    }

    async fn handle_roleplay_turn(
        &self,
        session: &mut SessionState,
        message: &str,
        history: &[(String, String)],
        signal_confidence: f32,
        turn: u64,
    ) -> ResponseDirective {
        session.update_confidence(signal_confidence);

        if roleplay_detector::is_exit_condition(message) {
            session.record_exit_condition();
        }
        if session.should_exit_from_sustained_shift() {
            session.end_session("sustained topic shift or repeated exit conditions");
            return ResponseDirective::NoResponse;
        }

        let cues = build_contextual_cues(message, session, history);
        let decision = decision::decide(&cues, session);

        if !decision.should_respond {
            return ResponseDirective::NoResponse;
        }

        session.mark_response_turn(turn);
        if let Some(name) = &decision.address_character {
            session.set_last_character_addressed(name);
        }

        if let Some(reply) = canned_roleplay_reply(message) {
            return ResponseDirective::LiteralReply(reply);
        }

        let strategy = if session.listening_mode {
            Strategy::RoleplayListening
        } else if session.is_simple_implicit_response(turn, message) {
            Strategy::FocusedContinuation
        } else {
            Strategy::RoleplayActive
        };

        let retrieved = if decision.knowledge_to_use.is_empty() {
            crate::context_builder::RetrievedContext { found: false, source: String::new(), sections: Vec::new() }
        } else {
            self.context_builder
                .retrieve(message, SearchFilter::with_limit(3))
                .await
        };

        let prompt = self
            .context_builder
            .build_prompt(strategy, &cues, &decision, &retrieved, history);
        ResponseDirective::InvokeLlm { prompt, is_ooc: false }
    }

    async fn handle_standard_turn(&self, message: &str, history: &[(String, String)]) -> ResponseDirective {
        let kind = query_detector::detect(message);

        if let Some(reply) = canned_standard_reply(kind) {
            return ResponseDirective::LiteralReply(reply);
        }

        let (strategy, filter) = standard_strategy(kind, message);
        let is_ooc = matches!(kind, QueryKind::Ooc);
        let retrieved = self.context_builder.retrieve(message, filter).await;
        let cues = bare_cues(message);
        let decision = ResponseDecision {
            should_respond: true,
            ..standard_decision_template()
        };
        let prompt = self.context_builder.build_prompt(strategy, &cues, &decision, &retrieved, history);
        ResponseDirective::InvokeLlm { prompt, is_ooc }
    }
}

fn standard_decision_template() -> ResponseDecision {
    let mut decision = ResponseDecision::no_response("standard query");
    decision.response_style = "factual, concise".to_string();
    decision.tone = "informative".to_string();
    decision.approach = "answer from retrieved context only".to_string();
    decision
}

fn bare_cues(message: &str) -> ContextualCues {
    ContextualCues {
        current_message: message.to_string(),
        current_speaker: None,
        known_characters: HashMap::new(),
        addressing_context: AddressingContext::default(),
        conversation_dynamics: ConversationDynamics::default(),
        personality_mode: PersonalityMode::Balanced,
        current_expertise: Vec::new(),
        scene_setting: None,
        session_mode: false,
        scene_control: None,
        channel_context: ChannelContext::dm("standard"),
        recent_activity: Vec::new(),
    }
}

fn build_contextual_cues(message: &str, session: &SessionState, history: &[(String, String)]) -> ContextualCues {
    let addressing_context = decision::build_addressing_context(message);
    let recent_activity = history
        .iter()
        .rev()
        .take(5)
        .map(|(role, content)| (role.clone(), content.clone()))
        .collect();
    ContextualCues {
        current_message: message.to_string(),
        current_speaker: session.last_character_spoke.clone(),
        known_characters: HashMap::new(),
        addressing_context,
        conversation_dynamics: ConversationDynamics::default(),
        personality_mode: PersonalityMode::Balanced,
        current_expertise: Vec::new(),
        scene_setting: None,
        session_mode: session.is_roleplaying,
        scene_control: session.last_character_elsie_addressed.clone(),
        channel_context: session.channel_context.clone(),
        recent_activity,
    }
}

fn canned_roleplay_reply(message: &str) -> Option<String> {
    let lower = message.to_lowercase();
    if lower.contains("menu") {
        return Some("*slides a menu across the bar* Take your pick.".to_string());
    }
    None
}

fn canned_standard_reply(kind: QueryKind) -> Option<String> {
    match kind {
        QueryKind::SimpleGreeting => Some("Hello there. What can I get you?".to_string()),
        QueryKind::SimpleFarewell => Some("Safe travels.".to_string()),
        QueryKind::SimpleStatus => Some("Systems nominal, thanks for asking.".to_string()),
        QueryKind::MenuRequest => Some("We've got the usual: synthehol, raktajino, and a few house specials.".to_string()),
        QueryKind::ResetRequest => Some("Starting fresh.".to_string()),
        QueryKind::SimpleConversational => Some("Mm-hm.".to_string()),
        _ => None,
    }
}

fn standard_strategy(kind: QueryKind, message: &str) -> (Strategy, SearchFilter) {
    let mut filter = SearchFilter::with_limit(5);
    let strategy = match kind {
        QueryKind::Character | QueryKind::CharacterPlusLog => Strategy::Character,
        QueryKind::FederationArchives => Strategy::FederationArchives,
        QueryKind::Log | QueryKind::SpecificLog | QueryKind::LogUrl => Strategy::Logs,
        QueryKind::TellMeAbout => Strategy::TellMeAbout,
        QueryKind::StardancerInfo => Strategy::StardancerInfo,
        QueryKind::StardancerCommand => Strategy::StardancerCommand,
        QueryKind::ShipLog | QueryKind::ShipPlusLog => {
            filter.force_mission_logs_only = true;
            Strategy::ShipLogs
        }
        QueryKind::Ooc => Strategy::Ooc,
        QueryKind::Continuation => Strategy::FocusedContinuation,
        _ => Strategy::GeneralWithContext,
    };
    if find_ship_mention(message).is_some() {
        filter.ship_name = find_ship_mention(message);
    }
    (strategy, filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_strategy_forces_mission_logs_for_ship_log_query() {
        let (strategy, filter) = standard_strategy(QueryKind::ShipPlusLog, "show me the Adagio logs");
        assert!(matches!(strategy, Strategy::ShipLogs));
        assert!(filter.force_mission_logs_only);
    }

    #[test]
    fn canned_standard_reply_covers_greeting() {
        assert!(canned_standard_reply(QueryKind::SimpleGreeting).is_some());
        assert!(canned_standard_reply(QueryKind::General).is_none());
    }
}
