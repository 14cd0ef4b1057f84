//! Per-channel roleplay state. One `SessionState` lives per channel for as
//! long as a roleplay session is active; the router owns the map from
//! channel id to session.

use std::collections::VecDeque;

use elsie_core::ChannelContext;

const TURN_HISTORY_CAPACITY: usize = 10;
const CONFIDENCE_HISTORY_CAPACITY: usize = 10;
const SUSTAINED_SHIFT_THRESHOLD: f32 = 0.15;
const SUSTAINED_SHIFT_WINDOW: usize = 3;
const EXIT_CONDITION_LIMIT: u32 = 2;

#[derive(Debug, Clone)]
pub struct Participant {
    pub name: String,
    pub source: String,
    pub first_turn: u64,
    pub last_turn: u64,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub is_roleplaying: bool,
    pub session_start_turn: u64,
    pub participants: Vec<Participant>,
    pub turn_history: VecDeque<(u64, String)>,
    pub last_character_elsie_addressed: Option<String>,
    pub last_character_spoke: Option<String>,
    pub confidence_history: VecDeque<f32>,
    pub exit_condition_count: u32,
    pub listening_mode: bool,
    pub listening_turn_count: u64,
    pub last_interjection_turn: u64,
    pub last_response_turn: u64,
    pub dgm_initiated: bool,
    pub dgm_characters: Vec<String>,
    pub channel_context: ChannelContext,
}

impl SessionState {
    pub fn new(channel_context: ChannelContext) -> Self {
        Self {
            is_roleplaying: false,
            session_start_turn: 0,
            participants: Vec::new(),
            turn_history: VecDeque::with_capacity(TURN_HISTORY_CAPACITY),
            last_character_elsie_addressed: None,
            last_character_spoke: None,
            confidence_history: VecDeque::with_capacity(CONFIDENCE_HISTORY_CAPACITY),
            exit_condition_count: 0,
            listening_mode: false,
            listening_turn_count: 0,
            last_interjection_turn: 0,
            last_response_turn: 0,
            dgm_initiated: false,
            dgm_characters: Vec::new(),
            channel_context,
        }
    }

    pub fn start_session(&mut self, turn: u64, dgm_characters: Option<Vec<String>>) {
        self.is_roleplaying = true;
        self.session_start_turn = turn;
        self.exit_condition_count = 0;
        self.confidence_history.clear();
        if let Some(chars) = dgm_characters {
            self.dgm_initiated = true;
            self.dgm_characters = chars;
        }
    }

    pub fn end_session(&mut self, reason: &str) {
        tracing::info!(channel = %self.channel_context.session_id, reason, "ending roleplay session");
        self.is_roleplaying = false;
        self.dgm_initiated = false;
        self.dgm_characters.clear();
        self.listening_mode = false;
        self.exit_condition_count = 0;
    }

    /// Adds a participant or, if the name is already present
    /// (case-insensitively), only refreshes its `last_turn`.
    pub fn add_participant(&mut self, name: &str, source: &str, turn: u64) {
        if let Some(existing) = self
            .participants
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
        {
            existing.last_turn = turn;
            return;
        }
        self.participants.push(Participant {
            name: name.to_string(),
            source: source.to_string(),
            first_turn: turn,
            last_turn: turn,
        });
    }

    pub fn mark_character_turn(&mut self, turn: u64, speaker: &str) {
        self.last_character_spoke = Some(speaker.to_string());
        if self.turn_history.len() == TURN_HISTORY_CAPACITY {
            self.turn_history.pop_front();
        }
        self.turn_history.push_back((turn, speaker.to_string()));
    }

    pub fn mark_response_turn(&mut self, turn: u64) {
        self.last_response_turn = turn;
        self.listening_turn_count = 0;
    }

    pub fn set_last_character_addressed(&mut self, name: &str) {
        self.last_character_elsie_addressed = Some(name.to_string());
    }

    /// A short, implicit continuation that doesn't need a fresh address:
    /// a brief message immediately following Elsie's own last turn, with no
    /// question and no new character bracket.
    pub fn is_simple_implicit_response(&self, current_turn: u64, message: &str) -> bool {
        current_turn.saturating_sub(self.last_response_turn) <= 1
            && message.split_whitespace().count() <= 6
            && !message.contains('?')
    }

    /// Whether Elsie should interject unprompted: every 5-8 turns of
    /// listening in DGM mode, 8-10 otherwise, or forced after a long
    /// silence (15 turns in DGM mode, 20 otherwise).
    pub fn should_interject_subtle_action(&self, turn: u64) -> bool {
        let since_last = turn.saturating_sub(self.last_interjection_turn);
        let (soft_min, soft_max, hard_cap) = if self.dgm_initiated { (5, 8, 15) } else { (8, 10, 20) };
        if since_last >= hard_cap {
            return true;
        }
        since_last >= soft_min && since_last <= soft_max && self.listening_mode
    }

    pub fn update_confidence(&mut self, confidence: f32) {
        if self.confidence_history.len() == CONFIDENCE_HISTORY_CAPACITY {
            self.confidence_history.pop_front();
        }
        self.confidence_history.push_back(confidence);
    }

    /// True when the last `SUSTAINED_SHIFT_WINDOW` confidence scores are all
    /// below threshold, signalling the conversation has drifted out of
    /// roleplay territory.
    pub fn check_sustained_topic_shift(&self) -> bool {
        if self.confidence_history.len() < SUSTAINED_SHIFT_WINDOW {
            return false;
        }
        self.confidence_history
            .iter()
            .rev()
            .take(SUSTAINED_SHIFT_WINDOW)
            .all(|c| *c < SUSTAINED_SHIFT_THRESHOLD)
    }

    pub fn should_exit_from_sustained_shift(&self) -> bool {
        self.check_sustained_topic_shift() || self.exit_condition_count >= EXIT_CONDITION_LIMIT
    }

    pub fn record_exit_condition(&mut self) {
        self.exit_condition_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionState {
        SessionState::new(ChannelContext::dm("test"))
    }

    #[test]
    fn adding_existing_participant_only_refreshes_last_turn() {
        let mut s = session();
        s.add_participant("Maeve", "bracket", 1);
        s.add_participant("maeve", "bracket", 5);
        assert_eq!(s.participants.len(), 1);
        assert_eq!(s.participants[0].first_turn, 1);
        assert_eq!(s.participants[0].last_turn, 5);
    }

    #[test]
    fn turn_history_is_bounded_to_ten() {
        let mut s = session();
        for i in 0..15u64 {
            s.mark_character_turn(i, "Maeve");
        }
        assert_eq!(s.turn_history.len(), 10);
        assert_eq!(s.turn_history.front().unwrap().0, 5);
    }

    #[test]
    fn sustained_topic_shift_requires_three_low_scores() {
        let mut s = session();
        s.update_confidence(0.5);
        s.update_confidence(0.1);
        s.update_confidence(0.05);
        assert!(!s.check_sustained_topic_shift());
        s.update_confidence(0.1);
        assert!(s.check_sustained_topic_shift());
    }

    #[test]
    fn should_exit_from_sustained_shift_also_triggers_on_exit_count() {
        let mut s = session();
        s.record_exit_condition();
        s.record_exit_condition();
        assert!(s.should_exit_from_sustained_shift());
    }
}
