//! CompanionSession - the primary public API for play.
//!
//! This module ties the narrator, the authoritative [`GameState`] and the
//! chat log together. Every narrated turn replaces the state wholesale; a
//! failed turn leaves it untouched and records the failure in the log.

use crate::narrative::{ChatMessage, NarrativeError, Narrator};
use crate::progression::{apply_level_up, level_up_sync_message, LevelUpChoices, LevelUpError};
use crate::rules::CharacterSheet;
use crate::state::GameState;
use thiserror::Error;

/// Chat notice appended when a turn does not complete.
pub const CONNECTION_FAILED: &str = "Connection failed";

/// Errors from CompanionSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Level up rejected: {0}")]
    LevelUp(#[from] LevelUpError),

    #[error("Message is empty")]
    EmptyMessage,
}

/// Result of a single turn.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The narrator answered and the state was replaced.
    Narrated {
        narrative: String,
        dice_roll_details: Option<String>,
    },
    /// The narrator failed; the state is unchanged.
    Failed(NarrativeError),
}

impl TurnOutcome {
    pub fn is_narrated(&self) -> bool {
        matches!(self, TurnOutcome::Narrated { .. })
    }

    pub fn narrative(&self) -> Option<&str> {
        match self {
            TurnOutcome::Narrated { narrative, .. } => Some(narrative.as_str()),
            TurnOutcome::Failed(_) => None,
        }
    }
}

/// A play session.
///
/// Turns run one at a time; every operation that reaches the narrator
/// takes `&mut self`.
pub struct CompanionSession<N: Narrator> {
    narrator: N,
    state: GameState,
    log: Vec<ChatMessage>,
}

impl<N: Narrator> CompanionSession<N> {
    pub fn new(narrator: N, state: GameState) -> Self {
        Self {
            narrator,
            state,
            log: Vec::new(),
        }
    }

    /// Send a player message and merge the narrator's answer.
    pub async fn player_action(&mut self, text: &str) -> Result<TurnOutcome, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        Ok(self.send(ChatMessage::player(text)).await)
    }

    /// Apply a level-up locally, then tell the narrator about it.
    ///
    /// The advanced character is kept even if the sync turn fails.
    pub async fn level_up(&mut self, choices: &LevelUpChoices) -> Result<TurnOutcome, SessionError> {
        let before = self.state.character.clone();
        let after = apply_level_up(&before, choices)?;
        let message = level_up_sync_message(&before, &after);
        self.state.character = after;
        Ok(self.send(ChatMessage::system(message)).await)
    }

    async fn send(&mut self, message: ChatMessage) -> TurnOutcome {
        let history_len = self.log.len();
        self.log.push(message);
        let (history, pending) = self.log.split_at(history_len);

        let result = self
            .narrator
            .take_turn(&self.state, history, &pending[0])
            .await;

        match result {
            Ok(turn) => {
                self.state = turn.game_state;
                self.log.push(
                    ChatMessage::dm(turn.narrative.clone()).with_dice(turn.dice_roll_details.clone()),
                );
                TurnOutcome::Narrated {
                    narrative: turn.narrative,
                    dice_roll_details: turn.dice_roll_details,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "narrative turn failed");
                self.log[history_len].failed = true;
                let mut notice = ChatMessage::system(CONNECTION_FAILED);
                notice.failed = true;
                self.log.push(notice);
                TurnOutcome::Failed(err)
            }
        }
    }

    /// Derive the character sheet from the current state.
    pub fn sheet(&self) -> CharacterSheet {
        CharacterSheet::derive(&self.state.character)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access bypasses the narrator; nothing is synced.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn log(&self) -> &[ChatMessage] {
        &self.log
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    pub fn narrator_mut(&mut self) -> &mut N {
        &mut self.narrator
    }

    pub fn player_name(&self) -> &str {
        &self.state.character.name
    }

    pub fn in_combat(&self) -> bool {
        self.state.in_combat()
    }

    /// Current and maximum hit points.
    pub fn hp_status(&self) -> (i32, i32) {
        let hp = self.state.character.hit_points;
        (hp.current, hp.maximum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::ChatRole;
    use crate::testing::{assert_failed_turn, mock_session};

    #[tokio::test]
    async fn test_turn_appends_dm_message() {
        let mut session = mock_session();
        session.narrator_mut().queue_dice("You see a dragon!", "Spot: 1d20+1 = 12");

        let outcome = session.player_action("I look around").await.unwrap();

        assert_eq!(outcome.narrative(), Some("You see a dragon!"));
        let log = session.log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, ChatRole::Player);
        assert_eq!(log[1].role, ChatRole::Dm);
        assert_eq!(log[1].dice_roll_details.as_deref(), Some("Spot: 1d20+1 = 12"));
    }

    #[tokio::test]
    async fn test_failure_leaves_state() {
        let mut session = mock_session();
        session.narrator_mut().queue_failure("timeout");
        let before = session.state().clone();

        let outcome = session.player_action("I open the door").await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Failed(_)));
        assert_eq!(session.state(), &before);
        assert_failed_turn(&session);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let mut session = mock_session();
        assert!(matches!(
            session.player_action("   ").await,
            Err(SessionError::EmptyMessage)
        ));
        assert!(session.log().is_empty());
        assert!(session.narrator().received().is_empty());
    }
}
