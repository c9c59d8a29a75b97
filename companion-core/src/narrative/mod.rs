//! The narrative service seam.
//!
//! A [`Narrator`] takes the chat so far plus one new message and returns
//! prose together with the authoritative game state. The real
//! implementation talks to Claude; tests use [`crate::testing::MockNarrator`].

mod claude_narrator;

pub use claude_narrator::{ClaudeNarrator, ReportTurn};

use crate::state::GameState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a narrative turn.
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("Claude API error: {0}")]
    Api(#[from] claude::Error),

    #[error("Malformed turn report: {0}")]
    InvalidTurn(#[from] serde_json::Error),

    #[error("Narrator unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    Player,
    Dm,
    /// Out-of-band notices such as level-up syncs.
    System,
}

/// One line of the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    /// Set on a message whose turn never completed, and on the local
    /// notice reporting that. Failed messages are not sent back upstream.
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub dice_roll_details: Option<String>,
}

impl ChatMessage {
    pub fn player(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Player, text)
    }

    pub fn dm(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Dm, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(ChatRole::System, text)
    }

    fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            failed: false,
            dice_roll_details: None,
        }
    }

    pub fn with_dice(mut self, details: Option<String>) -> Self {
        self.dice_roll_details = details;
        self
    }
}

/// What the narrative service returns for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeTurn {
    pub narrative: String,
    pub game_state: GameState,
    #[serde(default)]
    pub dice_roll_details: Option<String>,
}

/// Configuration for a narrator.
#[derive(Debug, Clone)]
pub struct NarratorConfig {
    /// Defaults to the client's model.
    pub model: Option<String>,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
    /// Appended to the built-in prompt.
    pub custom_system_prompt: Option<String>,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 4096,
            temperature: Some(0.8),
            custom_system_prompt: None,
        }
    }
}

impl NarratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_system_prompt = Some(prompt.into());
        self
    }
}

/// A black-box turn function.
///
/// `history` is the chat before `message`; implementations must not assume
/// it alternates between player and DM.
#[async_trait]
pub trait Narrator: Send {
    async fn take_turn(
        &mut self,
        state: &GameState,
        history: &[ChatMessage],
        message: &ChatMessage,
    ) -> Result<NarrativeTurn, NarrativeError>;
}
