//! Claude-backed narrator.

use super::{ChatMessage, ChatRole, NarrativeError, NarrativeTurn, Narrator, NarratorConfig};
use crate::state::GameState;
use async_trait::async_trait;
use claude::{Claude, Message, Request};
use companion_macros::Tool;
use serde::Deserialize;

/// Report the outcome of this turn: the narration, the complete updated game state, and any dice rolled.
#[derive(Debug, Deserialize, Tool)]
#[tool(name = "report_turn", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct ReportTurn {
    /// Narration shown to the player
    pub narrative: String,
    /// The complete game state after this turn
    #[tool(schema = "crate::state::game_state_schema")]
    pub game_state: GameState,
    /// Dice rolled this turn, one per line
    #[serde(default)]
    pub dice_roll_details: Option<String>,
}

/// Narrator that asks Claude for each turn through the forced
/// `report_turn` tool.
pub struct ClaudeNarrator {
    client: Claude,
    config: NarratorConfig,
}

impl ClaudeNarrator {
    pub fn new(client: Claude) -> Self {
        Self {
            client,
            config: NarratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: NarratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &NarratorConfig {
        &self.config
    }

    fn build_system_prompt(&self, state: &GameState) -> Result<String, NarrativeError> {
        let mut prompt = String::new();
        prompt.push_str(include_str!("prompts/narrator_base.txt"));
        prompt.push_str("\n\n");
        prompt.push_str(include_str!("prompts/game_state.txt"));
        prompt.push_str("\n\n");
        prompt.push_str(include_str!("prompts/dice.txt"));

        if let Some(ref custom) = self.config.custom_system_prompt {
            prompt.push_str("\n\n## Additional Instructions\n");
            prompt.push_str(custom);
        }

        prompt.push_str("\n\n## Current Game State\n```json\n");
        prompt.push_str(&serde_json::to_string_pretty(state)?);
        prompt.push_str("\n```\n");
        Ok(prompt)
    }

    fn build_request(
        &self,
        state: &GameState,
        history: &[ChatMessage],
        message: &ChatMessage,
    ) -> Result<Request, NarrativeError> {
        let mut request = Request::new(conversation(history, message))
            .with_system(self.build_system_prompt(state)?)
            .with_max_tokens(self.config.max_tokens);
        if let Some(ref model) = self.config.model {
            request = request.with_model(model);
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        Ok(request)
    }
}

#[async_trait]
impl Narrator for ClaudeNarrator {
    async fn take_turn(
        &mut self,
        state: &GameState,
        history: &[ChatMessage],
        message: &ChatMessage,
    ) -> Result<NarrativeTurn, NarrativeError> {
        let request = self.build_request(state, history, message)?;
        tracing::debug!(
            history = history.len(),
            model = self.config.model.as_deref().unwrap_or(self.client.model()),
            "requesting narrative turn"
        );

        let response = self
            .client
            .complete_structured(request, ReportTurn::as_tool())
            .await?;
        let report: ReportTurn = serde_json::from_value(response.input)?;

        let narrative = if report.narrative.trim().is_empty() {
            response.text
        } else {
            report.narrative
        };
        tracing::debug!(
            chars = narrative.len(),
            dice = report.dice_roll_details.is_some(),
            "narrative turn received"
        );

        Ok(NarrativeTurn {
            narrative,
            game_state: report.game_state,
            dice_roll_details: report.dice_roll_details,
        })
    }
}

/// Map the chat log onto the API's strictly alternating user/assistant turns.
///
/// Failed messages are dropped, system notices travel as tagged user text,
/// and consecutive messages from the same side are joined.
fn conversation(history: &[ChatMessage], message: &ChatMessage) -> Vec<Message> {
    let mut turns: Vec<(bool, String)> = Vec::new();

    for entry in history.iter().chain(std::iter::once(message)) {
        if entry.failed {
            continue;
        }
        let (from_user, text) = match entry.role {
            ChatRole::Player => (true, entry.text.clone()),
            ChatRole::System => (true, format!("[System] {}", entry.text)),
            ChatRole::Dm => (false, entry.text.clone()),
        };
        match turns.last_mut() {
            Some((last_user, last_text)) if *last_user == from_user => {
                last_text.push_str("\n\n");
                last_text.push_str(&text);
            }
            _ => turns.push((from_user, text)),
        }
    }

    if matches!(turns.first(), Some((false, _))) {
        turns.insert(0, (true, "[System] The session begins.".to_string()));
    }

    turns
        .into_iter()
        .map(|(from_user, text)| {
            if from_user {
                Message::user(text)
            } else {
                Message::assistant(text)
            }
        })
        .collect()
}
