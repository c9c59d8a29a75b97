//! Narrator used with `--offline`.
//!
//! Acknowledges each action with a d20 roll and hands the state back
//! unchanged, so the rules commands can be exercised without an API key.

use async_trait::async_trait;
use companion_core::dice::roll;
use companion_core::narrative::{ChatMessage, ChatRole, NarrativeError, NarrativeTurn, Narrator};
use companion_core::state::GameState;

#[derive(Debug, Default)]
pub struct OfflineNarrator {
    turns: u32,
}

impl OfflineNarrator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Narrator for OfflineNarrator {
    async fn take_turn(
        &mut self,
        state: &GameState,
        _history: &[ChatMessage],
        message: &ChatMessage,
    ) -> Result<NarrativeTurn, NarrativeError> {
        self.turns += 1;

        let (narrative, dice_roll_details) = match message.role {
            ChatRole::System => ("The Dungeon Master notes the change.".to_string(), None),
            _ => {
                let check = roll("1d20");
                (
                    format!(
                        "You attempt it. With no Dungeon Master at the table, the d20 decides: {}.",
                        check.total
                    ),
                    Some(format!("Check: {check}")),
                )
            }
        };

        tracing::debug!(turn = self.turns, "offline turn");
        Ok(NarrativeTurn {
            narrative,
            game_state: state.clone(),
            dice_roll_details,
        })
    }
}
