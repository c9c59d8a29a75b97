//! Testing utilities.
//!
//! This module provides tools for deterministic tests:
//! - `ScriptedDice` for replaying exact die results
//! - `MockNarrator` for scripted narrative turns without API calls
//! - Sample characters and assertion helpers

use crate::character::{Ability, Character, CharacterClass, FeatSelection, Race};
use crate::character_builder::CharacterBuilder;
use crate::dice::DieSource;
use crate::narrative::{ChatMessage, NarrativeError, NarrativeTurn, Narrator};
use crate::session::CompanionSession;
use crate::state::GameState;
use async_trait::async_trait;
use std::collections::VecDeque;

/// A die source that replays a fixed sequence, cycling when exhausted.
///
/// Values are clamped into `1..=sides` for the die being rolled.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    values: Vec<u32>,
    index: usize,
}

impl ScriptedDice {
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }

    /// Every die shows `value`.
    pub fn always(value: u32) -> Self {
        Self::new(vec![value])
    }

    /// Number of dice rolled so far.
    pub fn rolls(&self) -> usize {
        self.index
    }
}

impl DieSource for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let value = if self.values.is_empty() {
            1
        } else {
            self.values[self.index % self.values.len()]
        };
        self.index += 1;
        value.clamp(1, sides.max(1))
    }
}

/// A scripted reply from the mock narrator.
#[derive(Debug, Clone)]
pub enum MockTurn {
    /// Narrate, keeping the state the session sent.
    Narrative(String),
    /// Narrate and hand back a new state.
    WithState { narrative: String, state: GameState },
    /// Narrate with dice details, keeping the state.
    WithDice { narrative: String, dice: String },
    /// Fail the turn.
    Failure(String),
}

/// What the mock narrator was asked, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedTurn {
    pub state: GameState,
    pub history: Vec<ChatMessage>,
    pub message: ChatMessage,
}

/// A narrator that returns scripted turns.
///
/// Use this for deterministic session tests without API calls. Once the
/// script runs out every turn echoes the incoming state with a fixed line.
#[derive(Debug, Default)]
pub struct MockNarrator {
    turns: VecDeque<MockTurn>,
    received: Vec<ReceivedTurn>,
}

impl MockNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turns(turns: impl IntoIterator<Item = MockTurn>) -> Self {
        Self {
            turns: turns.into_iter().collect(),
            received: Vec::new(),
        }
    }

    pub fn queue_narrative(&mut self, text: impl Into<String>) -> &mut Self {
        self.turns.push_back(MockTurn::Narrative(text.into()));
        self
    }

    pub fn queue_state(&mut self, text: impl Into<String>, state: GameState) -> &mut Self {
        self.turns.push_back(MockTurn::WithState {
            narrative: text.into(),
            state,
        });
        self
    }

    pub fn queue_dice(&mut self, text: impl Into<String>, dice: impl Into<String>) -> &mut Self {
        self.turns.push_back(MockTurn::WithDice {
            narrative: text.into(),
            dice: dice.into(),
        });
        self
    }

    pub fn queue_failure(&mut self, reason: impl Into<String>) -> &mut Self {
        self.turns.push_back(MockTurn::Failure(reason.into()));
        self
    }

    pub fn received(&self) -> &[ReceivedTurn] {
        &self.received
    }

    pub fn last_received(&self) -> Option<&ReceivedTurn> {
        self.received.last()
    }

    pub fn remaining(&self) -> usize {
        self.turns.len()
    }
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn take_turn(
        &mut self,
        state: &GameState,
        history: &[ChatMessage],
        message: &ChatMessage,
    ) -> Result<NarrativeTurn, NarrativeError> {
        self.received.push(ReceivedTurn {
            state: state.clone(),
            history: history.to_vec(),
            message: message.clone(),
        });

        let turn = self
            .turns
            .pop_front()
            .unwrap_or_else(|| MockTurn::Narrative("The DM has no more scripted turns.".to_string()));

        match turn {
            MockTurn::Narrative(narrative) => Ok(NarrativeTurn {
                narrative,
                game_state: state.clone(),
                dice_roll_details: None,
            }),
            MockTurn::WithState { narrative, state } => Ok(NarrativeTurn {
                narrative,
                game_state: state,
                dice_roll_details: None,
            }),
            MockTurn::WithDice { narrative, dice } => Ok(NarrativeTurn {
                narrative,
                game_state: state.clone(),
                dice_roll_details: Some(dice),
            }),
            MockTurn::Failure(reason) => Err(NarrativeError::Unavailable(reason)),
        }
    }
}

// ============================================================================
// Sample characters
// ============================================================================

/// A level-1 human fighter with the standard kit.
pub fn sample_fighter(name: &str) -> Character {
    let mut character = Character::new(name, Race::Human, CharacterClass::Fighter);
    character.ability_scores = crate::character::AbilityScores::new(15, 13, 14, 10, 12, 8);
    character.hit_points = crate::character::HitPoints::new(12);
    character.feats = vec![
        FeatSelection::new("Power Attack"),
        FeatSelection::new("Cleave"),
        FeatSelection::targeted("Weapon Focus", "Longsword"),
    ];
    character.skills.insert("Climb".to_string(), 4);
    character.skills.insert("Intimidate".to_string(), 4);
    character.inventory = ["Longsword", "Chainmail", "Heavy Steel Shield", "Backpack", "Torch (3)", "40 gp"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    character
}

/// A level-1 elf wizard built through [`CharacterBuilder`].
#[track_caller]
pub fn sample_wizard(name: &str) -> Character {
    CharacterBuilder::new()
        .name(name)
        .race(Race::Elf)
        .class(CharacterClass::Wizard)
        .standard_array([
            (15, Ability::Intelligence),
            (14, Ability::Dexterity),
            (13, Ability::Constitution),
            (12, Ability::Wisdom),
            (10, Ability::Charisma),
            (8, Ability::Strength),
        ])
        .feat(FeatSelection::new("Improved Initiative"))
        .build()
        .expect("sample wizard should satisfy the builder")
}

/// A session over a mock narrator with [`sample_fighter`].
pub fn mock_session() -> CompanionSession<MockNarrator> {
    CompanionSession::new(MockNarrator::new(), GameState::new(sample_fighter("Test Hero")))
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the character's hit points.
#[track_caller]
pub fn assert_hp(character: &Character, current: i32, max: i32) {
    let hp = character.hit_points;
    assert_eq!(
        (hp.current, hp.maximum),
        (current, max),
        "Expected HP {current}/{max}, got {}/{}",
        hp.current,
        hp.maximum
    );
}

/// Assert the chat log ends with a failed player message and the
/// connection notice.
#[track_caller]
pub fn assert_failed_turn<N: Narrator>(session: &CompanionSession<N>) {
    let log = session.log();
    assert!(log.len() >= 2, "Expected at least two chat entries");
    let notice = &log[log.len() - 1];
    let player = &log[log.len() - 2];
    assert!(player.failed, "Expected the player message to be marked failed");
    assert_eq!(notice.text, "Connection failed");
    assert!(notice.failed, "Expected the notice to be marked failed");
}
