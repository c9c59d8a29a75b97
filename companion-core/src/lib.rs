//! d20 companion engine with an AI narrator.
//!
//! This crate provides:
//! - d20 3.5 rules: armor class, saving throws, attacks, hit points,
//!   encumbrance and skill budgets derived from a character record
//! - Equipment catalog, inventory resolution and coin arithmetic
//! - Feat prerequisites, character creation and level advancement
//! - A narrative seam backed by Claude, and a session that merges each
//!   narrated turn into the authoritative game state
//!
//! # Quick Start
//!
//! ```ignore
//! use claude::{Claude, ClientConfig};
//! use companion_core::{ClaudeNarrator, CompanionSession, GameState};
//! use companion_core::testing::sample_fighter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Claude::new(ClientConfig::new(std::env::var("ANTHROPIC_API_KEY")?))?;
//!     let state = GameState::new(sample_fighter("Thorin"));
//!     let mut session = CompanionSession::new(ClaudeNarrator::new(client), state);
//!
//!     let outcome = session.player_action("I look around the tavern").await?;
//!     if let Some(narrative) = outcome.narrative() {
//!         println!("{narrative}");
//!     }
//!     println!("AC {}", session.sheet().armor_class.total);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod character;
pub mod character_builder;
pub mod dice;
pub mod economy;
pub mod feats;
pub mod inventory;
pub mod narrative;
pub mod progression;
pub mod rules;
pub mod session;
pub mod state;
pub mod testing;

// Re-export for convenience
pub use companion_macros::Tool;

// Primary public API
pub use character::{Ability, AbilityScores, Character, CharacterClass, FeatSelection, Race};
pub use character_builder::{AbilityMethod, BuilderError, CharacterBuilder};
pub use dice::{roll, DiceFormula, DiceRoll, DieSource};
pub use feats::{can_take_feat, check_feat_prerequisites, FeatIneligibility};
pub use narrative::{ChatMessage, ChatRole, ClaudeNarrator, NarrativeError, NarrativeTurn, Narrator, NarratorConfig};
pub use progression::{apply_level_up, LevelUpChoices, LevelUpError};
pub use rules::CharacterSheet;
pub use session::{CompanionSession, SessionError, TurnOutcome};
pub use state::GameState;
pub use testing::{MockNarrator, ScriptedDice};
