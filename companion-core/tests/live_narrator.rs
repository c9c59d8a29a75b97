//! Integration tests that call the real Claude API.
//!
//! These tests require ANTHROPIC_API_KEY to be set (via .env file or environment).
//! Run with: `cargo test -p companion-core --test live_narrator -- --ignored --nocapture`
//!
//! These are marked #[ignore] by default to avoid:
//! - API costs in CI
//! - Test failures when no API key is available
//! - Slow test runs (API calls take seconds)

use claude::{Claude, ClientConfig};
use companion_core::narrative::{ClaudeNarrator, NarratorConfig};
use companion_core::progression::LevelUpChoices;
use companion_core::session::{CompanionSession, TurnOutcome};
use companion_core::state::GameState;
use companion_core::testing::sample_fighter;
use companion_core::FeatSelection;

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

fn live_session() -> Option<CompanionSession<ClaudeNarrator>> {
    setup();
    let Ok(key) = std::env::var("ANTHROPIC_API_KEY") else {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return None;
    };
    let client = Claude::new(ClientConfig::new(key)).expect("Failed to create client");
    let narrator = ClaudeNarrator::new(client)
        .with_config(NarratorConfig::new().with_max_tokens(2048).with_temperature(0.3));
    Some(CompanionSession::new(
        narrator,
        GameState::new(sample_fighter("Thorin")),
    ))
}

#[tokio::test]
#[ignore]
async fn test_turn_returns_consistent_state() {
    let Some(mut session) = live_session() else {
        return;
    };

    let outcome = session
        .player_action("I look around the common room and order an ale.")
        .await
        .expect("message is not empty");

    match outcome {
        TurnOutcome::Narrated { narrative, .. } => {
            println!("DM: {narrative}");
            assert!(!narrative.is_empty());
        }
        TurnOutcome::Failed(err) => panic!("FAILED: {err}"),
    }

    let character = &session.state().character;
    assert_eq!(character.name, "Thorin");
    assert_eq!(character.level, 1);
    assert!(character.hit_points.maximum > 0);
}

#[tokio::test]
#[ignore]
async fn test_level_up_sync_is_acknowledged() {
    let Some(mut session) = live_session() else {
        return;
    };

    let choices = LevelUpChoices::new().with_feat(FeatSelection::new("Dodge"));
    let outcome = session.level_up(&choices).await.expect("valid level up");
    assert!(outcome.is_narrated(), "sync turn failed: {outcome:?}");

    let character = &session.state().character;
    println!("Level after sync: {}", character.level);
    assert_eq!(character.level, 2);
    assert!(character.has_feat("Dodge"));
}
