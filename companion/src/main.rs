//! d20 companion, headless front end.
//!
//! A line-oriented interface for playing with an AI Dungeon Master while the
//! local rules engine keeps the character sheet honest.
//!
//! ```bash
//! cargo run -p companion -- --name "Tordek" --class fighter --race dwarf
//! cargo run -p companion -- --offline
//! ```

mod headless;
mod offline;

use anyhow::Context;
use claude::{Claude, ClientConfig};
use companion_core::{ClaudeNarrator, CompanionSession, GameState, NarratorConfig};
use tracing_subscriber::EnvFilter;

use offline::OfflineNarrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("companion=info,companion_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = headless::parse_config_from_args(&args);
    let character = config.build_character()?;
    tracing::info!(
        name = %character.name,
        race = %character.race,
        class = %character.class,
        offline = config.offline,
        "starting session"
    );
    let state = GameState::new(character);

    if config.offline {
        let session = CompanionSession::new(OfflineNarrator::new(), state);
        return headless::run_headless(session).await;
    }

    let api_key = std::env::var("ANTHROPIC_API_KEY").context(
        "ANTHROPIC_API_KEY not set; put it in .env, export it, or run with --offline",
    )?;
    let mut client_config = ClientConfig::new(api_key);
    if let Ok(model) = std::env::var("COMPANION_MODEL") {
        client_config = client_config.with_model(model);
    }
    let client = Claude::new(client_config).context("Failed to create Claude client")?;

    let mut narrator_config = NarratorConfig::new();
    if let Some(prompt) = config.system_prompt.clone() {
        narrator_config = narrator_config.with_system_prompt(prompt);
    }
    let narrator = ClaudeNarrator::new(client).with_config(narrator_config);

    headless::run_headless(CompanionSession::new(narrator, state)).await
}

fn print_help() {
    println!("d20 companion - headless play with an AI Dungeon Master");
    println!();
    println!("USAGE:");
    println!("  companion [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --name <NAME>      Character name (default: Adventurer)");
    println!("  --race <RACE>      human, elf, dwarf, halfling, gnome, half-elf, half-orc");
    println!("  --class <CLASS>    barbarian, bard, cleric, druid, fighter, monk,");
    println!("                     paladin, ranger, rogue, sorcerer, wizard");
    println!("  --prompt <TEXT>    Extra instructions for the Dungeon Master");
    println!("  --offline          Play without the API; turns are acknowledged locally");
    println!("  -h, --help         Show this help");
    println!();
    println!("ENVIRONMENT:");
    println!("  ANTHROPIC_API_KEY  Required unless --offline");
    println!("  COMPANION_MODEL    Override the Claude model");
    println!("  RUST_LOG           Log filter (default: companion=info,companion_core=info)");
}
