//! Headless mode.
//!
//! A line-oriented protocol on stdin/stdout:
//! - Lines starting with `#` are commands (sheet, inventory, roll, levelup, quit)
//! - Everything else is sent to the Dungeon Master as a player action

use companion_core::character::{Ability, AbilityScores, Character, CharacterClass, FeatSelection, Race};
use companion_core::character_builder::{BuilderError, CharacterBuilder};
use companion_core::dice::roll;
use companion_core::economy::format_price;
use companion_core::feats::available_feats;
use companion_core::progression::{level_up_gains, LevelUpChoices, MAX_LEVEL};
use companion_core::rules::{format_modifier, CharacterSheet, Save};
use companion_core::session::{CompanionSession, TurnOutcome};
use companion_core::Narrator;
use std::io::{self, BufRead, Write};

/// Character and session options from the command line.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub name: String,
    pub race: Race,
    pub class: CharacterClass,
    pub system_prompt: Option<String>,
    pub offline: bool,
}

impl HeadlessConfig {
    pub fn quick_start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            race: Race::Human,
            class: CharacterClass::Fighter,
            system_prompt: None,
            offline: false,
        }
    }

    /// Standard array placed by class priority, no feats or skills picked.
    pub fn build_character(&self) -> Result<Character, BuilderError> {
        let priority = ability_priority(&self.class);
        let mut assignment = [(0, Ability::Strength); 6];
        for (slot, (value, ability)) in assignment
            .iter_mut()
            .zip(companion_core::character_builder::STANDARD_ARRAY.iter().zip(priority))
        {
            *slot = (*value, ability);
        }

        CharacterBuilder::new()
            .name(self.name.clone())
            .race(self.race.clone())
            .class(self.class.clone())
            .standard_array(assignment)
            .build()
    }
}

fn ability_priority(class: &CharacterClass) -> [Ability; 6] {
    use Ability::*;
    match class {
        CharacterClass::Barbarian | CharacterClass::Fighter => {
            [Strength, Constitution, Dexterity, Wisdom, Intelligence, Charisma]
        }
        CharacterClass::Paladin => [Strength, Charisma, Constitution, Wisdom, Dexterity, Intelligence],
        CharacterClass::Ranger | CharacterClass::Rogue => {
            [Dexterity, Constitution, Strength, Wisdom, Intelligence, Charisma]
        }
        CharacterClass::Monk => [Wisdom, Dexterity, Strength, Constitution, Intelligence, Charisma],
        CharacterClass::Cleric | CharacterClass::Druid => {
            [Wisdom, Constitution, Strength, Dexterity, Charisma, Intelligence]
        }
        CharacterClass::Bard | CharacterClass::Sorcerer => {
            [Charisma, Dexterity, Constitution, Intelligence, Wisdom, Strength]
        }
        CharacterClass::Wizard | CharacterClass::Other(_) => {
            [Intelligence, Dexterity, Constitution, Wisdom, Charisma, Strength]
        }
    }
}

/// Run the turn loop until `#quit` or end of input.
pub async fn run_headless<N: Narrator>(mut session: CompanionSession<N>) -> anyhow::Result<()> {
    println!("=== d20 Companion ===");
    print_status(&session);
    println!();
    print_help();
    println!();
    println!("Enter your actions (one per line):");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            let (name, rest) = command
                .split_once(char::is_whitespace)
                .map(|(n, r)| (n, r.trim()))
                .unwrap_or((command, ""));
            match name {
                "quit" | "exit" => {
                    println!("Goodbye!");
                    break;
                }
                "status" => print_status(&session),
                "sheet" => print_sheet(&session.sheet(), &session.state().character),
                "inventory" => print_inventory(&session.sheet()),
                "roll" => {
                    let result = roll(if rest.is_empty() { "1d20" } else { rest });
                    if result.is_valid() {
                        println!("[ROLL] {result}");
                    } else {
                        println!("[ERROR] {}", result.breakdown);
                    }
                }
                "feats" => print_feats(&session.state().character),
                "levelup" => match parse_level_up(rest) {
                    Ok(choices) => {
                        print!("[PROCESSING]");
                        stdout.flush().ok();
                        let result = session.level_up(&choices).await;
                        print!("\r            \r");
                        match result {
                            Ok(outcome) => {
                                let character = &session.state().character;
                                println!("[LEVEL UP] {} is now level {}", character.name, character.level);
                                print_outcome(&outcome);
                            }
                            Err(e) => println!("[ERROR] {e}"),
                        }
                    }
                    Err(e) => println!("[ERROR] {e}"),
                },
                "help" => print_help(),
                _ => println!("[ERROR] Unknown command. Type #help for help."),
            }
            stdout.flush().ok();
            continue;
        }

        print!("[PROCESSING]");
        stdout.flush().ok();
        let result = session.player_action(line).await;
        print!("\r            \r");
        stdout.flush().ok();

        match result {
            Ok(outcome) => {
                print_outcome(&outcome);
                if session.in_combat() {
                    let (current, max) = session.hp_status();
                    println!("[COMBAT] HP: {current}/{max}");
                }
            }
            Err(e) => println!("[ERROR] {e}"),
        }
    }

    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Narrated {
            narrative,
            dice_roll_details,
        } => {
            println!("[DM]");
            for para in narrative.split("\n\n") {
                println!("{para}");
            }
            if let Some(dice) = dice_roll_details {
                println!("[DICE] {dice}");
            }
            println!();
        }
        TurnOutcome::Failed(_) => println!("[SYSTEM] Connection failed"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  #sheet              - Armor class, saves, attacks and hit points");
    println!("  #inventory          - Items with weight and value");
    println!("  #roll <dice>        - Roll an expression such as 2d6+1");
    println!("  #feats              - Feats available at your next level");
    println!("  #levelup <choices>  - Advance one level, e.g. #levelup Dodge, +Str, Climb=1");
    println!("  #status             - Location and hit points");
    println!("  #quit               - Exit");
}

fn print_status<N: Narrator>(session: &CompanionSession<N>) {
    let state = session.state();
    let character = &state.character;
    let (current, max) = session.hp_status();
    println!(
        "Character: {} (level {} {} {})",
        character.name, character.level, character.race, character.class
    );
    println!("Location: {} ({})", state.world.location, state.world.time_of_day);
    println!("HP: {current}/{max}");
    let quests: Vec<&str> = state.world.active_quests().map(|q| q.name.as_str()).collect();
    if !quests.is_empty() {
        println!("Quests: {}", quests.join(", "));
    }
}

fn print_sheet(sheet: &CharacterSheet, character: &Character) {
    let scores: &AbilityScores = &character.ability_scores;
    println!("[SHEET] {} - level {} {} {}", character.name, character.level, character.race, character.class);
    let abilities: Vec<String> = Ability::all()
        .iter()
        .map(|a| format!("{} {} ({})", a.abbreviation(), scores.get(*a), format_modifier(scores.modifier(*a))))
        .collect();
    println!("  {}", abilities.join("  "));
    println!(
        "  HP {}/{}  XP {} (next level at {})",
        character.hit_points.current, sheet.max_hit_points, character.experience, sheet.next_level_xp
    );

    let ac = &sheet.armor_class;
    println!("  AC {}  touch {}  flat-footed {}", ac.total, ac.touch, ac.flat_footed);
    for note in &ac.notes {
        println!("    {note}");
    }

    let saves: Vec<String> = Save::all()
        .iter()
        .map(|s| format!("{} {}", s.abbreviation(), format_modifier(sheet.saves.total(*s))))
        .collect();
    println!("  Saves: {}", saves.join("  "));
    for note in sheet.saves.notes() {
        println!("    {note}");
    }

    let attacks = &sheet.attacks;
    let iteratives: Vec<String> = attacks.iterative.iter().map(|b| format_modifier(*b)).collect();
    println!(
        "  BAB {}  melee {}  ranged {}",
        iteratives.join("/"),
        format_modifier(attacks.melee),
        format_modifier(attacks.ranged)
    );

    let budget = &sheet.skill_points;
    println!(
        "  Skill points {}/{} spent (max rank {})",
        budget.spent, budget.total, budget.max_class_rank
    );
    for (skill, rank) in &character.skills {
        println!("    {skill} {rank}");
    }
    if !character.feats.is_empty() {
        let feats: Vec<String> = character.feats.iter().map(|f| f.to_string()).collect();
        println!("  Feats: {}", feats.join(", "));
    }
}

fn print_inventory(sheet: &CharacterSheet) {
    println!("[INVENTORY]");
    for item in &sheet.items {
        println!(
            "  {:<28} {:<8} {:>7.1} lb  {}",
            item.raw,
            item.category(),
            item.total_weight_lb,
            format_price(item.total_price_gp)
        );
    }
    let load = &sheet.encumbrance;
    println!(
        "  Carrying {:.1} lb ({}; light up to {:.0}, heavy at {:.0})",
        load.carried_lb, load.status, load.light_limit, load.heavy_load
    );
    println!("  Wealth: {}", format_price(sheet.wealth_gp));
}

fn print_feats(character: &Character) {
    if character.level >= MAX_LEVEL {
        println!("[FEATS] Already at the maximum level");
        return;
    }
    let next = character.level + 1;
    let gains = level_up_gains(character, next);
    println!(
        "[FEATS] Level {next}: {} feat(s){}{}",
        gains.feat_count(),
        if gains.bonus_feat { ", one must be a combat feat" } else { "" },
        if gains.ability_increase { ", plus an ability increase" } else { "" },
    );
    for feat in available_feats(character, next) {
        println!("  {feat}");
    }
}

/// `Dodge, Weapon Focus (Longsword), +Str, Climb=1`
fn parse_level_up(input: &str) -> Result<LevelUpChoices, String> {
    let mut choices = LevelUpChoices::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(ability) = part.strip_prefix('+') {
            let ability = Ability::parse(ability).ok_or_else(|| format!("Unknown ability '{ability}'"))?;
            choices = choices.with_ability_increase(ability);
        } else if let Some((skill, ranks)) = part.split_once('=') {
            let ranks: i32 = ranks
                .trim()
                .parse()
                .map_err(|_| format!("Invalid rank count in '{part}'"))?;
            choices = choices.with_skill_ranks(skill.trim(), ranks);
        } else {
            let feat: FeatSelection = part.parse().map_err(|e| format!("{e}"))?;
            choices = choices.with_feat(feat);
        }
    }
    Ok(choices)
}

/// Parse character configuration from command line arguments.
pub fn parse_config_from_args(args: &[String]) -> HeadlessConfig {
    let mut config = HeadlessConfig::quick_start("Adventurer");

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--name" => {
                if let Some(name) = args.get(i + 1) {
                    config.name = name.clone();
                    i += 1;
                }
            }
            "--race" => {
                if let Some(race) = args.get(i + 1) {
                    config.race = Race::from(race.as_str());
                    i += 1;
                }
            }
            "--class" => {
                if let Some(class) = args.get(i + 1) {
                    config.class = CharacterClass::from(class.as_str());
                    i += 1;
                }
            }
            "--prompt" => {
                if let Some(prompt) = args.get(i + 1) {
                    config.system_prompt = Some(prompt.clone());
                    i += 1;
                }
            }
            "--offline" => config.offline = true,
            _ => {}
        }
        i += 1;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let config = parse_config_from_args(&args(&[
            "companion", "--name", "Tordek", "--race", "dwarf", "--class", "fighter", "--offline",
        ]));
        assert_eq!(config.name, "Tordek");
        assert_eq!(config.race, Race::Dwarf);
        assert_eq!(config.class, CharacterClass::Fighter);
        assert!(config.offline);

        let defaults = parse_config_from_args(&args(&["companion"]));
        assert_eq!(defaults.name, "Adventurer");
        assert!(!defaults.offline);
    }

    #[test]
    fn test_build_character_by_priority() {
        let mut config = HeadlessConfig::quick_start("Mialee");
        config.race = Race::Elf;
        config.class = CharacterClass::Wizard;
        let wizard = config.build_character().unwrap();
        assert_eq!(wizard.ability_scores.intelligence, 15);
        assert_eq!(wizard.ability_scores.dexterity, 16);
        assert!(!wizard.inventory.is_empty());
    }

    #[test]
    fn test_parse_level_up() {
        let choices = parse_level_up("Weapon Focus (Longsword), +Str, Climb=1, Jump = 2").unwrap();
        assert_eq!(choices.feats, vec![FeatSelection::targeted("Weapon Focus", "Longsword")]);
        assert_eq!(choices.ability_increase, Some(Ability::Strength));
        assert_eq!(choices.skill_ranks.get("Jump"), Some(&2));

        assert!(parse_level_up("+Luck").is_err());
        assert!(parse_level_up("Climb=x").is_err());
    }
}
