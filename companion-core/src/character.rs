//! Character types for the d20 companion.
//!
//! A [`Character`] is the persisted part of the game state: the setup flow
//! creates it, the narrative service replaces it every turn, and the
//! level-up flow mutates it locally. Everything derived from it lives in
//! [`crate::rules`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    /// Parse either the full name or the three-letter abbreviation.
    pub fn parse(s: &str) -> Option<Ability> {
        let s = s.trim();
        Ability::all()
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s) || a.abbreviation().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// `floor((score - 10) / 2)`, defined for any integer.
pub fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Ability scores container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl AbilityScores {
    pub fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: i32) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.get(ability))
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Character classes. Names the narrative service invents land in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CharacterClass {
    Barbarian,
    Bard,
    Cleric,
    Druid,
    Fighter,
    Monk,
    Paladin,
    Ranger,
    Rogue,
    Sorcerer,
    Wizard,
    Other(String),
}

impl CharacterClass {
    pub fn all() -> [CharacterClass; 11] {
        [
            CharacterClass::Barbarian,
            CharacterClass::Bard,
            CharacterClass::Cleric,
            CharacterClass::Druid,
            CharacterClass::Fighter,
            CharacterClass::Monk,
            CharacterClass::Paladin,
            CharacterClass::Ranger,
            CharacterClass::Rogue,
            CharacterClass::Sorcerer,
            CharacterClass::Wizard,
        ]
    }

    pub fn name(&self) -> &str {
        match self {
            CharacterClass::Barbarian => "Barbarian",
            CharacterClass::Bard => "Bard",
            CharacterClass::Cleric => "Cleric",
            CharacterClass::Druid => "Druid",
            CharacterClass::Fighter => "Fighter",
            CharacterClass::Monk => "Monk",
            CharacterClass::Paladin => "Paladin",
            CharacterClass::Ranger => "Ranger",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Sorcerer => "Sorcerer",
            CharacterClass::Wizard => "Wizard",
            CharacterClass::Other(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, CharacterClass::Other(_))
    }
}

impl From<String> for CharacterClass {
    fn from(s: String) -> Self {
        CharacterClass::all()
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(CharacterClass::Other(s))
    }
}

impl From<&str> for CharacterClass {
    fn from(s: &str) -> Self {
        CharacterClass::from(s.to_string())
    }
}

impl From<CharacterClass> for String {
    fn from(class: CharacterClass) -> Self {
        class.name().to_string()
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Races
// ============================================================================

/// Creature size; only Small and Medium occur among playable races.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Size {
    Small,
    Medium,
}

/// Playable races.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Race {
    Human,
    Elf,
    Dwarf,
    Halfling,
    Gnome,
    HalfElf,
    HalfOrc,
    Other(String),
}

impl Race {
    pub fn all() -> [Race; 7] {
        [
            Race::Human,
            Race::Elf,
            Race::Dwarf,
            Race::Halfling,
            Race::Gnome,
            Race::HalfElf,
            Race::HalfOrc,
        ]
    }

    pub fn name(&self) -> &str {
        match self {
            Race::Human => "Human",
            Race::Elf => "Elf",
            Race::Dwarf => "Dwarf",
            Race::Halfling => "Halfling",
            Race::Gnome => "Gnome",
            Race::HalfElf => "Half-Elf",
            Race::HalfOrc => "Half-Orc",
            Race::Other(name) => name,
        }
    }

    pub fn size(&self) -> Size {
        match self {
            Race::Halfling | Race::Gnome => Size::Small,
            _ => Size::Medium,
        }
    }

    /// Racial ability adjustments applied at character creation.
    pub fn ability_adjustments(&self) -> &'static [(Ability, i32)] {
        match self {
            Race::Elf => &[(Ability::Dexterity, 2), (Ability::Constitution, -2)],
            Race::Dwarf => &[(Ability::Constitution, 2), (Ability::Charisma, -2)],
            Race::Halfling => &[(Ability::Dexterity, 2), (Ability::Strength, -2)],
            Race::Gnome => &[(Ability::Constitution, 2), (Ability::Strength, -2)],
            Race::HalfOrc => &[
                (Ability::Strength, 2),
                (Ability::Intelligence, -2),
                (Ability::Charisma, -2),
            ],
            Race::Human | Race::HalfElf | Race::Other(_) => &[],
        }
    }
}

impl From<String> for Race {
    fn from(s: String) -> Self {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        Race::all()
            .into_iter()
            .find(|r| {
                let name: String = r.name().chars().filter(|c| c.is_alphanumeric()).collect();
                name.eq_ignore_ascii_case(&key)
            })
            .unwrap_or(Race::Other(s))
    }
}

impl From<&str> for Race {
    fn from(s: &str) -> Self {
        Race::from(s.to_string())
    }
}

impl From<Race> for String {
    fn from(race: Race) -> Self {
        race.name().to_string()
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Feats
// ============================================================================

/// A feat the character holds, with its sub-choice for targeted feats.
///
/// On the wire this is the narrative service's `"Feat Name (Target)"`
/// convention; in Rust the two halves stay apart. Decoding never fails:
/// text that doesn't split cleanly is kept whole as the feat name. The
/// strict [`FromStr`] parse is for player input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FeatSelection {
    pub feat: String,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatSelectionError {
    #[error("Empty feat name")]
    Empty,
    #[error("Unbalanced parentheses in feat '{0}'")]
    Unbalanced(String),
}

impl FeatSelection {
    pub fn new(feat: impl Into<String>) -> Self {
        Self {
            feat: feat.into(),
            target: None,
        }
    }

    pub fn targeted(feat: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            feat: feat.into(),
            target: Some(target.into()),
        }
    }

    /// Case-insensitive comparison against a base feat name.
    pub fn is(&self, feat: &str) -> bool {
        self.feat.eq_ignore_ascii_case(feat)
    }
}

impl FromStr for FeatSelection {
    type Err = FeatSelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FeatSelectionError::Empty);
        }

        match (s.find('('), s.ends_with(')')) {
            (Some(open), true) => {
                let feat = s[..open].trim();
                let target = s[open + 1..s.len() - 1].trim();
                if feat.is_empty() {
                    return Err(FeatSelectionError::Empty);
                }
                if target.contains('(') || target.contains(')') {
                    return Err(FeatSelectionError::Unbalanced(s.to_string()));
                }
                Ok(if target.is_empty() {
                    FeatSelection::new(feat)
                } else {
                    FeatSelection::targeted(feat, target)
                })
            }
            (None, false) => Ok(FeatSelection::new(s)),
            _ => Err(FeatSelectionError::Unbalanced(s.to_string())),
        }
    }
}

impl From<String> for FeatSelection {
    /// Splits on the first `(` and the last `)`.
    fn from(raw: String) -> Self {
        let s = raw.trim();
        if let (Some(open), true) = (s.find('('), s.ends_with(')')) {
            let feat = s[..open].trim();
            let target = s[open + 1..s.len() - 1].trim();
            if !feat.is_empty() {
                return if target.is_empty() {
                    FeatSelection::new(feat)
                } else {
                    FeatSelection::targeted(feat, target)
                };
            }
        }
        FeatSelection::new(s)
    }
}

impl From<FeatSelection> for String {
    fn from(selection: FeatSelection) -> Self {
        selection.to_string()
    }
}

impl fmt::Display for FeatSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{} ({})", self.feat, target),
            None => write!(f, "{}", self.feat),
        }
    }
}

// ============================================================================
// Character
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub maximum: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }
}

impl Default for HitPoints {
    fn default() -> Self {
        Self::new(1)
    }
}

/// The persisted character record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub name: String,
    pub race: Race,
    pub class: CharacterClass,
    pub level: u32,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub ability_scores: AbilityScores,
    #[serde(default)]
    pub hit_points: HitPoints,
    /// Free-text entries: `"Name"`, `"Name (qty)"` or `"50 gp"`.
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub feats: Vec<FeatSelection>,
    /// Sparse skill ranks; a missing skill has rank 0.
    #[serde(default)]
    pub skills: BTreeMap<String, i32>,
}

impl Character {
    pub fn new(name: impl Into<String>, race: Race, class: CharacterClass) -> Self {
        Self {
            name: name.into(),
            race,
            class,
            level: 1,
            experience: 0,
            ability_scores: AbilityScores::default(),
            hit_points: HitPoints::default(),
            inventory: Vec::new(),
            feats: Vec::new(),
            skills: BTreeMap::new(),
        }
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        self.ability_scores.modifier(ability)
    }

    /// True if any selection of `feat` is held, whatever its target.
    pub fn has_feat(&self, feat: &str) -> bool {
        self.feats.iter().any(|f| f.is(feat))
    }

    pub fn skill_rank(&self, skill: &str) -> i32 {
        self.skills
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(skill))
            .map(|(_, rank)| *rank)
            .unwrap_or(0)
    }
}
