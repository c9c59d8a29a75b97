//! Feat definitions and prerequisite checks.

use crate::character::{Ability, Character, CharacterClass, FeatSelection};
use crate::rules::base_attack_bonus;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatCategory {
    Combat,
    General,
    Magic,
}

/// The kind of sub-choice a targeted feat requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatTarget {
    Weapon,
    Skill,
}

/// Prerequisites of a feat. An empty field places no constraint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Prerequisites {
    pub abilities: Vec<(Ability, i32)>,
    pub min_bab: Option<i32>,
    pub min_level: Option<u32>,
    pub class: Option<CharacterClass>,
    pub feats: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatDefinition {
    pub name: &'static str,
    pub category: FeatCategory,
    pub target: Option<FeatTarget>,
    pub description: &'static str,
    pub prerequisites: Prerequisites,
}

impl FeatDefinition {
    fn new(name: &'static str, category: FeatCategory, description: &'static str) -> Self {
        Self {
            name,
            category,
            target: None,
            description,
            prerequisites: Prerequisites::default(),
        }
    }

    fn targeting(mut self, target: FeatTarget) -> Self {
        self.target = Some(target);
        self
    }

    fn ability(mut self, ability: Ability, minimum: i32) -> Self {
        self.prerequisites.abilities.push((ability, minimum));
        self
    }

    fn bab(mut self, minimum: i32) -> Self {
        self.prerequisites.min_bab = Some(minimum);
        self
    }

    fn level(mut self, minimum: u32) -> Self {
        self.prerequisites.min_level = Some(minimum);
        self
    }

    fn class(mut self, class: CharacterClass) -> Self {
        self.prerequisites.class = Some(class);
        self
    }

    fn requires(mut self, feats: &[&'static str]) -> Self {
        self.prerequisites.feats.extend_from_slice(feats);
        self
    }

    pub fn is_targeted(&self) -> bool {
        self.target.is_some()
    }
}

/// Why a character may not take a feat.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatIneligibility {
    #[error("Unknown feat: {0}")]
    UnknownFeat(String),
    #[error("{0} is already known")]
    AlreadyKnown(String),
    #[error("Requires {ability} {required} (have {actual})")]
    AbilityTooLow {
        ability: Ability,
        required: i32,
        actual: i32,
    },
    #[error("Requires base attack bonus +{required} (have +{actual})")]
    BaseAttackTooLow { required: i32, actual: i32 },
    #[error("Requires character level {required} (have {actual})")]
    LevelTooLow { required: u32, actual: u32 },
    #[error("Requires the {0} class")]
    WrongClass(String),
    #[error("Requires the {0} feat")]
    MissingFeat(String),
    #[error("{0} needs a target")]
    MissingTarget(String),
}

use Ability::{Charisma, Dexterity, Intelligence, Strength, Wisdom};
use FeatCategory::{Combat, General, Magic};

lazy_static::lazy_static! {
    static ref FEATS: Vec<FeatDefinition> = vec![
        // Combat
        FeatDefinition::new("Power Attack", Combat, "Trade attack bonus for melee damage.")
            .ability(Strength, 13),
        FeatDefinition::new("Cleave", Combat, "Extra melee attack after dropping a foe.")
            .ability(Strength, 13)
            .requires(&["Power Attack"]),
        FeatDefinition::new("Great Cleave", Combat, "No limit to Cleave attacks each round.")
            .ability(Strength, 13)
            .bab(4)
            .requires(&["Cleave"]),
        FeatDefinition::new("Improved Bull Rush", Combat, "+4 on bull rush attempts.")
            .ability(Strength, 13)
            .requires(&["Power Attack"]),
        FeatDefinition::new("Dodge", Combat, "+1 dodge bonus to Armor Class.")
            .ability(Dexterity, 13),
        FeatDefinition::new("Mobility", Combat, "+4 AC against attacks of opportunity from movement.")
            .ability(Dexterity, 13)
            .requires(&["Dodge"]),
        FeatDefinition::new("Spring Attack", Combat, "Move both before and after a melee attack.")
            .ability(Dexterity, 13)
            .bab(4)
            .requires(&["Dodge", "Mobility"]),
        FeatDefinition::new("Combat Expertise", Combat, "Trade attack bonus for Armor Class.")
            .ability(Intelligence, 13),
        FeatDefinition::new("Improved Trip", Combat, "+4 on trip attempts, free attack after a trip.")
            .ability(Intelligence, 13)
            .requires(&["Combat Expertise"]),
        FeatDefinition::new("Improved Disarm", Combat, "+4 on disarm attempts.")
            .ability(Intelligence, 13)
            .requires(&["Combat Expertise"]),
        FeatDefinition::new("Whirlwind Attack", Combat, "One melee attack against each adjacent foe.")
            .ability(Dexterity, 13)
            .ability(Intelligence, 13)
            .bab(4)
            .requires(&["Combat Expertise", "Dodge", "Mobility", "Spring Attack"]),
        FeatDefinition::new("Combat Reflexes", Combat, "Extra attacks of opportunity."),
        FeatDefinition::new("Improved Initiative", Combat, "+4 bonus on initiative checks."),
        FeatDefinition::new("Blind-Fight", Combat, "Reroll miss chance for concealment."),
        FeatDefinition::new("Quick Draw", Combat, "Draw a weapon as a free action.").bab(1),
        FeatDefinition::new("Point Blank Shot", Combat, "+1 on ranged attack and damage within 30 ft."),
        FeatDefinition::new("Precise Shot", Combat, "No penalty for shooting into melee.")
            .requires(&["Point Blank Shot"]),
        FeatDefinition::new("Rapid Shot", Combat, "One extra ranged attack each round.")
            .ability(Dexterity, 13)
            .requires(&["Point Blank Shot"]),
        FeatDefinition::new("Manyshot", Combat, "Shoot two or more arrows simultaneously.")
            .ability(Dexterity, 17)
            .bab(6)
            .requires(&["Point Blank Shot", "Rapid Shot"]),
        FeatDefinition::new("Two-Weapon Fighting", Combat, "Reduce two-weapon fighting penalties.")
            .ability(Dexterity, 15),
        FeatDefinition::new("Improved Two-Weapon Fighting", Combat, "Gain a second off-hand attack.")
            .ability(Dexterity, 17)
            .bab(6)
            .requires(&["Two-Weapon Fighting"]),
        FeatDefinition::new("Weapon Finesse", Combat, "Use Dexterity for light melee attack rolls.")
            .bab(1),
        FeatDefinition::new("Weapon Focus", Combat, "+1 on attack rolls with the chosen weapon.")
            .targeting(FeatTarget::Weapon)
            .bab(1),
        FeatDefinition::new("Weapon Specialization", Combat, "+2 damage with the chosen weapon.")
            .targeting(FeatTarget::Weapon)
            .class(CharacterClass::Fighter)
            .level(4)
            .requires(&["Weapon Focus"]),
        FeatDefinition::new("Improved Critical", Combat, "Double the threat range of the chosen weapon.")
            .targeting(FeatTarget::Weapon)
            .bab(8),
        FeatDefinition::new("Improved Unarmed Strike", Combat, "Unarmed strikes are armed attacks."),
        FeatDefinition::new("Stunning Fist", Combat, "Stun an opponent with an unarmed strike.")
            .ability(Dexterity, 13)
            .ability(Wisdom, 13)
            .bab(8)
            .requires(&["Improved Unarmed Strike"]),
        // General
        FeatDefinition::new("Alertness", General, "+2 on Listen and Spot checks."),
        FeatDefinition::new("Athletic", General, "+2 on Climb and Swim checks."),
        FeatDefinition::new("Endurance", General, "+4 on checks against exhaustion and the elements."),
        FeatDefinition::new("Diehard", General, "Remain conscious at -1 to -9 hit points.")
            .requires(&["Endurance"]),
        FeatDefinition::new("Great Fortitude", General, "+2 on Fortitude saves."),
        FeatDefinition::new("Iron Will", General, "+2 on Will saves."),
        FeatDefinition::new("Lightning Reflexes", General, "+2 on Reflex saves."),
        FeatDefinition::new("Run", General, "Run at five times normal speed."),
        FeatDefinition::new("Stealthy", General, "+2 on Hide and Move Silently checks."),
        FeatDefinition::new("Toughness", General, "+3 hit points."),
        FeatDefinition::new("Skill Focus", General, "+3 on checks with the chosen skill.")
            .targeting(FeatTarget::Skill),
        FeatDefinition::new("Leadership", General, "Attract a cohort and followers.")
            .level(6)
            .ability(Charisma, 13),
        // Magic
        FeatDefinition::new("Combat Casting", Magic, "+4 on Concentration checks to cast defensively."),
        FeatDefinition::new("Spell Penetration", Magic, "+2 on caster level checks against spell resistance."),
        FeatDefinition::new("Greater Spell Penetration", Magic, "A further +2 against spell resistance.")
            .requires(&["Spell Penetration"]),
        FeatDefinition::new("Scribe Scroll", Magic, "Create magic scrolls."),
        FeatDefinition::new("Brew Potion", Magic, "Create magic potions.").level(3),
        FeatDefinition::new("Craft Wondrous Item", Magic, "Create wondrous items.").level(3),
        FeatDefinition::new("Empower Spell", Magic, "Variable numeric effects of a spell increase by half."),
        FeatDefinition::new("Extend Spell", Magic, "Double a spell's duration."),
        FeatDefinition::new("Silent Spell", Magic, "Cast spells without verbal components."),
        FeatDefinition::new("Still Spell", Magic, "Cast spells without somatic components."),
        FeatDefinition::new("Maximize Spell", Magic, "Variable numeric effects of a spell are maximized.")
            .level(5),
        FeatDefinition::new("Extra Turning", Magic, "Four extra turn or rebuke attempts per day.")
            .class(CharacterClass::Cleric),
    ];
}

/// Every known feat.
pub fn feat_definitions() -> &'static [FeatDefinition] {
    &FEATS
}

/// Case-insensitive lookup by base name. `"Weapon Focus (Longsword)"`
/// finds Weapon Focus.
pub fn find_feat(name: &str) -> Option<&'static FeatDefinition> {
    let base = base_name(name);
    FEATS.iter().find(|f| f.name.eq_ignore_ascii_case(base))
}

fn base_name(name: &str) -> &str {
    let name = name.trim();
    match name.find('(') {
        Some(open) if name.ends_with(')') => name[..open].trim_end(),
        _ => name,
    }
}

/// Check whether `character` may take `feat` when reaching `target_level`.
///
/// `target_level` may be above the persisted level while a multi-level
/// advance is in progress; base attack bonus is computed at that level.
/// Targeted feats are never blocked by earlier selections of the same base
/// feat.
pub fn check_feat_prerequisites(
    character: &Character,
    feat: &str,
    target_level: u32,
) -> Result<&'static FeatDefinition, FeatIneligibility> {
    let definition =
        find_feat(feat).ok_or_else(|| FeatIneligibility::UnknownFeat(feat.trim().to_string()))?;

    if !definition.is_targeted() && character.has_feat(definition.name) {
        return Err(FeatIneligibility::AlreadyKnown(definition.name.to_string()));
    }

    let prereqs = &definition.prerequisites;

    for &(ability, required) in &prereqs.abilities {
        let actual = character.ability_scores.get(ability);
        if actual < required {
            return Err(FeatIneligibility::AbilityTooLow {
                ability,
                required,
                actual,
            });
        }
    }

    if let Some(required) = prereqs.min_bab {
        let actual = base_attack_bonus(&character.class, target_level);
        if actual < required {
            return Err(FeatIneligibility::BaseAttackTooLow { required, actual });
        }
    }

    if let Some(required) = prereqs.min_level {
        if target_level < required {
            return Err(FeatIneligibility::LevelTooLow {
                required,
                actual: target_level,
            });
        }
    }

    if let Some(class) = &prereqs.class {
        if character.class != *class {
            return Err(FeatIneligibility::WrongClass(class.name().to_string()));
        }
    }

    if let Some(missing) = prereqs.feats.iter().find(|f| !character.has_feat(f)) {
        return Err(FeatIneligibility::MissingFeat(missing.to_string()));
    }

    Ok(definition)
}

/// Boolean form of [`check_feat_prerequisites`].
pub fn can_take_feat(character: &Character, feat: &str, target_level: u32) -> bool {
    check_feat_prerequisites(character, feat, target_level).is_ok()
}

/// Stricter check for a concrete selection: targeted feats need a target,
/// may not repeat a target, and a targeted requirement (Weapon Focus for
/// Weapon Specialization) must be held for the same target.
pub fn check_feat_selection(
    character: &Character,
    selection: &FeatSelection,
    target_level: u32,
) -> Result<&'static FeatDefinition, FeatIneligibility> {
    let definition = check_feat_prerequisites(character, &selection.feat, target_level)?;

    if definition.is_targeted() {
        let target = selection
            .target
            .as_deref()
            .ok_or_else(|| FeatIneligibility::MissingTarget(definition.name.to_string()))?;

        let already = character.feats.iter().any(|f| {
            f.is(definition.name)
                && f.target
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(target))
        });
        if already {
            return Err(FeatIneligibility::AlreadyKnown(selection.to_string()));
        }

        for required in &definition.prerequisites.feats {
            let same_kind = find_feat(required).is_some_and(|r| r.target == definition.target);
            let held = character.feats.iter().any(|f| {
                f.is(required)
                    && f.target
                        .as_deref()
                        .is_some_and(|t| t.eq_ignore_ascii_case(target))
            });
            if same_kind && !held {
                return Err(FeatIneligibility::MissingFeat(format!("{required} ({target})")));
            }
        }
    }

    Ok(definition)
}

/// Feats the character qualifies for at `target_level`, in table order.
pub fn available_feats(character: &Character, target_level: u32) -> Vec<&'static FeatDefinition> {
    FEATS
        .iter()
        .filter(|f| can_take_feat(character, f.name, target_level))
        .collect()
}

impl fmt::Display for FeatDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Some(FeatTarget::Weapon) => write!(f, "{} (weapon)", self.name),
            Some(FeatTarget::Skill) => write!(f, "{} (skill)", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{AbilityScores, Race};

    fn fighter(strength: i32) -> Character {
        let mut c = Character::new("Tordek", Race::Dwarf, CharacterClass::Fighter);
        c.ability_scores = AbilityScores::new(strength, 13, 14, 10, 12, 8);
        c
    }

    #[test]
    fn test_unknown_feat_rejected() {
        let c = fighter(16);
        assert_eq!(
            check_feat_prerequisites(&c, "Sword Dancing", 1).unwrap_err(),
            FeatIneligibility::UnknownFeat("Sword Dancing".to_string())
        );
        assert!(!can_take_feat(&c, "Sword Dancing", 1));
    }

    #[test]
    fn test_great_cleave_needs_cleave_and_bab() {
        let mut c = fighter(13);
        assert!(!can_take_feat(&c, "Great Cleave", 1));

        c.feats.push(FeatSelection::new("Power Attack"));
        c.feats.push(FeatSelection::new("Cleave"));
        assert_eq!(
            check_feat_prerequisites(&c, "Great Cleave", 1).unwrap_err(),
            FeatIneligibility::BaseAttackTooLow {
                required: 4,
                actual: 1
            }
        );
        assert!(can_take_feat(&c, "Great Cleave", 4));
    }

    #[test]
    fn test_ability_minimum() {
        let c = fighter(12);
        assert_eq!(
            check_feat_prerequisites(&c, "Power Attack", 1).unwrap_err(),
            FeatIneligibility::AbilityTooLow {
                ability: Ability::Strength,
                required: 13,
                actual: 12
            }
        );
    }

    #[test]
    fn test_no_duplicate_plain_feats() {
        let mut c = fighter(15);
        c.feats.push(FeatSelection::new("Power Attack"));
        assert!(matches!(
            check_feat_prerequisites(&c, "power attack", 2),
            Err(FeatIneligibility::AlreadyKnown(_))
        ));
    }

    #[test]
    fn test_targeted_feats_repeatable() {
        let mut c = fighter(15);
        c.feats.push(FeatSelection::targeted("Weapon Focus", "Longsword"));
        assert!(can_take_feat(&c, "Weapon Focus", 1));
        assert!(can_take_feat(&c, "Weapon Focus (Greataxe)", 1));

        assert!(check_feat_selection(&c, &FeatSelection::targeted("Weapon Focus", "Greataxe"), 1).is_ok());
        assert!(matches!(
            check_feat_selection(&c, &FeatSelection::targeted("Weapon Focus", "longsword"), 1),
            Err(FeatIneligibility::AlreadyKnown(_))
        ));
        assert_eq!(
            check_feat_selection(&c, &FeatSelection::new("Weapon Focus"), 1).unwrap_err(),
            FeatIneligibility::MissingTarget("Weapon Focus".to_string())
        );
    }

    #[test]
    fn test_class_and_level_requirements() {
        let mut c = fighter(15);
        c.feats.push(FeatSelection::targeted("Weapon Focus", "Longsword"));
        assert_eq!(
            check_feat_prerequisites(&c, "Weapon Specialization", 2).unwrap_err(),
            FeatIneligibility::LevelTooLow {
                required: 4,
                actual: 2
            }
        );
        assert!(can_take_feat(&c, "Weapon Specialization", 4));

        let specialization = FeatSelection::targeted("Weapon Specialization", "Greataxe");
        assert_eq!(
            check_feat_selection(&c, &specialization, 4).unwrap_err(),
            FeatIneligibility::MissingFeat("Weapon Focus (Greataxe)".to_string())
        );

        let mut wizard = Character::new("Mialee", Race::Elf, CharacterClass::Wizard);
        wizard.feats.push(FeatSelection::targeted("Weapon Focus", "Dagger"));
        assert_eq!(
            check_feat_prerequisites(&wizard, "Weapon Specialization", 4).unwrap_err(),
            FeatIneligibility::WrongClass("Fighter".to_string())
        );
    }

    #[test]
    fn test_available_feats_filters() {
        let c = fighter(13);
        let names: Vec<&str> = available_feats(&c, 1).iter().map(|f| f.name).collect();
        assert!(names.contains(&"Power Attack"));
        assert!(names.contains(&"Dodge"));
        assert!(!names.contains(&"Cleave"));
        assert!(!names.contains(&"Extra Turning"));
    }

    #[test]
    fn test_definition_names_unique() {
        let mut names: Vec<String> = feat_definitions().iter().map(|f| f.name.to_lowercase()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
