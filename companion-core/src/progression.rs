//! Level advancement.
//!
//! The narrative service never levels a character itself. The player picks
//! feats, an ability increase and skill ranks locally, [`apply_level_up`]
//! validates and applies them, and [`level_up_sync_message`] describes the
//! result so the service can catch up.

use crate::character::{Ability, Character, CharacterClass, FeatSelection};
use crate::feats::{check_feat_selection, FeatCategory, FeatIneligibility};
use crate::rules::{self, max_class_rank};
use std::collections::BTreeMap;
use thiserror::Error;

pub use crate::rules::MAX_LEVEL;

/// What reaching a level grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUpGains {
    pub level: u32,
    pub hit_points: i32,
    pub skill_points: i32,
    pub general_feat: bool,
    /// Fighters' extra combat feat.
    pub bonus_feat: bool,
    pub ability_increase: bool,
}

impl LevelUpGains {
    pub fn feat_count(&self) -> usize {
        usize::from(self.general_feat) + usize::from(self.bonus_feat)
    }
}

pub fn grants_general_feat(level: u32) -> bool {
    level == 1 || level % 3 == 0
}

pub fn grants_fighter_bonus_feat(level: u32) -> bool {
    level == 1 || level % 2 == 0
}

pub fn grants_ability_increase(level: u32) -> bool {
    level % 4 == 0
}

pub fn level_up_gains(character: &Character, target_level: u32) -> LevelUpGains {
    let class = &character.class;
    LevelUpGains {
        level: target_level,
        hit_points: rules::hit_points_for_level(
            class,
            target_level,
            character.modifier(Ability::Constitution),
        ),
        skill_points: rules::skill_points_for_level(
            class,
            &character.race,
            target_level,
            character.modifier(Ability::Intelligence),
        ),
        general_feat: grants_general_feat(target_level),
        bonus_feat: *class == CharacterClass::Fighter
            && grants_fighter_bonus_feat(target_level),
        ability_increase: grants_ability_increase(target_level),
    }
}

/// The player's picks for one level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelUpChoices {
    pub feats: Vec<FeatSelection>,
    pub ability_increase: Option<Ability>,
    /// Ranks to add, by skill name.
    pub skill_ranks: BTreeMap<String, i32>,
}

impl LevelUpChoices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feat(mut self, feat: FeatSelection) -> Self {
        self.feats.push(feat);
        self
    }

    pub fn with_ability_increase(mut self, ability: Ability) -> Self {
        self.ability_increase = Some(ability);
        self
    }

    pub fn with_skill_ranks(mut self, skill: impl Into<String>, ranks: i32) -> Self {
        let total = self.skill_ranks.entry(skill.into()).or_insert(0);
        *total = total.saturating_add(ranks);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelUpError {
    #[error("Already at the maximum level ({})", MAX_LEVEL)]
    MaxLevel,

    #[error("Level {level} grants {expected} feat(s), {chosen} chosen")]
    WrongFeatCount {
        level: u32,
        expected: usize,
        chosen: usize,
    },

    #[error("Cannot take {feat}: {reason}")]
    Feat {
        feat: String,
        #[source]
        reason: FeatIneligibility,
    },

    #[error("The fighter bonus feat must be a combat feat")]
    BonusFeatNotCombat,

    #[error("Level {0} grants an ability increase; choose one")]
    MissingAbilityIncrease(u32),

    #[error("Level {0} does not grant an ability increase")]
    UnexpectedAbilityIncrease(u32),

    #[error("Invalid rank change {ranks} for {skill}")]
    InvalidRank { skill: String, ranks: i32 },

    #[error("{skill} would reach rank {rank}, above the maximum of {max}")]
    RankTooHigh { skill: String, rank: i32, max: i32 },

    #[error("{spent} skill points spent, only {available} available")]
    TooManySkillPoints { available: i32, spent: i32 },
}

/// Validate `choices` for the next level and return the advanced character.
///
/// Feats are checked in order against the character as it would be at the
/// new level, so an earlier pick can satisfy a later one's prerequisite.
pub fn apply_level_up(
    character: &Character,
    choices: &LevelUpChoices,
) -> Result<Character, LevelUpError> {
    if character.level >= MAX_LEVEL {
        return Err(LevelUpError::MaxLevel);
    }
    let target = character.level + 1;
    let gains = level_up_gains(character, target);

    if choices.feats.len() != gains.feat_count() {
        return Err(LevelUpError::WrongFeatCount {
            level: target,
            expected: gains.feat_count(),
            chosen: choices.feats.len(),
        });
    }

    match (gains.ability_increase, choices.ability_increase) {
        (true, None) => return Err(LevelUpError::MissingAbilityIncrease(target)),
        (false, Some(_)) => return Err(LevelUpError::UnexpectedAbilityIncrease(target)),
        _ => {}
    }

    let mut next = character.clone();
    if let Some(ability) = choices.ability_increase {
        let score = next.ability_scores.get(ability);
        next.ability_scores.set(ability, score.saturating_add(1));
    }

    let mut combat_feats = 0;
    for selection in &choices.feats {
        let definition =
            check_feat_selection(&next, selection, target).map_err(|reason| LevelUpError::Feat {
                feat: selection.to_string(),
                reason,
            })?;
        if definition.category == FeatCategory::Combat {
            combat_feats += 1;
        }
        next.feats.push(FeatSelection {
            feat: definition.name.to_string(),
            target: selection.target.clone(),
        });
    }
    if gains.bonus_feat && combat_feats == 0 {
        return Err(LevelUpError::BonusFeatNotCombat);
    }

    let mut spent: i32 = 0;
    let max = max_class_rank(target);
    for (skill, ranks) in &choices.skill_ranks {
        if *ranks < 0 {
            return Err(LevelUpError::InvalidRank {
                skill: skill.clone(),
                ranks: *ranks,
            });
        }
        let rank = character
            .skill_rank(skill)
            .checked_add(*ranks)
            .ok_or_else(|| LevelUpError::InvalidRank {
                skill: skill.clone(),
                ranks: *ranks,
            })?;
        if rank > max {
            return Err(LevelUpError::RankTooHigh {
                skill: skill.clone(),
                rank,
                max,
            });
        }
        spent = spent.saturating_add(*ranks);
        let existing = next
            .skills
            .keys()
            .find(|k| k.eq_ignore_ascii_case(skill))
            .cloned()
            .unwrap_or_else(|| skill.clone());
        next.skills.insert(existing, rank);
    }
    if spent > gains.skill_points {
        return Err(LevelUpError::TooManySkillPoints {
            available: gains.skill_points,
            spent,
        });
    }

    next.level = target;
    let maximum = rules::max_hit_points(&next, target);
    let gained = maximum - character.hit_points.maximum;
    next.hit_points.maximum = maximum;
    next.hit_points.current = next
        .hit_points
        .current
        .saturating_add(gained.max(0))
        .min(maximum);
    next.experience = next.experience.max(rules::xp_for_level(target));

    tracing::info!(
        character = %next.name,
        level = target,
        hit_points = maximum,
        feats = choices.feats.len(),
        "level up applied"
    );
    Ok(next)
}

/// Apply several levels in a row, each validated at its own level.
pub fn apply_level_ups(
    character: &Character,
    levels: &[LevelUpChoices],
) -> Result<Character, LevelUpError> {
    levels
        .iter()
        .try_fold(character.clone(), |current, choices| apply_level_up(&current, choices))
}

/// System message telling the narrative service what changed.
pub fn level_up_sync_message(before: &Character, after: &Character) -> String {
    let mut lines = vec![format!(
        "{} advanced from level {} to level {} ({}).",
        after.name, before.level, after.level, after.class
    )];

    lines.push(format!(
        "Hit points: {}/{} -> {}/{}.",
        before.hit_points.current,
        before.hit_points.maximum,
        after.hit_points.current,
        after.hit_points.maximum
    ));

    for ability in Ability::all() {
        let (old, new) = (before.ability_scores.get(ability), after.ability_scores.get(ability));
        if old != new {
            lines.push(format!("{}: {} -> {}.", ability.name(), old, new));
        }
    }

    let new_feats: Vec<String> = after
        .feats
        .iter()
        .filter(|f| !before.feats.contains(f))
        .map(|f| f.to_string())
        .collect();
    if !new_feats.is_empty() {
        lines.push(format!("New feats: {}.", new_feats.join(", ")));
    }

    let skills: Vec<String> = after
        .skills
        .iter()
        .filter(|(name, rank)| before.skill_rank(name) != **rank)
        .map(|(name, rank)| format!("{} {} -> {}", name, before.skill_rank(name), rank))
        .collect();
    if !skills.is_empty() {
        lines.push(format!("Skill ranks: {}.", skills.join(", ")));
    }

    lines.push("Update the character in the game state to match exactly.".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{AbilityScores, HitPoints, Race};

    fn fighter() -> Character {
        let mut c = Character::new("Regdar", Race::Human, CharacterClass::Fighter);
        c.ability_scores = AbilityScores::new(16, 13, 14, 10, 12, 8);
        c.feats = vec![
            FeatSelection::new("Power Attack"),
            FeatSelection::new("Cleave"),
            FeatSelection::targeted("Weapon Focus", "Longsword"),
        ];
        c.hit_points = HitPoints::new(12);
        c
    }

    #[test]
    fn test_gains_schedule() {
        let c = fighter();
        let two = level_up_gains(&c, 2);
        assert_eq!(two.hit_points, 8);
        assert_eq!(two.skill_points, 3);
        assert!(!two.general_feat);
        assert!(two.bonus_feat);
        assert_eq!(two.feat_count(), 1);

        let three = level_up_gains(&c, 3);
        assert!(three.general_feat && !three.bonus_feat);

        let four = level_up_gains(&c, 4);
        assert!(four.ability_increase);

        let mut rogue = c.clone();
        rogue.class = CharacterClass::Rogue;
        assert_eq!(level_up_gains(&rogue, 2).feat_count(), 0);
        assert_eq!(level_up_gains(&rogue, 6).feat_count(), 1);
    }

    #[test]
    fn test_apply_level_two() {
        let c = fighter();
        let choices = LevelUpChoices::new()
            .with_feat(FeatSelection::new("Dodge"))
            .with_skill_ranks("Climb", 3);
        let next = apply_level_up(&c, &choices).unwrap();

        assert_eq!(next.level, 2);
        assert!(next.has_feat("Dodge"));
        assert_eq!(next.skill_rank("Climb"), 3);
        assert_eq!(next.hit_points.maximum, 20);
        assert_eq!(next.hit_points.current, 20);
        assert_eq!(next.experience, 1000);
    }

    #[test]
    fn test_wrong_feat_count() {
        let c = fighter();
        assert_eq!(
            apply_level_up(&c, &LevelUpChoices::new()).unwrap_err(),
            LevelUpError::WrongFeatCount {
                level: 2,
                expected: 1,
                chosen: 0
            }
        );
    }

    #[test]
    fn test_bonus_feat_must_be_combat() {
        let c = fighter();
        let choices = LevelUpChoices::new().with_feat(FeatSelection::new("Alertness"));
        assert_eq!(
            apply_level_up(&c, &choices).unwrap_err(),
            LevelUpError::BonusFeatNotCombat
        );
    }

    #[test]
    fn test_feat_checked_at_target_level() {
        let mut c = fighter();
        c.level = 3;
        c.hit_points = HitPoints::new(28);
        let choices = LevelUpChoices::new()
            .with_feat(FeatSelection::new("Great Cleave"))
            .with_ability_increase(Ability::Strength);
        let next = apply_level_up(&c, &choices).unwrap();
        assert!(next.has_feat("Great Cleave"));
        assert_eq!(next.ability_scores.strength, 17);

        c.level = 1;
        let err = apply_level_up(&c, &LevelUpChoices::new().with_feat(FeatSelection::new("Great Cleave")))
            .unwrap_err();
        assert!(matches!(
            err,
            LevelUpError::Feat {
                reason: FeatIneligibility::BaseAttackTooLow { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_ability_increase_rules() {
        let mut c = fighter();
        let choices = LevelUpChoices::new()
            .with_feat(FeatSelection::new("Dodge"))
            .with_ability_increase(Ability::Strength);
        assert_eq!(
            apply_level_up(&c, &choices).unwrap_err(),
            LevelUpError::UnexpectedAbilityIncrease(2)
        );

        c.level = 3;
        let choices = LevelUpChoices::new().with_feat(FeatSelection::new("Dodge"));
        assert_eq!(
            apply_level_up(&c, &choices).unwrap_err(),
            LevelUpError::MissingAbilityIncrease(4)
        );
    }

    #[test]
    fn test_skill_limits() {
        let c = fighter();
        let over_cap = LevelUpChoices::new()
            .with_feat(FeatSelection::new("Dodge"))
            .with_skill_ranks("Climb", 6);
        assert!(matches!(
            apply_level_up(&c, &over_cap).unwrap_err(),
            LevelUpError::RankTooHigh { max: 5, .. }
        ));

        let overspent = LevelUpChoices::new()
            .with_feat(FeatSelection::new("Dodge"))
            .with_skill_ranks("Climb", 2)
            .with_skill_ranks("Jump", 2);
        assert_eq!(
            apply_level_up(&c, &overspent).unwrap_err(),
            LevelUpError::TooManySkillPoints {
                available: 3,
                spent: 4
            }
        );
    }

    #[test]
    fn test_rank_overflow_rejected() {
        let mut c = fighter();
        c.skills.insert("Climb".to_string(), i32::MAX);
        let choices = LevelUpChoices::new()
            .with_feat(FeatSelection::new("Dodge"))
            .with_skill_ranks("Climb", 1);
        assert_eq!(
            apply_level_up(&c, &choices).unwrap_err(),
            LevelUpError::InvalidRank {
                skill: "Climb".to_string(),
                ranks: 1
            }
        );

        let piled = LevelUpChoices::new()
            .with_skill_ranks("Jump", i32::MAX)
            .with_skill_ranks("Jump", i32::MAX);
        assert_eq!(piled.skill_ranks["Jump"], i32::MAX);
    }

    #[test]
    fn test_multi_level_sequence() {
        let c = fighter();
        let next = apply_level_ups(
            &c,
            &[
                LevelUpChoices::new().with_feat(FeatSelection::new("Dodge")),
                LevelUpChoices::new().with_feat(FeatSelection::new("Mobility")),
            ],
        )
        .unwrap();
        assert_eq!(next.level, 3);
        assert!(next.has_feat("Mobility"));
        assert_eq!(next.hit_points.maximum, 28);
    }

    #[test]
    fn test_sync_message() {
        let c = fighter();
        let next = apply_level_up(
            &c,
            &LevelUpChoices::new()
                .with_feat(FeatSelection::targeted("Weapon Focus", "Greataxe"))
                .with_skill_ranks("Climb", 1),
        )
        .unwrap();
        let message = level_up_sync_message(&c, &next);

        assert!(message.starts_with("Regdar advanced from level 1 to level 2 (Fighter)."));
        assert!(message.contains("Hit points: 12/12 -> 20/20."));
        assert!(message.contains("New feats: Weapon Focus (Greataxe)."));
        assert!(message.contains("Skill ranks: Climb 0 -> 1."));
        assert!(!message.contains("Strength"));
    }
}
