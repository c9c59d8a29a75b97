//! d20 rules engine.
//!
//! Pure functions from a [`Character`] and its resolved inventory to the
//! derived blocks a character sheet shows: attack bonuses, hit points, skill
//! budget, encumbrance, armor class and saving throws. Nothing here is
//! stored; callers recompute whenever the character changes.

use crate::character::{ability_modifier, Ability, Character, CharacterClass, Race, Size};
use crate::economy;
use crate::inventory::{self, ParsedInventoryItem};
use serde::Serialize;
use std::fmt;

/// Highest character level the rules cover.
pub const MAX_LEVEL: u32 = 20;

/// `level` clamped into `1..=MAX_LEVEL`. Snapshots from the narrative
/// service can carry any number.
pub fn effective_level(level: u32) -> u32 {
    level.clamp(1, MAX_LEVEL)
}

// ============================================================================
// Base Attack Bonus
// ============================================================================

/// Base attack bonus progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BabTier {
    Fast,
    Medium,
    Slow,
}

impl BabTier {
    pub fn for_class(class: &CharacterClass) -> Self {
        match class {
            CharacterClass::Barbarian
            | CharacterClass::Fighter
            | CharacterClass::Paladin
            | CharacterClass::Ranger => BabTier::Fast,
            CharacterClass::Bard
            | CharacterClass::Cleric
            | CharacterClass::Druid
            | CharacterClass::Monk
            | CharacterClass::Rogue => BabTier::Medium,
            CharacterClass::Sorcerer | CharacterClass::Wizard | CharacterClass::Other(_) => {
                BabTier::Slow
            }
        }
    }

    pub fn bonus_at(&self, level: u32) -> i32 {
        let level = level as i32;
        match self {
            BabTier::Fast => level,
            BabTier::Medium => level * 3 / 4,
            BabTier::Slow => level / 2,
        }
    }
}

pub fn base_attack_bonus(class: &CharacterClass, level: u32) -> i32 {
    BabTier::for_class(class).bonus_at(level)
}

/// Attack bonuses for a full attack: `[bab, bab-5, bab-10, bab-15]`, stopping
/// before the first non-positive follow-up. The first attack is always there.
pub fn iterative_attacks(bab: i32) -> Vec<i32> {
    let mut attacks = vec![bab];
    let mut next = bab - 5;
    while next > 0 && attacks.len() < 4 {
        attacks.push(next);
        next -= 5;
    }
    attacks
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackProfile {
    pub base_attack_bonus: i32,
    pub iterative: Vec<i32>,
    pub melee: i32,
    pub ranged: i32,
}

impl AttackProfile {
    pub fn for_character(character: &Character, level: u32) -> Self {
        let bab = base_attack_bonus(&character.class, level);
        let size = size_modifier(&character.race);
        Self {
            base_attack_bonus: bab,
            iterative: iterative_attacks(bab),
            melee: bab + character.modifier(Ability::Strength) + size,
            ranged: bab + character.modifier(Ability::Dexterity) + size,
        }
    }
}

// ============================================================================
// Hit Points
// ============================================================================

pub fn hit_die(class: &CharacterClass) -> i32 {
    match class {
        CharacterClass::Barbarian => 12,
        CharacterClass::Fighter | CharacterClass::Paladin => 10,
        CharacterClass::Cleric
        | CharacterClass::Druid
        | CharacterClass::Monk
        | CharacterClass::Ranger => 8,
        CharacterClass::Bard | CharacterClass::Rogue => 6,
        CharacterClass::Sorcerer | CharacterClass::Wizard | CharacterClass::Other(_) => 4,
    }
}

/// Hit points gained on reaching `level`: the full die at level 1, the
/// rounded-up average after that. Never less than 1.
pub fn hit_points_for_level(class: &CharacterClass, level: u32, con_modifier: i32) -> i32 {
    let die = hit_die(class);
    let roll = if level <= 1 { die } else { die / 2 + 1 };
    (roll + con_modifier).max(1)
}

/// Maximum hit points at `level`, using the current Constitution.
pub fn max_hit_points(character: &Character, level: u32) -> i32 {
    let con = character.modifier(Ability::Constitution);
    let levels: i32 = (1..=effective_level(level))
        .map(|l| hit_points_for_level(&character.class, l, con))
        .sum();
    let toughness = if character.has_feat("Toughness") { 3 } else { 0 };
    levels + toughness
}

// ============================================================================
// Skill Points
// ============================================================================

pub fn class_skill_points(class: &CharacterClass) -> i32 {
    match class {
        CharacterClass::Rogue => 8,
        CharacterClass::Bard | CharacterClass::Ranger => 6,
        CharacterClass::Barbarian | CharacterClass::Druid | CharacterClass::Monk => 4,
        _ => 2,
    }
}

/// Skill points gained on reaching `level`.
pub fn skill_points_for_level(
    class: &CharacterClass,
    race: &Race,
    level: u32,
    int_modifier: i32,
) -> i32 {
    let base = (class_skill_points(class) + int_modifier).max(1);
    let human = i32::from(*race == Race::Human);
    if level <= 1 {
        (base + human) * 4
    } else {
        base + human
    }
}

pub fn max_class_rank(level: u32) -> i32 {
    level as i32 + 3
}

pub fn max_cross_class_rank(level: u32) -> i32 {
    max_class_rank(level) / 2
}

/// Skill points earned, spent and left. Every rank costs one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkillPointBudget {
    pub per_level: i32,
    pub total: i32,
    pub spent: i32,
    pub remaining: i32,
    pub max_class_rank: i32,
    pub max_cross_class_rank: i32,
}

impl SkillPointBudget {
    pub fn for_character(character: &Character, level: u32) -> Self {
        let level = effective_level(level);
        let int = character.modifier(Ability::Intelligence);
        let total: i32 = (1..=level)
            .map(|l| skill_points_for_level(&character.class, &character.race, l, int))
            .sum();
        let spent: i32 = character.skills.values().map(|rank| (*rank).max(0)).sum();
        Self {
            per_level: skill_points_for_level(&character.class, &character.race, 2, int),
            total,
            spent,
            remaining: total - spent,
            max_class_rank: max_class_rank(level),
            max_cross_class_rank: max_cross_class_rank(level),
        }
    }
}

// ============================================================================
// Experience
// ============================================================================

/// Experience needed to reach `level`: 0, 1000, 3000, 6000, ...
///
/// Saturates at `u32::MAX` for levels far past the table.
pub fn xp_for_level(level: u32) -> u32 {
    u32::try_from(xp_threshold(level)).unwrap_or(u32::MAX)
}

fn xp_threshold(level: u32) -> u64 {
    let n = u64::from(level.max(1));
    500u64.saturating_mul(n).saturating_mul(n - 1)
}

/// Highest level whose threshold `xp` meets.
pub fn level_for_xp(xp: u32) -> u32 {
    let xp = u64::from(xp);
    let mut level = 1;
    while xp_threshold(level + 1) <= xp {
        level += 1;
    }
    level
}

// ============================================================================
// Encumbrance
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EncumbranceStatus {
    Light,
    Medium,
    Heavy,
    Overloaded,
}

impl fmt::Display for EncumbranceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EncumbranceStatus::Light => "Light",
            EncumbranceStatus::Medium => "Medium",
            EncumbranceStatus::Heavy => "Heavy",
            EncumbranceStatus::Overloaded => "Overloaded",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Encumbrance {
    pub carried_lb: f64,
    pub light_limit: f64,
    pub medium_load: f64,
    pub heavy_load: f64,
    pub status: EncumbranceStatus,
}

/// Load status for `weight` pounds carried at `strength`. A threshold only
/// counts once it is strictly exceeded.
pub fn encumbrance(strength: i32, weight: f64) -> Encumbrance {
    let heavy_load = f64::from(strength) * 10.0;
    let medium_load = heavy_load * 0.66;
    let light_limit = heavy_load * 0.33;

    let status = if weight > heavy_load {
        EncumbranceStatus::Overloaded
    } else if weight > medium_load {
        EncumbranceStatus::Heavy
    } else if weight > light_limit {
        EncumbranceStatus::Medium
    } else {
        EncumbranceStatus::Light
    };

    Encumbrance {
        carried_lb: weight,
        light_limit,
        medium_load,
        heavy_load,
        status,
    }
}

/// Alternate light-load capacity: linear up to Strength 10, then scaled up
/// by 10% per point above 10.
///
/// Nothing reads this; [`encumbrance`] uses the flat thresholds.
pub fn alternate_light_load(strength: i32) -> f64 {
    let base = f64::from(strength) * 3.3;
    if strength <= 10 {
        base
    } else {
        base * (1.0 + 0.1 * f64::from(strength - 10))
    }
}

// ============================================================================
// Armor Class
// ============================================================================

/// Dex cap applied when no armor is worn.
pub const UNCAPPED_DEX: i32 = 99;

pub fn size_modifier(race: &Race) -> i32 {
    match race.size() {
        Size::Small => 1,
        Size::Medium => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArmorClassBreakdown {
    pub base: i32,
    pub dexterity: i32,
    pub armor: i32,
    pub shield: i32,
    pub size: i32,
    pub dodge: i32,
    pub total: i32,
    pub touch: i32,
    pub flat_footed: i32,
    pub armor_check_penalty: i32,
    pub max_dex: i32,
    pub notes: Vec<String>,
}

/// Best armor, best shield, capped Dex, size and Dodge.
pub fn armor_class(character: &Character, items: &[ParsedInventoryItem]) -> ArmorClassBreakdown {
    let mut notes = Vec::new();

    let best_armor = best_by_bonus(items, |i| i.armor());
    let best_shield = best_by_bonus(items, |i| i.shield());

    let max_dex = best_armor
        .and_then(|(_, stats)| stats.max_dex)
        .unwrap_or(UNCAPPED_DEX);
    let raw_dex = character.modifier(Ability::Dexterity);
    let dexterity = raw_dex.min(max_dex);
    if dexterity < raw_dex {
        let armor_name = best_armor.map(|(item, _)| item.name.as_str()).unwrap_or("armor");
        notes.push(format!(
            "Dexterity bonus capped at {} by {} (was {})",
            signed(max_dex),
            armor_name,
            signed(raw_dex)
        ));
    }

    let armor = best_armor.map(|(_, s)| s.armor_bonus).unwrap_or(0);
    let mut armor_check_penalty = best_armor.map(|(_, s)| s.check_penalty).unwrap_or(0);

    let two_hander = items.iter().find(|i| i.is_two_handed_weapon());
    let shield = match (best_shield, two_hander) {
        (Some((shield, _)), Some(weapon)) => {
            notes.push(format!(
                "{} grants no bonus while wielding the two-handed {}",
                shield.name, weapon.name
            ));
            0
        }
        (Some((_, stats)), None) => {
            armor_check_penalty += stats.check_penalty;
            stats.armor_bonus
        }
        (None, _) => 0,
    };

    let size = size_modifier(&character.race);
    let dodge = i32::from(character.has_feat("Dodge"));
    let base = 10;
    let total = base + dexterity + armor + shield + size + dodge;

    notes.push(format!(
        "{base} base {} Dex {} armor {} shield {} size {} dodge = {total}",
        signed(dexterity),
        signed(armor),
        signed(shield),
        signed(size),
        signed(dodge),
    ));

    ArmorClassBreakdown {
        base,
        dexterity,
        armor,
        shield,
        size,
        dodge,
        total,
        touch: base + dexterity + size + dodge,
        flat_footed: total - dexterity.max(0) - dodge,
        armor_check_penalty,
        max_dex,
        notes,
    }
}

fn best_by_bonus<'a, F>(
    items: &'a [ParsedInventoryItem],
    stats: F,
) -> Option<(&'a ParsedInventoryItem, &'a crate::catalog::ArmorStats)>
where
    F: Fn(&'a ParsedInventoryItem) -> Option<&'a crate::catalog::ArmorStats>,
{
    // First item wins ties.
    items
        .iter()
        .filter_map(|item| stats(item).map(|s| (item, s)))
        .fold(None, |best, candidate| match best {
            Some((_, b)) if b.armor_bonus >= candidate.1.armor_bonus => best,
            _ => Some(candidate),
        })
}

fn signed(value: i32) -> String {
    if value >= 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

// ============================================================================
// Saving Throws
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Save {
    Fortitude,
    Reflex,
    Will,
}

impl Save {
    pub fn all() -> [Save; 3] {
        [Save::Fortitude, Save::Reflex, Save::Will]
    }

    pub fn ability(&self) -> Ability {
        match self {
            Save::Fortitude => Ability::Constitution,
            Save::Reflex => Ability::Dexterity,
            Save::Will => Ability::Wisdom,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Save::Fortitude => "Fort",
            Save::Reflex => "Ref",
            Save::Will => "Will",
        }
    }
}

pub fn good_save(level: u32) -> i32 {
    2 + level as i32 / 2
}

pub fn bad_save(level: u32) -> i32 {
    level as i32 / 3
}

pub fn is_good_save(class: &CharacterClass, save: Save) -> bool {
    use CharacterClass::*;
    match save {
        Save::Fortitude => matches!(
            class,
            Barbarian | Cleric | Druid | Fighter | Monk | Paladin | Ranger
        ),
        Save::Reflex => matches!(class, Bard | Monk | Ranger | Rogue),
        Save::Will => matches!(class, Bard | Cleric | Druid | Monk | Sorcerer | Wizard),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveLine {
    pub base: i32,
    pub ability: i32,
    pub misc: i32,
}

impl SaveLine {
    pub fn total(&self) -> i32 {
        self.base + self.ability + self.misc
    }
}

/// A labelled bonus to one or more saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveModifier {
    pub label: String,
    pub fortitude: i32,
    pub reflex: i32,
    pub will: i32,
}

impl SaveModifier {
    pub fn all(label: impl Into<String>, bonus: i32) -> Self {
        Self {
            label: label.into(),
            fortitude: bonus,
            reflex: bonus,
            will: bonus,
        }
    }

    pub fn single(label: impl Into<String>, save: Save, bonus: i32) -> Self {
        let mut modifier = Self::all(label, 0);
        match save {
            Save::Fortitude => modifier.fortitude = bonus,
            Save::Reflex => modifier.reflex = bonus,
            Save::Will => modifier.will = bonus,
        }
        modifier
    }

    fn get(&self, save: Save) -> i32 {
        match save {
            Save::Fortitude => self.fortitude,
            Save::Reflex => self.reflex,
            Save::Will => self.will,
        }
    }
}

impl fmt::Display for SaveModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fortitude == self.reflex && self.reflex == self.will {
            return write!(f, "{}: {} to all saves", self.label, signed(self.fortitude));
        }
        let parts: Vec<String> = Save::all()
            .into_iter()
            .filter(|s| self.get(*s) != 0)
            .map(|s| format!("{} {}", signed(self.get(s)), s.abbreviation()))
            .collect();
        write!(f, "{}: {}", self.label, parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavingThrowBreakdown {
    pub fortitude: SaveLine,
    pub reflex: SaveLine,
    pub will: SaveLine,
    pub modifiers: Vec<SaveModifier>,
}

impl SavingThrowBreakdown {
    /// Class base saves plus ability modifiers, no misc bonuses yet.
    pub fn base(character: &Character, level: u32) -> Self {
        let line = |save: Save| SaveLine {
            base: if is_good_save(&character.class, save) {
                good_save(level)
            } else {
                bad_save(level)
            },
            ability: character.modifier(save.ability()),
            misc: 0,
        };
        Self {
            fortitude: line(Save::Fortitude),
            reflex: line(Save::Reflex),
            will: line(Save::Will),
            modifiers: Vec::new(),
        }
    }

    pub fn line(&self, save: Save) -> &SaveLine {
        match save {
            Save::Fortitude => &self.fortitude,
            Save::Reflex => &self.reflex,
            Save::Will => &self.will,
        }
    }

    pub fn total(&self, save: Save) -> i32 {
        self.line(save).total()
    }

    pub fn has_bonus(&self, label: &str) -> bool {
        self.modifiers.iter().any(|m| m.label == label)
    }

    /// Add a bonus unless one with the same label is already applied.
    /// Returns whether it was added.
    pub fn apply_bonus(&mut self, modifier: SaveModifier) -> bool {
        if self.has_bonus(&modifier.label) {
            return false;
        }
        self.fortitude.misc += modifier.fortitude;
        self.reflex.misc += modifier.reflex;
        self.will.misc += modifier.will;
        self.modifiers.push(modifier);
        true
    }

    /// Item, race, class and feat bonuses. Safe to call repeatedly.
    pub fn apply_misc_bonuses(
        &mut self,
        character: &Character,
        items: &[ParsedInventoryItem],
        level: u32,
    ) {
        if let Some((name, bonus)) = best_resistance_item(items) {
            self.apply_bonus(SaveModifier::all(name, bonus));
        }

        if items.iter().any(|i| is_luck_item(&i.name)) {
            self.apply_bonus(SaveModifier::all("Luckstone", 1));
        }

        if character.race == Race::Halfling {
            self.apply_bonus(SaveModifier::all("Halfling Luck", 1));
        }

        if character.class == CharacterClass::Paladin && level >= 2 {
            let cha = character.modifier(Ability::Charisma);
            self.apply_bonus(SaveModifier::all("Divine Grace", cha));
        }

        for (feat, save) in [
            ("Great Fortitude", Save::Fortitude),
            ("Lightning Reflexes", Save::Reflex),
            ("Iron Will", Save::Will),
        ] {
            if character.has_feat(feat) {
                self.apply_bonus(SaveModifier::single(feat, save, 2));
            }
        }
    }

    pub fn notes(&self) -> Vec<String> {
        self.modifiers.iter().map(|m| m.to_string()).collect()
    }
}

pub fn saving_throws(character: &Character, items: &[ParsedInventoryItem]) -> SavingThrowBreakdown {
    saving_throws_at_level(character, items, character.level)
}

/// Saves as they would be at `level`, for previewing a level-up.
pub fn saving_throws_at_level(
    character: &Character,
    items: &[ParsedInventoryItem],
    level: u32,
) -> SavingThrowBreakdown {
    let mut saves = SavingThrowBreakdown::base(character, level);
    saves.apply_misc_bonuses(character, items, level);
    saves
}

/// Resistance bonuses don't stack; the best cloak is the one that counts.
fn best_resistance_item(items: &[ParsedInventoryItem]) -> Option<(String, i32)> {
    items
        .iter()
        .filter(|i| i.name.to_lowercase().contains("cloak of resistance"))
        .map(|i| (i.name.clone(), plus_bonus(&i.name).unwrap_or(1)))
        .fold(None, |best, candidate| match best {
            Some((_, b)) if b >= candidate.1 => best,
            _ => Some(candidate),
        })
}

fn is_luck_item(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("stone of good luck") || lower.contains("luckstone")
}

/// The `N` of the first `+N` in `name`.
fn plus_bonus(name: &str) -> Option<i32> {
    let (_, after) = name.split_once('+')?;
    let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

// ============================================================================
// Character Sheet
// ============================================================================

/// Every derived block for one character, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterSheet {
    pub items: Vec<ParsedInventoryItem>,
    pub carried_lb: f64,
    pub wealth_gp: f64,
    pub encumbrance: Encumbrance,
    pub armor_class: ArmorClassBreakdown,
    pub saves: SavingThrowBreakdown,
    pub attacks: AttackProfile,
    pub max_hit_points: i32,
    pub skill_points: SkillPointBudget,
    pub next_level_xp: u32,
}

impl CharacterSheet {
    pub fn derive(character: &Character) -> Self {
        let level = effective_level(character.level);
        let items = inventory::parse_inventory(&character.inventory);
        let carried_lb = inventory::total_weight(&items);

        Self {
            carried_lb,
            wealth_gp: economy::wealth(&items),
            encumbrance: encumbrance(character.ability_scores.strength, carried_lb),
            armor_class: armor_class(character, &items),
            saves: saving_throws_at_level(character, &items, level),
            attacks: AttackProfile::for_character(character, level),
            max_hit_points: max_hit_points(character, level),
            skill_points: SkillPointBudget::for_character(character, level),
            next_level_xp: xp_for_level(level + 1),
            items,
        }
    }
}

/// Ability modifier formatted with its sign, e.g. `+2`.
pub fn format_modifier(score: i32) -> String {
    signed(ability_modifier(score))
}
