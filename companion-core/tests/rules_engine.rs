//! Rules engine properties, exercised through the public API only.
//!
//! Run with: `cargo test -p companion-core --test rules_engine`

use companion_core::character::{ability_modifier, Ability, AbilityScores, Character, CharacterClass, FeatSelection, Race};
use companion_core::catalog::WeaponProperty;
use companion_core::dice::{die_min_max, roll_dice_expression, DieRange, INVALID_FORMULA};
use companion_core::feats::{can_take_feat, check_feat_prerequisites, FeatIneligibility};
use companion_core::inventory::parse_inventory;
use companion_core::rules::{
    armor_class, base_attack_bonus, encumbrance, iterative_attacks, saving_throws, BabTier,
    CharacterSheet, EncumbranceStatus,
};
use companion_core::testing::ScriptedDice;
use proptest::prelude::*;

fn character(class: CharacterClass, scores: AbilityScores, inventory: &[&str]) -> Character {
    let mut character = Character::new("Subject", Race::Human, class);
    character.ability_scores = scores;
    character.inventory = inventory.iter().map(|s| s.to_string()).collect();
    character
}

// =============================================================================
// ABILITY MODIFIERS & ATTACKS
// =============================================================================

proptest! {
    #[test]
    fn modifier_is_floored_half(score in -10i32..60) {
        prop_assert_eq!(ability_modifier(score), (score - 10).div_euclid(2));
    }

    #[test]
    fn bab_never_decreases(level in 1u32..40) {
        for class in CharacterClass::all() {
            prop_assert!(base_attack_bonus(&class, level + 1) >= base_attack_bonus(&class, level));
        }
    }

    #[test]
    fn bab_tiers_are_ordered(level in 1u32..40) {
        let fast = BabTier::Fast.bonus_at(level);
        let medium = BabTier::Medium.bonus_at(level);
        let slow = BabTier::Slow.bonus_at(level);
        prop_assert!(fast >= medium);
        prop_assert!(medium >= slow);
    }

    #[test]
    fn iteratives_start_at_bab(bab in 0i32..40) {
        let attacks = iterative_attacks(bab);
        prop_assert_eq!(attacks[0], bab);
        prop_assert!(attacks.len() <= 4);
    }

    #[test]
    fn encumbrance_tightens_with_weight(strength in 3i32..30, a in 0.0f64..400.0, b in 0.0f64..400.0) {
        let (light, heavy) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(encumbrance(strength, light).status <= encumbrance(strength, heavy).status);
    }
}

#[test]
fn modifier_spot_values() {
    assert_eq!(ability_modifier(10), 0);
    assert_eq!(ability_modifier(11), 0);
    assert_eq!(ability_modifier(12), 1);
    assert_eq!(ability_modifier(9), -1);
    assert_eq!(ability_modifier(8), -1);
}

#[test]
fn iterative_attack_spot_values() {
    assert_eq!(iterative_attacks(6), vec![6, 1]);
    assert_eq!(iterative_attacks(20), vec![20, 15, 10, 5]);
    assert_eq!(iterative_attacks(3), vec![3]);
}

// =============================================================================
// DICE
// =============================================================================

#[test]
fn dice_with_fixed_source() {
    let mut dice = ScriptedDice::always(3);
    let roll = roll_dice_expression("2d6+1", &mut dice);
    assert_eq!(roll.total, 7);
    assert!(roll.breakdown.contains("[3,3]"));
    assert!(roll.breakdown.contains("+ 1"));
}

#[test]
fn dice_ranges_and_sentinel() {
    assert_eq!(die_min_max("1d20+5"), DieRange { min: 6, max: 25 });
    assert_eq!(die_min_max("garbage"), DieRange { min: 1, max: 20 });

    let roll = roll_dice_expression("garbage", &mut ScriptedDice::always(3));
    assert_eq!(roll.total, 0);
    assert_eq!(roll.breakdown, INVALID_FORMULA);
}

// =============================================================================
// INVENTORY & ENCUMBRANCE
// =============================================================================

#[test]
fn inventory_resolves_quantities() {
    let items = parse_inventory(&["Longsword", "Arrows (20) (2)"]);
    assert_eq!(items.len(), 2);

    let longsword = &items[0];
    assert_eq!(longsword.category(), "Weapon");
    assert!(!longsword.properties().contains(&WeaponProperty::TwoHanded));

    assert_eq!(items[1].name, "Arrows (20)");
    assert_eq!(items[1].quantity, 2);
}

#[test]
fn unknown_items_still_render() {
    let items = parse_inventory(&["Glowing Orb of Mystery"]);
    assert_eq!(items[0].category(), "Misc");
    assert_eq!(items[0].total_price_gp, 0.0);
}

#[test]
fn encumbrance_boundaries_at_strength_10() {
    let status = |weight| encumbrance(10, weight).status;
    assert_eq!(status(33.0), EncumbranceStatus::Light);
    assert_eq!(status(34.0), EncumbranceStatus::Medium);
    assert_eq!(status(67.0), EncumbranceStatus::Heavy);
    assert_eq!(status(101.0), EncumbranceStatus::Overloaded);
}

// =============================================================================
// ARMOR CLASS
// =============================================================================

#[test]
fn armor_caps_dexterity() {
    let rogue = character(
        CharacterClass::Rogue,
        AbilityScores::new(10, 18, 10, 10, 10, 10),
        &["Chainmail"],
    );
    let ac = armor_class(&rogue, &parse_inventory(&rogue.inventory));

    assert_eq!(ac.dexterity, 2);
    assert!(ac.notes.iter().any(|n| n.contains("capped")));
}

#[test]
fn two_handed_weapon_zeroes_shield() {
    let fighter = character(
        CharacterClass::Fighter,
        AbilityScores::default(),
        &["Greatsword", "Heavy Steel Shield"],
    );
    let ac = armor_class(&fighter, &parse_inventory(&fighter.inventory));

    assert_eq!(ac.shield, 0);
    assert!(ac.notes.iter().any(|n| n.contains("Greatsword")));

    let sword_and_board = character(
        CharacterClass::Fighter,
        AbilityScores::default(),
        &["Longsword", "Heavy Steel Shield"],
    );
    let ac = armor_class(&sword_and_board, &parse_inventory(&sword_and_board.inventory));
    assert_eq!(ac.shield, 2);
}

// =============================================================================
// FEATS & SAVES
// =============================================================================

#[test]
fn great_cleave_prerequisites() {
    let mut fighter = character(
        CharacterClass::Fighter,
        AbilityScores::new(13, 10, 10, 10, 10, 10),
        &[],
    );

    assert!(!can_take_feat(&fighter, "Great Cleave", 1));

    fighter.feats.push(FeatSelection::new("Power Attack"));
    fighter.feats.push(FeatSelection::new("Cleave"));
    assert!(matches!(
        check_feat_prerequisites(&fighter, "Great Cleave", 1),
        Err(FeatIneligibility::BaseAttackTooLow { required: 4, actual: 1 })
    ));
    assert!(can_take_feat(&fighter, "Great Cleave", 4));
}

#[test]
fn unknown_feat_is_false() {
    let fighter = character(CharacterClass::Fighter, AbilityScores::default(), &[]);
    assert!(!can_take_feat(&fighter, "Laser Eyes", 20));
}

#[test]
fn divine_grace_listed_once() {
    let mut paladin = character(
        CharacterClass::Paladin,
        AbilityScores::new(14, 10, 12, 10, 12, 16),
        &["Cloak of Resistance +1"],
    );
    paladin.level = 5;
    let items = parse_inventory(&paladin.inventory);

    let mut saves = saving_throws(&paladin, &items);
    saves.apply_misc_bonuses(&paladin, &items, paladin.level);
    saves.apply_misc_bonuses(&paladin, &items, paladin.level);

    let grace = saves
        .notes()
        .iter()
        .filter(|n| n.starts_with("Divine Grace"))
        .count();
    assert_eq!(grace, 1);
    // good Fort 4, Con +1, Cha +3, cloak +1
    assert_eq!(saves.fortitude.total(), 9);
}

#[test]
fn sheet_derives_every_block() {
    let mut fighter = character(
        CharacterClass::Fighter,
        AbilityScores::new(16, 12, 14, 10, 10, 8),
        &["Longsword", "Scale Mail", "Heavy Steel Shield", "25 gp"],
    );
    fighter.feats.push(FeatSelection::new("Toughness"));

    let sheet = CharacterSheet::derive(&fighter);
    assert_eq!(sheet.max_hit_points, 15);
    assert_eq!(sheet.armor_class.total, 17);
    assert_eq!(sheet.attacks.base_attack_bonus, 1);
    assert_eq!(sheet.wealth_gp, 25.0);
    assert_eq!(sheet.next_level_xp, 1000);
    assert_eq!(fighter.modifier(Ability::Strength), 3);
}
