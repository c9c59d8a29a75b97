//! Dice expression evaluator.
//!
//! Supports the `XdY`, `XdY+Z` and `XdY-Z` forms used by weapon damage
//! entries and check rolls. Randomness comes from an injected [`DieSource`]
//! so every roll can be replayed exactly in tests.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Marker carried by the breakdown of an unparseable expression.
pub const INVALID_FORMULA: &str = "Invalid Formula";

/// Largest dice pool a single expression may roll.
pub const MAX_DICE: u32 = 1000;

/// Largest die a single expression may name.
pub const MAX_SIDES: u32 = 10_000;

/// Largest flat modifier a single expression may carry, either sign.
pub const MAX_MODIFIER: i32 = 10_000;

/// Error type for dice parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Empty dice formula")]
    Empty,
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("Invalid dice count: {0}")]
    InvalidCount(u32),
}

/// Anything that can produce a uniform die result in `1..=sides`.
pub trait DieSource {
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl<R: rand::RngCore> DieSource for R {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.gen_range(1..=sides)
    }
}

/// A parsed `<count>d<sides>[+|-]<modifier>` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceFormula {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceFormula {
    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::Empty);
        }
        let invalid = || DiceError::InvalidNotation(notation.clone());

        let d_pos = notation.find('d').ok_or_else(invalid)?;
        let count_str = &notation[..d_pos];
        let rest = &notation[d_pos + 1..];

        let (sides_str, modifier) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(sign_pos) => {
                let magnitude_str = &rest[sign_pos + 1..];
                if !is_digits(magnitude_str) {
                    return Err(invalid());
                }
                let magnitude: i32 = magnitude_str.parse().map_err(|_| invalid())?;
                if magnitude > MAX_MODIFIER {
                    return Err(invalid());
                }
                let sign = if rest.as_bytes()[sign_pos] == b'-' { -1 } else { 1 };
                (&rest[..sign_pos], sign * magnitude)
            }
            None => (rest, 0),
        };

        if !is_digits(count_str) || !is_digits(sides_str) {
            return Err(invalid());
        }
        let count: u32 = count_str.parse().map_err(|_| invalid())?;
        let sides: u32 = sides_str.parse().map_err(|_| invalid())?;

        if count == 0 || count > MAX_DICE {
            return Err(DiceError::InvalidCount(count));
        }
        if sides == 0 || sides > MAX_SIDES {
            return Err(DiceError::InvalidDieSize(sides));
        }

        Ok(DiceFormula {
            count,
            sides,
            modifier,
        })
    }

    /// Theoretical `[min, max]` of the expression, without rolling.
    pub fn range(&self) -> DieRange {
        DieRange {
            min: self.count as i32 + self.modifier,
            max: (self.count * self.sides) as i32 + self.modifier,
        }
    }

    /// True for exactly one d20, the shape of an attack or check roll.
    pub fn is_single_d20(&self) -> bool {
        self.count == 1 && self.sides == 20
    }

    pub fn roll_with<S: DieSource + ?Sized>(&self, source: &mut S) -> DiceRoll {
        let rolls: Vec<u32> = (0..self.count).map(|_| source.roll_die(self.sides)).collect();
        let dice_total: i32 = rolls.iter().map(|r| *r as i32).sum();
        let natural = if self.is_single_d20() { rolls[0] } else { 0 };

        DiceRoll {
            formula: Some(*self),
            breakdown: breakdown(&rolls, self.modifier),
            total: dice_total + self.modifier,
            rolls,
            natural,
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn breakdown(rolls: &[u32], modifier: i32) -> String {
    let dice = format!(
        "[{}]",
        rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(",")
    );
    match modifier {
        0 => dice,
        m if m > 0 => format!("{dice} + {m}"),
        m => format!("{dice} - {}", m.abs()),
    }
}

impl FromStr for DiceFormula {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceFormula::parse(s)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// Bounds used by the dice animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieRange {
    pub min: i32,
    pub max: i32,
}

/// Result of evaluating a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// `None` when the expression could not be parsed.
    pub formula: Option<DiceFormula>,
    pub rolls: Vec<u32>,
    pub total: i32,
    pub breakdown: String,
    /// The raw die of a `1d20±n` roll, otherwise 0.
    pub natural: u32,
}

impl DiceRoll {
    /// The zero-result sentinel for malformed input.
    pub fn invalid() -> Self {
        Self {
            formula: None,
            rolls: Vec::new(),
            total: 0,
            breakdown: INVALID_FORMULA.to_string(),
            natural: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.formula.is_some()
    }

    pub fn is_natural_20(&self) -> bool {
        self.natural == 20
    }

    pub fn is_natural_1(&self) -> bool {
        self.natural == 1
    }
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{} = {}", self.breakdown, self.total)
        } else {
            write!(f, "{}", self.breakdown)
        }
    }
}

/// Evaluate an expression with the given die source.
///
/// Malformed input never errors; it yields [`DiceRoll::invalid`].
pub fn roll_dice_expression<S: DieSource + ?Sized>(expression: &str, source: &mut S) -> DiceRoll {
    match DiceFormula::parse(expression) {
        Ok(formula) => formula.roll_with(source),
        Err(_) => DiceRoll::invalid(),
    }
}

/// Evaluate an expression with the thread-local RNG.
pub fn roll(expression: &str) -> DiceRoll {
    roll_dice_expression(expression, &mut rand::thread_rng())
}

/// Range of an expression; malformed input falls back to a d20's `[1, 20]`.
pub fn die_min_max(expression: &str) -> DieRange {
    DiceFormula::parse(expression)
        .map(|f| f.range())
        .unwrap_or(DieRange { min: 1, max: 20 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedDice;

    #[test]
    fn test_parse_simple() {
        let formula = DiceFormula::parse("1d20").unwrap();
        assert_eq!(formula.count, 1);
        assert_eq!(formula.sides, 20);
        assert_eq!(formula.modifier, 0);
    }

    #[test]
    fn test_parse_with_modifier() {
        assert_eq!(DiceFormula::parse("1d20+5").unwrap().modifier, 5);
        assert_eq!(DiceFormula::parse("2d6-2").unwrap().modifier, -2);
        assert_eq!(DiceFormula::parse(" 3D8+1 ").unwrap().count, 3);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(DiceFormula::parse(""), Err(DiceError::Empty));
        assert!(DiceFormula::parse("garbage").is_err());
        assert!(DiceFormula::parse("d20").is_err());
        assert!(DiceFormula::parse("2d").is_err());
        assert!(DiceFormula::parse("2d6+").is_err());
        assert!(DiceFormula::parse("2d6+1d4").is_err());
        assert_eq!(DiceFormula::parse("1d0"), Err(DiceError::InvalidDieSize(0)));
        assert_eq!(DiceFormula::parse("0d6"), Err(DiceError::InvalidCount(0)));
    }

    #[test]
    fn test_huge_modifier_degrades() {
        assert!(DiceFormula::parse("1d20+2147483647").is_err());
        assert!(DiceFormula::parse("1d20-2147483648").is_err());
        assert_eq!(
            DiceFormula::parse("1d20+10000").map(|f| f.modifier),
            Ok(MAX_MODIFIER)
        );

        let roll = roll_dice_expression("1d20+2147483647", &mut ScriptedDice::always(5));
        assert_eq!(roll.total, 0);
        assert!(roll.breakdown.contains(INVALID_FORMULA));

        let range = die_min_max("2d6+2147483647");
        assert_eq!((range.min, range.max), (1, 20));

        let widest = DiceFormula::parse("1000d10000+10000").unwrap().range();
        assert_eq!(widest.max, 10_000_000 + 10_000);
    }

    #[test]
    fn test_fixed_source_total_and_breakdown() {
        let mut dice = ScriptedDice::always(3);
        let roll = roll_dice_expression("2d6+1", &mut dice);

        assert_eq!(roll.total, 7);
        assert!(roll.breakdown.contains("[3,3]"));
        assert!(roll.breakdown.contains("+ 1"));
        assert_eq!(roll.natural, 0);
    }

    #[test]
    fn test_negative_modifier_breakdown() {
        let mut dice = ScriptedDice::new(vec![4, 1]);
        let roll = roll_dice_expression("2d4-2", &mut dice);
        assert_eq!(roll.total, 3);
        assert_eq!(roll.breakdown, "[4,1] - 2");
        assert_eq!(roll.to_string(), "[4,1] - 2 = 3");
    }

    #[test]
    fn test_natural_d20_exposed() {
        let mut dice = ScriptedDice::new(vec![20]);
        let roll = roll_dice_expression("1d20+5", &mut dice);
        assert_eq!(roll.natural, 20);
        assert!(roll.is_natural_20());
        assert_eq!(roll.total, 25);

        let mut dice = ScriptedDice::new(vec![1, 20]);
        let roll = roll_dice_expression("2d20", &mut dice);
        assert_eq!(roll.natural, 0);
    }

    #[test]
    fn test_invalid_expression_is_sentinel() {
        let mut dice = ScriptedDice::always(6);
        let roll = roll_dice_expression("fireball", &mut dice);
        assert!(!roll.is_valid());
        assert_eq!(roll.total, 0);
        assert_eq!(roll.breakdown, INVALID_FORMULA);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(die_min_max("1d20+5"), DieRange { min: 6, max: 25 });
        assert_eq!(die_min_max("3d6-1"), DieRange { min: 2, max: 17 });
        assert_eq!(die_min_max("garbage"), DieRange { min: 1, max: 20 });
    }

    #[test]
    fn test_roll_range_with_thread_rng() {
        for _ in 0..100 {
            let result = roll("1d20+5");
            assert!(result.total >= 6 && result.total <= 25);
        }
    }

    #[test]
    fn test_display_round_trip() {
        for notation in ["1d20", "2d6+3", "1d8-1"] {
            assert_eq!(DiceFormula::parse(notation).unwrap().to_string(), notation);
        }
    }
}
