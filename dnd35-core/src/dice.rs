//! D&D dice rolling system.
//!
//! Provides single-die and multi-die rolls over an injectable random source,
//! 4d6-drop-lowest ability generation, and damage notation of the form
//! `NdM`, `NdM+K` or `NdM-K`.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on the dice count accepted in damage notation.
pub const MAX_DICE: u32 = 100;

/// Error type for damage notation parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid damage format: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Too many dice: {count} (at most {max})")]
    TooManyDice { count: u32, max: u32 },
}

/// Standard D&D die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

// ============================================================================
// Random sources
// ============================================================================

/// A source of die results.
///
/// Everything that rolls dice in this crate takes a `DieRoller`, so tests can
/// substitute a scripted source (see [`crate::testing::ScriptedDice`]).
pub trait DieRoller {
    /// Roll one die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;

    /// Roll `count` dice, returned in generation order.
    fn roll_dice(&mut self, count: u32, sides: u32) -> Vec<u32> {
        (0..count).map(|_| self.roll_die(sides)).collect()
    }

    /// Pick an index in `0..len` uniformly. Returns `None` for an empty range.
    fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let sides = u32::try_from(len).unwrap_or(u32::MAX);
        Some((self.roll_die(sides) as usize).saturating_sub(1).min(len - 1))
    }
}

impl<T: DieRoller + ?Sized> DieRoller for &mut T {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

/// A [`DieRoller`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngRoller<R> {
    rng: R,
}

impl<R: Rng> RngRoller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngRoller<ThreadRng> {
    /// Roller over the thread-local generator.
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl RngRoller<StdRng> {
    /// Reproducible roller, useful for simulations and tests.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DieRoller for RngRoller<R> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        // A zero-sided die rolls 1.
        self.rng.gen_range(1..=sides.max(1))
    }
}

/// Roll a single die using the thread-local generator.
pub fn roll_die(sides: u32) -> u32 {
    RngRoller::thread().roll_die(sides)
}

/// Roll `count` dice using the thread-local generator.
pub fn roll_dice(count: u32, sides: u32) -> Vec<u32> {
    RngRoller::thread().roll_dice(count, sides)
}

/// Roll 4d6, drop the lowest, for ability score generation.
pub fn roll_ability_score_with<D: DieRoller + ?Sized>(roller: &mut D) -> i32 {
    let mut rolls = roller.roll_dice(4, DieType::D6.sides());
    rolls.sort_by(|a, b| b.cmp(a));
    rolls.iter().take(3).sum::<u32>() as i32
}

/// Roll 4d6, drop the lowest, using the thread-local generator.
pub fn roll_ability_score() -> i32 {
    roll_ability_score_with(&mut RngRoller::thread())
}

// ============================================================================
// Damage notation
// ============================================================================

/// A damage expression: `count` dice of `sides` faces plus a flat modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageExpression {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DamageExpression {
    /// Parse `NdM`, `NdM+K` or `NdM-K`. Whitespace is ignored and the `d`
    /// is case-insensitive; anything else is rejected.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let compact: String = notation
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if compact.is_empty() {
            return Err(DiceError::NoDice);
        }

        let invalid = || DiceError::InvalidNotation(notation.trim().to_string());

        let (count_str, rest) = compact.split_once('d').ok_or_else(invalid)?;
        let (sides_str, modifier) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(pos) => {
                let (sides, signed) = rest.split_at(pos);
                let magnitude = digits(&signed[1..]).ok_or_else(invalid)?;
                let magnitude = i32::try_from(magnitude).map_err(|_| invalid())?;
                let modifier = if signed.starts_with('-') {
                    -magnitude
                } else {
                    magnitude
                };
                (sides, modifier)
            }
            None => (rest, 0),
        };

        let count = digits(count_str).ok_or_else(invalid)?;
        let sides = digits(sides_str).ok_or_else(invalid)?;

        if count == 0 {
            return Err(DiceError::NoDice);
        }
        if count > MAX_DICE {
            return Err(DiceError::TooManyDice {
                count,
                max: MAX_DICE,
            });
        }
        if sides == 0 {
            return Err(DiceError::InvalidDieSize(sides));
        }

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    /// Roll the expression with the given source.
    pub fn roll_with<D: DieRoller + ?Sized>(&self, roller: &mut D) -> DamageRoll {
        let rolls = roller.roll_dice(self.count, self.sides);
        DamageRoll::from_rolls(*self, rolls)
    }

    /// Roll the expression with the thread-local generator.
    pub fn roll(&self) -> DamageRoll {
        self.roll_with(&mut RngRoller::thread())
    }
}

/// Parse a non-empty run of ASCII digits.
fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl FromStr for DamageExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DamageExpression::parse(s)
    }
}

impl fmt::Display for DamageExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if self.modifier > 0 {
            write!(f, "+{}", self.modifier)
        } else if self.modifier < 0 {
            write!(f, "{}", self.modifier)
        } else {
            Ok(())
        }
    }
}

/// Result of rolling a damage expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRoll {
    pub expression: DamageExpression,
    pub rolls: Vec<u32>,
    pub total: i32,
}

impl DamageRoll {
    /// Build a result from already rolled dice.
    pub fn from_rolls(expression: DamageExpression, rolls: Vec<u32>) -> Self {
        let dice_total: i64 = rolls.iter().map(|&r| i64::from(r)).sum();
        let total = (dice_total + i64::from(expression.modifier))
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        Self {
            expression,
            rolls,
            total,
        }
    }

    /// Human-readable breakdown, e.g. `2d6(4, 5) +3`.
    pub fn breakdown(&self) -> String {
        let rolls = self
            .rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let modifier = match self.expression.modifier {
            0 => String::new(),
            m if m > 0 => format!(" +{m}"),
            m => format!(" {m}"),
        };
        format!(
            "{}d{}({rolls}){modifier}",
            self.expression.count, self.expression.sides
        )
    }
}

impl fmt::Display for DamageRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.breakdown(), self.total)
    }
}

/// Convenience function to roll damage from a notation string.
pub fn roll_damage(notation: &str) -> Result<DamageRoll, DiceError> {
    let expr = DamageExpression::parse(notation)?;
    Ok(expr.roll())
}
