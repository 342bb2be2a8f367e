//! Gameplay rolls made from a character sheet.
//!
//! Every roll produces a [`DiceRoll`] with a label, the total and a
//! breakdown of the dice. [`ActionRoller`] keeps a bounded, newest-first
//! history of the rolls it makes. History lives in memory only.

use crate::character::{Ability, Attack, Character};
use crate::dice::{DamageExpression, DiceError, DieRoller, DieType, RngRoller};
use crate::rules::{self, SavingThrows};
use chrono::{DateTime, Utc};
use rand::rngs::ThreadRng;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Default number of rolls kept in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Dice(#[from] DiceError),
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),
}

/// One completed roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRoll {
    /// What was rolled, e.g. "Fortitude Save".
    #[serde(rename = "type")]
    pub label: String,
    pub result: i32,
    pub breakdown: String,
    pub timestamp: DateTime<Utc>,
    /// The d20 came up 20. Always false for damage.
    pub natural_20: bool,
    /// The d20 came up 1. Always false for damage.
    pub natural_1: bool,
}

impl DiceRoll {
    fn d20(label: String, natural: u32, bonus_parts: &[i32]) -> Self {
        let bonus = bonus_parts.iter().copied().fold(0, i32::saturating_add);
        let mut breakdown = format!("1d20({natural})");
        for part in bonus_parts {
            breakdown.push_str(&format!(" + {part}"));
        }
        Self {
            label,
            result: rules::as_bonus(natural).saturating_add(bonus),
            breakdown,
            timestamp: Utc::now(),
            natural_20: natural == 20,
            natural_1: natural == 1,
        }
    }
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} = {}", self.label, self.breakdown, self.result)?;
        if self.natural_20 {
            write!(f, " (Natural 20!)")?;
        } else if self.natural_1 {
            write!(f, " (Natural 1!)")?;
        }
        Ok(())
    }
}

/// The three saving throws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveKind {
    Fortitude,
    Reflex,
    Will,
}

impl SaveKind {
    pub fn all() -> [SaveKind; 3] {
        [SaveKind::Fortitude, SaveKind::Reflex, SaveKind::Will]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SaveKind::Fortitude => "Fortitude",
            SaveKind::Reflex => "Reflex",
            SaveKind::Will => "Will",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            SaveKind::Fortitude => "Fort",
            SaveKind::Reflex => "Ref",
            SaveKind::Will => "Will",
        }
    }

    pub fn bonus(&self, saves: &SavingThrows) -> i32 {
        match self {
            SaveKind::Fortitude => saves.fortitude,
            SaveKind::Reflex => saves.reflex,
            SaveKind::Will => saves.will,
        }
    }

    pub fn from_name(name: &str) -> Option<SaveKind> {
        let name = name.trim();
        Self::all().into_iter().find(|kind| {
            kind.name().eq_ignore_ascii_case(name) || kind.abbreviation().eq_ignore_ascii_case(name)
        })
    }
}

/// Most recent rolls, newest first.
#[derive(Debug, Clone)]
pub struct RollHistory {
    rolls: VecDeque<DiceRoll>,
    capacity: usize,
}

impl RollHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rolls: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, roll: DiceRoll) {
        if self.capacity == 0 {
            return;
        }
        self.rolls.push_front(roll);
        self.rolls.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<&DiceRoll> {
        self.rolls.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiceRoll> {
        self.rolls.iter()
    }

    pub fn len(&self) -> usize {
        self.rolls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.rolls.clear();
    }
}

impl Default for RollHistory {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Rolls
// ============================================================================

pub fn saving_throw<D: DieRoller + ?Sized>(
    character: &Character,
    kind: SaveKind,
    roller: &mut D,
) -> DiceRoll {
    let natural = roller.roll_die(DieType::D20.sides());
    let bonus = kind.bonus(&character.saving_throws);
    DiceRoll::d20(format!("{} Save", kind.name()), natural, &[bonus])
}

pub fn ability_check<D: DieRoller + ?Sized>(
    character: &Character,
    ability: Ability,
    roller: &mut D,
) -> DiceRoll {
    let natural = roller.roll_die(DieType::D20.sides());
    let modifier = character.modifier(ability);
    DiceRoll::d20(format!("{} Check", ability.name()), natural, &[modifier])
}

pub fn attack_roll<D: DieRoller + ?Sized>(attack: &Attack, roller: &mut D) -> DiceRoll {
    let natural = roller.roll_die(DieType::D20.sides());
    DiceRoll::d20(
        format!("{} Attack", attack.name),
        natural,
        &[attack.attack_bonus],
    )
}

/// Roll an attack's damage. Malformed damage notation is an error.
pub fn damage_roll<D: DieRoller + ?Sized>(
    attack: &Attack,
    roller: &mut D,
) -> Result<DiceRoll, ActionError> {
    let expression = DamageExpression::parse(&attack.damage)?;
    let roll = expression.roll_with(roller);
    Ok(DiceRoll {
        label: format!("{} Damage", attack.name),
        result: roll.total,
        breakdown: roll.breakdown(),
        timestamp: Utc::now(),
        natural_20: false,
        natural_1: false,
    })
}

pub fn initiative<D: DieRoller + ?Sized>(character: &Character, roller: &mut D) -> DiceRoll {
    let natural = roller.roll_die(DieType::D20.sides());
    let dex = character.modifier(Ability::Dexterity);
    DiceRoll::d20("Initiative".to_string(), natural, &[dex])
}

/// Skill check. The breakdown lists ranks, ability modifier, misc modifier
/// and class-skill bonus separately.
pub fn skill_check<D: DieRoller + ?Sized>(
    character: &Character,
    skill_name: &str,
    roller: &mut D,
) -> Result<DiceRoll, ActionError> {
    let skill = character
        .skill(skill_name)
        .ok_or_else(|| ActionError::UnknownSkill(skill_name.to_string()))?;
    let natural = roller.roll_die(DieType::D20.sides());
    let parts = [
        rules::as_bonus(skill.ranks),
        character.modifier(skill.ability),
        skill.misc_modifier,
        skill.class_bonus(),
    ];
    Ok(DiceRoll::d20(format!("{} Check", skill.name), natural, &parts))
}

// ============================================================================
// Roller with history
// ============================================================================

/// Makes rolls for a character and records them in a [`RollHistory`].
///
/// Failed rolls leave the history untouched.
#[derive(Debug)]
pub struct ActionRoller<D> {
    dice: D,
    history: RollHistory,
}

impl ActionRoller<RngRoller<ThreadRng>> {
    pub fn new() -> Self {
        Self::with_dice(RngRoller::thread())
    }
}

impl Default for ActionRoller<RngRoller<ThreadRng>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DieRoller> ActionRoller<D> {
    pub fn with_dice(dice: D) -> Self {
        Self {
            dice,
            history: RollHistory::new(),
        }
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = RollHistory::with_capacity(capacity);
        self
    }

    pub fn history(&self) -> &RollHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn record(&mut self, roll: DiceRoll) -> DiceRoll {
        debug!(label = %roll.label, result = roll.result, "Rolled");
        self.history.push(roll.clone());
        roll
    }

    pub fn saving_throw(&mut self, character: &Character, kind: SaveKind) -> DiceRoll {
        let roll = saving_throw(character, kind, &mut self.dice);
        self.record(roll)
    }

    pub fn ability_check(&mut self, character: &Character, ability: Ability) -> DiceRoll {
        let roll = ability_check(character, ability, &mut self.dice);
        self.record(roll)
    }

    pub fn attack(&mut self, attack: &Attack) -> DiceRoll {
        let roll = attack_roll(attack, &mut self.dice);
        self.record(roll)
    }

    pub fn damage(&mut self, attack: &Attack) -> Result<DiceRoll, ActionError> {
        let roll = damage_roll(attack, &mut self.dice)?;
        Ok(self.record(roll))
    }

    pub fn initiative(&mut self, character: &Character) -> DiceRoll {
        let roll = initiative(character, &mut self.dice);
        self.record(roll)
    }

    pub fn skill_check(
        &mut self,
        character: &Character,
        skill_name: &str,
    ) -> Result<DiceRoll, ActionError> {
        let roll = skill_check(character, skill_name, &mut self.dice)?;
        Ok(self.record(roll))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_fighter, ScriptedDice};

    fn scripted(values: impl IntoIterator<Item = u32>) -> ActionRoller<ScriptedDice> {
        ActionRoller::with_dice(ScriptedDice::new(values))
    }

    fn attack(damage: &str) -> Attack {
        Attack {
            name: "Longsword".to_string(),
            attack_bonus: 5,
            damage: damage.to_string(),
            ..Attack::default()
        }
    }

    #[test]
    fn test_saving_throw() {
        let fighter = sample_fighter();
        let mut roller = scripted([12]);
        let roll = roller.saving_throw(&fighter, SaveKind::Fortitude);
        assert_eq!(roll.label, "Fortitude Save");
        assert_eq!(roll.result, 14);
        assert_eq!(roll.breakdown, "1d20(12) + 2");
        assert!(!roll.natural_20 && !roll.natural_1);
    }

    #[test]
    fn test_extreme_bonuses_saturate() {
        let mut fighter = sample_fighter();
        fighter.saving_throws.will = i32::MAX;
        let mut roller = scripted([20, 7]);
        let roll = roller.saving_throw(&fighter, SaveKind::Will);
        assert_eq!(roll.result, i32::MAX);
        assert!(roll.natural_20);

        let skill = fighter.skill_mut("Climb").unwrap();
        skill.ranks = u32::MAX;
        let roll = roller.skill_check(&fighter, "Climb").unwrap();
        assert_eq!(roll.result, i32::MAX);
    }

    #[test]
    fn test_ability_check_uses_current_scores() {
        let mut fighter = sample_fighter();
        fighter.ability_scores.strength = 20;
        let mut roller = scripted([10]);
        let roll = roller.ability_check(&fighter, Ability::Strength);
        assert_eq!(roll.label, "Strength Check");
        assert_eq!(roll.result, 15);
        assert_eq!(roll.breakdown, "1d20(10) + 5");
    }

    #[test]
    fn test_attack_naturals() {
        let mut roller = scripted([20, 1]);
        let crit = roller.attack(&attack("1d8+3"));
        assert_eq!(crit.label, "Longsword Attack");
        assert_eq!(crit.result, 25);
        assert!(crit.natural_20);
        assert!(crit.to_string().ends_with("(Natural 20!)"));

        let fumble = roller.attack(&attack("1d8+3"));
        assert!(fumble.natural_1);
        assert!(!fumble.natural_20);
    }

    #[test]
    fn test_damage() {
        let mut roller = scripted([4, 5]);
        let roll = roller.damage(&attack("2d6+3")).unwrap();
        assert_eq!(roll.label, "Longsword Damage");
        assert_eq!(roll.result, 12);
        assert_eq!(roll.breakdown, "2d6(4, 5) +3");
        assert!(!roll.natural_20 && !roll.natural_1);
        assert_eq!(roller.history().len(), 1);
    }

    #[test]
    fn test_bad_damage_adds_no_history() {
        let mut roller = scripted([4, 5]);
        let result = roller.damage(&attack("banana"));
        assert!(matches!(
            result,
            Err(ActionError::Dice(DiceError::InvalidNotation(_)))
        ));
        assert!(roller.history().is_empty());
    }

    #[test]
    fn test_initiative() {
        let fighter = sample_fighter();
        let mut roller = scripted([7]);
        let roll = roller.initiative(&fighter);
        assert_eq!(roll.label, "Initiative");
        assert_eq!(roll.breakdown, "1d20(7) + 1");
        assert_eq!(roll.result, 8);
    }

    #[test]
    fn test_skill_check_breakdown() {
        let fighter = sample_fighter();
        let mut roller = scripted([11]);
        let roll = roller.skill_check(&fighter, "Climb").unwrap();
        assert_eq!(roll.label, "Climb Check");
        assert_eq!(roll.breakdown, "1d20(11) + 4 + 3 + 0 + 3");
        assert_eq!(roll.result, 21);
    }

    #[test]
    fn test_unknown_skill() {
        let fighter = sample_fighter();
        let mut roller = scripted([11]);
        assert_eq!(
            roller.skill_check(&fighter, "Basket Weaving"),
            Err(ActionError::UnknownSkill("Basket Weaving".to_string()))
        );
        assert!(roller.history().is_empty());
    }

    #[test]
    fn test_history_is_bounded_newest_first() {
        let fighter = sample_fighter();
        let mut roller = scripted(1..=12);
        for _ in 0..12 {
            roller.initiative(&fighter);
        }
        let naturals: Vec<_> = roller
            .history()
            .iter()
            .map(|r| r.result - 1)
            .collect();
        assert_eq!(naturals, vec![12, 11, 10, 9, 8, 7, 6, 5, 4, 3]);

        roller.clear_history();
        assert!(roller.history().is_empty());
    }

    #[test]
    fn test_history_capacity() {
        let fighter = sample_fighter();
        let mut roller = scripted([3, 4, 5]).with_history_capacity(2);
        for _ in 0..3 {
            roller.saving_throw(&fighter, SaveKind::Will);
        }
        assert_eq!(roller.history().len(), 2);
        assert_eq!(
            roller.history().latest().map(|r| r.breakdown.as_str()),
            Some("1d20(5) + 0")
        );
    }

    #[test]
    fn test_save_kind_from_name() {
        assert_eq!(SaveKind::from_name("fort"), Some(SaveKind::Fortitude));
        assert_eq!(SaveKind::from_name("Reflex"), Some(SaveKind::Reflex));
        assert_eq!(SaveKind::from_name("REF"), Some(SaveKind::Reflex));
        assert_eq!(SaveKind::from_name("will"), Some(SaveKind::Will));
        assert_eq!(SaveKind::from_name("luck"), None);
    }

    #[test]
    fn test_thread_roller_ranges() {
        let fighter = sample_fighter();
        let mut roller = ActionRoller::new();
        for _ in 0..100 {
            let roll = roller.initiative(&fighter);
            assert!((2..=21).contains(&roll.result));
        }
        assert_eq!(roller.history().len(), DEFAULT_HISTORY_CAPACITY);
    }
}
