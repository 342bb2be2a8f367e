//! D&D 3.5e rules tables and derived-stat calculations.
//!
//! Everything here is a pure function of its inputs. Callers are responsible
//! for re-running the relevant calculation whenever ability scores, class or
//! level change; nothing in this module caches results.

use crate::dice::DieType;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Classes
// ============================================================================

/// D&D 3.5e core classes.
///
/// Classes outside the core list are kept verbatim as `Custom` and fall back
/// to a d8 hit die, half base attack progression, all-poor saves and no
/// spellcasting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CharacterClass {
    Barbarian,
    Bard,
    Cleric,
    Druid,
    #[default]
    Fighter,
    Monk,
    Paladin,
    Ranger,
    Rogue,
    Sorcerer,
    Wizard,
    Custom(String),
}

impl CharacterClass {
    /// The eleven core classes, in the order offered for random selection.
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
            CharacterClass::Custom(name) => name,
        }
    }

    /// Resolve a class by name, case-insensitively. Unknown names become `Custom`.
    pub fn from_name(name: &str) -> CharacterClass {
        let trimmed = name.trim();
        Self::all()
            .into_iter()
            .find(|class| class.name().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| CharacterClass::Custom(trimmed.to_string()))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, CharacterClass::Custom(_))
    }

    pub fn hit_die(&self) -> DieType {
        match self {
            CharacterClass::Barbarian => DieType::D12,
            CharacterClass::Fighter | CharacterClass::Paladin => DieType::D10,
            CharacterClass::Cleric
            | CharacterClass::Druid
            | CharacterClass::Monk
            | CharacterClass::Ranger
            | CharacterClass::Custom(_) => DieType::D8,
            CharacterClass::Bard | CharacterClass::Rogue => DieType::D6,
            CharacterClass::Sorcerer | CharacterClass::Wizard => DieType::D4,
        }
    }

    pub fn bab_progression(&self) -> BabProgression {
        match self {
            CharacterClass::Barbarian
            | CharacterClass::Fighter
            | CharacterClass::Paladin
            | CharacterClass::Ranger => BabProgression::Full,
            CharacterClass::Bard
            | CharacterClass::Cleric
            | CharacterClass::Druid
            | CharacterClass::Monk
            | CharacterClass::Rogue => BabProgression::ThreeQuarter,
            CharacterClass::Sorcerer | CharacterClass::Wizard | CharacterClass::Custom(_) => {
                BabProgression::Half
            }
        }
    }

    pub fn save_progression(&self) -> SaveProgression {
        let (fortitude, reflex, will) = match self {
            CharacterClass::Barbarian => (true, false, false),
            CharacterClass::Bard => (false, true, true),
            CharacterClass::Cleric => (true, false, true),
            CharacterClass::Druid => (true, false, true),
            CharacterClass::Fighter => (true, false, false),
            CharacterClass::Monk => (true, true, true),
            CharacterClass::Paladin => (true, false, false),
            CharacterClass::Ranger => (true, true, false),
            CharacterClass::Rogue => (false, true, false),
            CharacterClass::Sorcerer => (false, false, true),
            CharacterClass::Wizard => (false, false, true),
            CharacterClass::Custom(_) => (false, false, false),
        };
        SaveProgression {
            fortitude,
            reflex,
            will,
        }
    }

    /// Classes with access to the spell catalog at some level.
    pub fn can_cast_spells(&self) -> bool {
        self.is_full_caster() || matches!(self, CharacterClass::Paladin | CharacterClass::Ranger)
    }

    /// Classes that start with spells when a character is randomized.
    pub fn is_full_caster(&self) -> bool {
        matches!(
            self,
            CharacterClass::Wizard
                | CharacterClass::Sorcerer
                | CharacterClass::Cleric
                | CharacterClass::Druid
                | CharacterClass::Bard
        )
    }
}

impl From<String> for CharacterClass {
    fn from(name: String) -> Self {
        CharacterClass::from_name(&name)
    }
}

impl From<CharacterClass> for String {
    fn from(class: CharacterClass) -> Self {
        match class {
            CharacterClass::Custom(name) => name,
            known => known.name().to_string(),
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Progressions
// ============================================================================

/// Base attack bonus progression tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BabProgression {
    /// Bonus equals level.
    Full,
    /// floor(level * 3/4)
    ThreeQuarter,
    /// floor(level / 2)
    Half,
}

impl BabProgression {
    pub fn bonus(&self, level: u8) -> i32 {
        let level = i32::from(level);
        match self {
            BabProgression::Full => level,
            BabProgression::ThreeQuarter => level * 3 / 4,
            BabProgression::Half => level / 2,
        }
    }
}

/// Which of a class's saving throws use the good progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveProgression {
    pub fortitude: bool,
    pub reflex: bool,
    pub will: bool,
}

impl SaveProgression {
    pub fn good_save(level: u8) -> i32 {
        i32::from(level) / 2 + 2
    }

    pub fn poor_save(level: u8) -> i32 {
        i32::from(level) / 3
    }

    pub fn at_level(&self, level: u8) -> SavingThrows {
        let pick = |good: bool| {
            if good {
                Self::good_save(level)
            } else {
                Self::poor_save(level)
            }
        };
        SavingThrows {
            fortitude: pick(self.fortitude),
            reflex: pick(self.reflex),
            will: pick(self.will),
        }
    }
}

/// Base saving throw bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavingThrows {
    pub fortitude: i32,
    pub reflex: i32,
    pub will: i32,
}

// ============================================================================
// Calculations
// ============================================================================

/// Ability modifier: floor((score - 10) / 2), including negative scores.
pub fn ability_modifier(score: i32) -> i32 {
    score.saturating_sub(10).div_euclid(2)
}

/// Maximum hit points for a single-class character.
///
/// First level takes the full hit die, later levels take half the die plus
/// one. Constitution applies at every level and the result never drops below
/// one hit point per level.
pub fn hit_points(level: u8, class: &CharacterClass, con_mod: i32) -> i32 {
    let hit_die = class.hit_die().sides() as i32;
    let per_level = (hit_die / 2 + 1).saturating_add(con_mod);
    let later_levels = i32::from(level.saturating_sub(1));
    let computed = hit_die
        .saturating_add(con_mod)
        .saturating_add(later_levels.saturating_mul(per_level));
    computed.max(i32::from(level))
}

pub fn base_attack_bonus(class: &CharacterClass, level: u8) -> i32 {
    class.bab_progression().bonus(level)
}

pub fn saving_throws(class: &CharacterClass, level: u8) -> SavingThrows {
    class.save_progression().at_level(level)
}

/// Skill check total: ranks + ability modifier + misc, plus 3 for a class
/// skill with at least one rank.
pub fn skill_total(ranks: u32, ability_mod: i32, misc: i32, is_class_skill: bool) -> i32 {
    let class_bonus = if is_class_skill && ranks > 0 { 3 } else { 0 };
    as_bonus(ranks)
        .saturating_add(ability_mod)
        .saturating_add(misc)
        .saturating_add(class_bonus)
}

/// An unsigned count as a signed bonus, capped at `i32::MAX`.
pub fn as_bonus(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Experience required to reach levels 1 through 20.
pub const EXPERIENCE_TABLE: [u32; 20] = [
    0, 1_000, 3_000, 6_000, 10_000, 15_000, 21_000, 28_000, 36_000, 45_000, 55_000, 66_000,
    78_000, 91_000, 105_000, 120_000, 136_000, 153_000, 171_000, 190_000,
];

/// Experience threshold for `level`. Levels outside 1..=20 have no entry and yield 0.
pub fn experience_for_level(level: u8) -> u32 {
    match level {
        1..=20 => EXPERIENCE_TABLE[usize::from(level) - 1],
        _ => 0,
    }
}

/// Experience needed to advance past `level` (0 at level 20 and beyond).
pub fn experience_needed(level: u8) -> u32 {
    experience_for_level(level.saturating_add(1))
}
