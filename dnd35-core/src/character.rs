//! D&D 3.5e character records.
//!
//! `Character` is the aggregate root: it owns ability scores, combat stats,
//! skills, feats, equipment, attacks, spells, money and notes. A few fields
//! are cached projections of others (ability modifiers, the armor class
//! total); the methods here re-derive them in the same call that changes
//! their inputs.

use crate::dice::{DamageExpression, DiceError};
use crate::rules::{self, CharacterClass, SavingThrows};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Errors for edits that would leave a character in an invalid state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a character name before saving")]
    MissingName,
    #[error("Please enter a spell name")]
    MissingSpellName,
    #[error("Spell slot {index} is out of range ({len} spells)")]
    SpellIndexOutOfRange { index: usize, len: usize },
}

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CharacterId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(CharacterId)
    }
}

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
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

    /// Match a full name or abbreviation, case-insensitively.
    pub fn from_name(name: &str) -> Option<Ability> {
        let name = name.trim();
        Self::all().into_iter().find(|a| {
            a.name().eq_ignore_ascii_case(name) || a.abbreviation().eq_ignore_ascii_case(name)
        })
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Raw ability scores. Manual entry is unbounded.
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
        rules::ability_modifier(self.get(ability))
    }

    pub fn modifiers(&self) -> AbilityModifiers {
        AbilityModifiers {
            strength: self.modifier(Ability::Strength),
            dexterity: self.modifier(Ability::Dexterity),
            constitution: self.modifier(Ability::Constitution),
            intelligence: self.modifier(Ability::Intelligence),
            wisdom: self.modifier(Ability::Wisdom),
            charisma: self.modifier(Ability::Charisma),
        }
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

/// Cached ability modifiers, kept for display and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbilityModifiers {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl AbilityModifiers {
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
}

// ============================================================================
// Skills
// ============================================================================

/// The standard skill list and each skill's governing ability.
pub const STANDARD_SKILLS: [(&str, Ability); 35] = [
    ("Appraise", Ability::Intelligence),
    ("Balance", Ability::Dexterity),
    ("Bluff", Ability::Charisma),
    ("Climb", Ability::Strength),
    ("Concentration", Ability::Constitution),
    ("Craft", Ability::Intelligence),
    ("Decipher Script", Ability::Intelligence),
    ("Diplomacy", Ability::Charisma),
    ("Disable Device", Ability::Intelligence),
    ("Disguise", Ability::Charisma),
    ("Escape Artist", Ability::Dexterity),
    ("Forgery", Ability::Intelligence),
    ("Gather Information", Ability::Charisma),
    ("Handle Animal", Ability::Charisma),
    ("Heal", Ability::Wisdom),
    ("Hide", Ability::Dexterity),
    ("Intimidate", Ability::Charisma),
    ("Jump", Ability::Strength),
    ("Knowledge", Ability::Intelligence),
    ("Listen", Ability::Wisdom),
    ("Move Silently", Ability::Dexterity),
    ("Open Lock", Ability::Dexterity),
    ("Perform", Ability::Charisma),
    ("Profession", Ability::Wisdom),
    ("Ride", Ability::Dexterity),
    ("Search", Ability::Intelligence),
    ("Sense Motive", Ability::Wisdom),
    ("Sleight of Hand", Ability::Dexterity),
    ("Spellcraft", Ability::Intelligence),
    ("Spot", Ability::Wisdom),
    ("Survival", Ability::Wisdom),
    ("Swim", Ability::Strength),
    ("Tumble", Ability::Dexterity),
    ("Use Magic Device", Ability::Charisma),
    ("Use Rope", Ability::Dexterity),
];

/// A skill entry on the character sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    #[serde(rename = "abilityScore")]
    pub ability: Ability,
    pub ranks: u32,
    pub misc_modifier: i32,
    pub is_class_skill: bool,
    pub trained: bool,
}

impl Skill {
    pub fn new(name: impl Into<String>, ability: Ability) -> Self {
        Self {
            name: name.into(),
            ability,
            ranks: 0,
            misc_modifier: 0,
            is_class_skill: false,
            trained: false,
        }
    }

    /// 3 when this is a class skill with ranks invested, otherwise 0.
    pub fn class_bonus(&self) -> i32 {
        if self.is_class_skill && self.ranks > 0 {
            3
        } else {
            0
        }
    }

    /// Check modifier given the governing ability's score.
    pub fn total(&self, scores: &AbilityScores) -> i32 {
        rules::skill_total(
            self.ranks,
            scores.modifier(self.ability),
            self.misc_modifier,
            self.is_class_skill,
        )
    }
}

/// Fresh skill list with zero ranks in every standard skill.
pub fn default_skills() -> Vec<Skill> {
    STANDARD_SKILLS
        .iter()
        .map(|(name, ability)| Skill::new(*name, *ability))
        .collect()
}

// ============================================================================
// Combat
// ============================================================================

/// Hit points tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub maximum: i32,
    pub temporary: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
            temporary: 0,
        }
    }
}

impl Default for HitPoints {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Armor class with its contributing components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorClass {
    pub total: i32,
    pub armor: i32,
    pub shield: i32,
    pub dex: i32,
    pub size: i32,
    pub natural: i32,
    pub deflection: i32,
    pub misc: i32,
}

impl ArmorClass {
    /// Unarmored AC for the given dexterity modifier.
    pub fn unarmored(dex_mod: i32) -> Self {
        let mut ac = Self {
            total: 0,
            armor: 0,
            shield: 0,
            dex: dex_mod,
            size: 0,
            natural: 0,
            deflection: 0,
            misc: 0,
        };
        ac.recompute();
        ac
    }

    /// 10 plus every component.
    pub fn computed_total(&self) -> i32 {
        [
            self.armor,
            self.shield,
            self.dex,
            self.size,
            self.natural,
            self.deflection,
            self.misc,
        ]
        .into_iter()
        .fold(10, i32::saturating_add)
    }

    pub fn recompute(&mut self) {
        self.total = self.computed_total();
    }
}

impl Default for ArmorClass {
    fn default() -> Self {
        Self::unarmored(0)
    }
}

// ============================================================================
// Owned records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Feat {
    pub name: String,
    pub description: String,
    pub prerequisites: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Equipment {
    pub name: String,
    pub quantity: u32,
    pub weight: f64,
    pub description: String,
    pub equipped: bool,
}

/// A weapon or natural attack usable from the actions screen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attack {
    pub name: String,
    pub attack_bonus: i32,
    /// Damage notation such as `1d8+3`.
    pub damage: String,
    pub critical: String,
    pub range: String,
    #[serde(rename = "type")]
    pub attack_type: String,
}

impl Attack {
    pub fn damage_expression(&self) -> Result<DamageExpression, DiceError> {
        DamageExpression::parse(&self.damage)
    }
}

/// A spell recorded on the character sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    pub level: u8,
    pub school: String,
    pub description: String,
    pub prepared: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Money {
    pub copper: u32,
    pub silver: u32,
    pub gold: u32,
    pub platinum: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub current: u32,
    pub needed: u32,
}

impl Default for Experience {
    fn default() -> Self {
        Self {
            current: 0,
            needed: rules::experience_needed(1),
        }
    }
}

// ============================================================================
// Race, alignment, size
// ============================================================================

/// Player races. Anything else is kept verbatim as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Race {
    #[default]
    Human,
    Elf,
    Dwarf,
    Halfling,
    Gnome,
    HalfElf,
    HalfOrc,
    Custom(String),
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
            Race::Custom(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Race {
        let trimmed = name.trim();
        Self::all()
            .into_iter()
            .find(|race| race.name().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| Race::Custom(trimmed.to_string()))
    }
}

impl From<String> for Race {
    fn from(name: String) -> Self {
        Race::from_name(&name)
    }
}

impl From<Race> for String {
    fn from(race: Race) -> Self {
        match race {
            Race::Custom(name) => name,
            known => known.name().to_string(),
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[serde(rename = "Lawful Good")]
    LawfulGood,
    #[serde(rename = "Neutral Good")]
    NeutralGood,
    #[serde(rename = "Chaotic Good")]
    ChaoticGood,
    #[serde(rename = "Lawful Neutral")]
    LawfulNeutral,
    #[default]
    #[serde(rename = "True Neutral")]
    TrueNeutral,
    #[serde(rename = "Chaotic Neutral")]
    ChaoticNeutral,
    #[serde(rename = "Lawful Evil")]
    LawfulEvil,
    #[serde(rename = "Neutral Evil")]
    NeutralEvil,
    #[serde(rename = "Chaotic Evil")]
    ChaoticEvil,
}

impl Alignment {
    pub fn all() -> [Alignment; 9] {
        [
            Alignment::LawfulGood,
            Alignment::NeutralGood,
            Alignment::ChaoticGood,
            Alignment::LawfulNeutral,
            Alignment::TrueNeutral,
            Alignment::ChaoticNeutral,
            Alignment::LawfulEvil,
            Alignment::NeutralEvil,
            Alignment::ChaoticEvil,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Alignment::LawfulGood => "Lawful Good",
            Alignment::NeutralGood => "Neutral Good",
            Alignment::ChaoticGood => "Chaotic Good",
            Alignment::LawfulNeutral => "Lawful Neutral",
            Alignment::TrueNeutral => "True Neutral",
            Alignment::ChaoticNeutral => "Chaotic Neutral",
            Alignment::LawfulEvil => "Lawful Evil",
            Alignment::NeutralEvil => "Neutral Evil",
            Alignment::ChaoticEvil => "Chaotic Evil",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Size {
    Fine,
    Diminutive,
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
    Colossal,
}

impl Size {
    pub fn all() -> [Size; 9] {
        [
            Size::Fine,
            Size::Diminutive,
            Size::Tiny,
            Size::Small,
            Size::Medium,
            Size::Large,
            Size::Huge,
            Size::Gargantuan,
            Size::Colossal,
        ]
    }
}

// ============================================================================
// Character
// ============================================================================

/// A complete character sheet.
///
/// Serialized field names are camelCase; this is also the export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub player_name: String,

    pub race: Race,
    pub character_class: CharacterClass,
    pub level: u8,
    pub alignment: Alignment,
    pub deity: String,
    pub size: Size,
    pub age: u32,
    pub gender: String,
    pub height: String,
    pub weight: String,
    pub eyes: String,
    pub hair: String,
    pub skin: String,

    pub ability_scores: AbilityScores,
    pub ability_modifiers: AbilityModifiers,

    pub hit_points: HitPoints,
    pub armor_class: ArmorClass,
    pub base_attack_bonus: i32,
    pub spell_resistance: i32,
    pub saving_throws: SavingThrows,

    pub skills: Vec<Skill>,
    pub feats: Vec<Feat>,
    pub equipment: Vec<Equipment>,
    pub money: Money,
    pub attacks: Vec<Attack>,

    pub spells: Vec<Spell>,
    /// Spells per day, keyed by spell level.
    pub spells_per_day: BTreeMap<u8, u32>,
    /// Spells known, keyed by spell level.
    pub spells_known: BTreeMap<u8, u32>,

    pub experience: Experience,
    pub notes: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    /// A level 1 character with default values and the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CharacterId::new(),
            name: name.into(),
            player_name: String::new(),
            race: Race::Human,
            character_class: CharacterClass::Fighter,
            level: 1,
            alignment: Alignment::TrueNeutral,
            deity: String::new(),
            size: Size::Medium,
            age: 25,
            gender: String::new(),
            height: String::new(),
            weight: String::new(),
            eyes: String::new(),
            hair: String::new(),
            skin: String::new(),
            ability_scores: AbilityScores::default(),
            ability_modifiers: AbilityModifiers::default(),
            hit_points: HitPoints::new(10),
            armor_class: ArmorClass::default(),
            base_attack_bonus: 1,
            spell_resistance: 0,
            saving_throws: SavingThrows {
                fortitude: 2,
                reflex: 0,
                will: 0,
            },
            skills: default_skills(),
            feats: Vec::new(),
            equipment: Vec::new(),
            money: Money::default(),
            attacks: Vec::new(),
            spells: Vec::new(),
            spells_per_day: BTreeMap::new(),
            spells_known: BTreeMap::new(),
            experience: Experience::default(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the ability scores and re-derive everything cached from them.
    pub fn set_ability_scores(&mut self, scores: AbilityScores) {
        self.ability_scores = scores;
        self.refresh_cached();
    }

    /// Set a single ability score and re-derive cached values.
    pub fn set_ability_score(&mut self, ability: Ability, score: i32) {
        self.ability_scores.set(ability, score);
        self.refresh_cached();
    }

    /// Recompute modifiers and the armor class total from their sources.
    pub fn refresh_cached(&mut self) {
        self.ability_modifiers = self.ability_scores.modifiers();
        self.armor_class.recompute();
    }

    /// Authoritative modifier, computed from the current score.
    pub fn modifier(&self, ability: Ability) -> i32 {
        self.ability_scores.modifier(ability)
    }

    /// Recompute every class- and level-derived stat.
    ///
    /// Hit points are reset to full with no temporary points, the dexterity
    /// component of armor class follows the current modifier, and experience
    /// needed follows the level. Current experience is left alone.
    pub fn recalculate_derived(&mut self) {
        self.ability_modifiers = self.ability_scores.modifiers();
        let con_mod = self.ability_modifiers.constitution;

        let max_hp = rules::hit_points(self.level, &self.character_class, con_mod);
        self.hit_points = HitPoints::new(max_hp);
        self.base_attack_bonus = rules::base_attack_bonus(&self.character_class, self.level);
        self.saving_throws = rules::saving_throws(&self.character_class, self.level);

        self.armor_class.dex = self.ability_modifiers.dexterity;
        self.armor_class.recompute();

        self.experience.needed = rules::experience_needed(self.level);
    }

    pub fn skill(&self, name: &str) -> Option<&Skill> {
        self.skills
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn skill_mut(&mut self, name: &str) -> Option<&mut Skill> {
        self.skills
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn skill_total(&self, name: &str) -> Option<i32> {
        self.skill(name).map(|s| s.total(&self.ability_scores))
    }

    /// Check that the record can be saved.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        Ok(())
    }

    /// A copy with a fresh id and timestamps, named "<name> (Copy)".
    pub fn duplicate(&self) -> Character {
        let now = Utc::now();
        let mut copy = self.clone();
        copy.id = CharacterId::new();
        copy.name = format!("{} (Copy)", self.name);
        copy.created_at = now;
        copy.updated_at = now;
        copy
    }

    /// Lightweight summary used for listings.
    pub fn profile(&self, last_played: DateTime<Utc>) -> CharacterProfile {
        CharacterProfile {
            id: self.id,
            name: self.name.clone(),
            level: self.level,
            race: self.race.clone(),
            character_class: self.character_class.clone(),
            last_played,
        }
    }
}

impl Default for Character {
    fn default() -> Self {
        Self::new("New Character")
    }
}

/// Listing projection of a saved character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfile {
    pub id: CharacterId,
    pub name: String,
    pub level: u8,
    pub race: Race,
    pub character_class: CharacterClass,
    pub last_played: DateTime<Utc>,
}

/// Sort profiles most recently played first.
pub fn sort_by_last_played(profiles: &mut [CharacterProfile]) {
    profiles.sort_by(|a, b| b.last_played.cmp(&a.last_played));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_default_character() {
        let character = Character::default();
        assert_eq!(character.name, "New Character");
        assert_eq!(character.level, 1);
        assert_eq!(character.ability_scores, AbilityScores::default());
        assert_eq!(character.ability_modifiers, AbilityModifiers::default());
        assert_eq!(character.hit_points, HitPoints::new(10));
        assert_eq!(character.armor_class.total, 10);
        assert_eq!(character.experience.needed, 1_000);
        assert_eq!(character.skills.len(), 35);
        assert!(character.feats.is_empty());
        assert!(character.spells.is_empty());
        assert_eq!(character.created_at, character.updated_at);
    }

    #[test]
    fn test_set_ability_scores_refreshes_modifiers() {
        let mut character = Character::default();
        character.set_ability_scores(AbilityScores::new(18, 14, 7, 3, 10, 9));
        assert_eq!(character.ability_modifiers.strength, 4);
        assert_eq!(character.ability_modifiers.dexterity, 2);
        assert_eq!(character.ability_modifiers.constitution, -2);
        assert_eq!(character.ability_modifiers.intelligence, -4);
        assert_eq!(character.ability_modifiers.wisdom, 0);
        assert_eq!(character.ability_modifiers.charisma, -1);

        character.set_ability_score(Ability::Wisdom, 15);
        assert_eq!(character.ability_modifiers.wisdom, 2);
        assert_eq!(character.modifier(Ability::Wisdom), 2);
    }

    #[test]
    fn test_armor_class_total() {
        let mut ac = ArmorClass::unarmored(2);
        assert_eq!(ac.total, 12);
        ac.armor = 5;
        ac.shield = 2;
        ac.size = -1;
        ac.natural = 1;
        ac.deflection = 1;
        ac.misc = 1;
        assert_eq!(ac.total, 12, "total is only refreshed on recompute");
        ac.recompute();
        assert_eq!(ac.total, 21);
    }

    #[test]
    fn test_recalculate_derived() {
        let mut character = Character::new("Lidda");
        character.character_class = CharacterClass::Rogue;
        character.level = 3;
        character.ability_scores = AbilityScores::new(10, 16, 12, 14, 10, 8);
        character.armor_class.armor = 2;
        character.hit_points.temporary = 5;

        character.recalculate_derived();

        // d6: 6 + 1, then 2 * (3 + 1 + 1)
        assert_eq!(character.hit_points, HitPoints::new(17));
        assert_eq!(character.base_attack_bonus, 2);
        assert_eq!(
            character.saving_throws,
            SavingThrows {
                fortitude: 1,
                reflex: 3,
                will: 1
            }
        );
        assert_eq!(character.armor_class.dex, 3);
        assert_eq!(character.armor_class.total, 15);
        assert_eq!(character.experience.needed, 6_000);
    }

    #[test]
    fn test_huge_manual_scores_do_not_overflow() {
        let mut character = Character::new("Colossus");
        character.level = 3;
        character.set_ability_score(Ability::Constitution, 2_000_000_000);
        character.armor_class.armor = i32::MAX;
        character.recalculate_derived();

        assert_eq!(character.ability_modifiers.constitution, 999_999_995);
        assert_eq!(character.hit_points.maximum, i32::MAX);
        assert_eq!(character.hit_points.current, i32::MAX);
        assert_eq!(character.armor_class.total, i32::MAX);

        character.set_ability_score(Ability::Dexterity, i32::MIN);
        character.armor_class.armor = i32::MIN;
        character.recalculate_derived();
        assert_eq!(character.armor_class.total, i32::MIN);
    }

    #[test]
    fn test_skill_totals() {
        let mut character = Character::default();
        character.set_ability_score(Ability::Wisdom, 14);
        let spot = character.skill_mut("Spot").unwrap();
        spot.ranks = 4;
        spot.is_class_skill = true;
        assert_eq!(character.skill_total("spot"), Some(9));

        character.skill_mut("Spot").unwrap().is_class_skill = false;
        assert_eq!(character.skill_total("Spot"), Some(6));

        assert_eq!(character.skill_total("Basket Weaving"), None);
    }

    #[test]
    fn test_validate_requires_name() {
        let mut character = Character::new("   ");
        assert_eq!(character.validate(), Err(ValidationError::MissingName));
        character.name = "Tordek".to_string();
        assert!(character.validate().is_ok());
    }

    #[test]
    fn test_duplicate() {
        let original = Character::new("Mialee");
        let copy = original.duplicate();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name, "Mialee (Copy)");
        assert_eq!(copy.ability_scores, original.ability_scores);
        assert!(copy.created_at >= original.created_at);
    }

    #[test]
    fn test_profile_and_sorting() {
        let now = Utc::now();
        let a = Character::new("Alpha").profile(now - Duration::hours(2));
        let b = Character::new("Beta").profile(now);
        let c = Character::new("Charlie").profile(now - Duration::hours(1));

        let mut profiles = vec![a, b, c];
        sort_by_last_played(&mut profiles);
        let names: Vec<_> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Charlie", "Alpha"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut character = Character::new("Jozan");
        character.attacks.push(Attack {
            name: "Mace".to_string(),
            attack_bonus: 1,
            damage: "1d8".to_string(),
            critical: "x2".to_string(),
            range: String::new(),
            attack_type: "Bludgeoning".to_string(),
        });
        character.spells_per_day.insert(0, 3);

        let json = serde_json::to_value(&character).unwrap();
        assert_eq!(json["characterClass"], "Fighter");
        assert_eq!(json["race"], "Human");
        assert_eq!(json["alignment"], "True Neutral");
        assert_eq!(json["size"], "Medium");
        assert_eq!(json["abilityScores"]["strength"], 10);
        assert_eq!(json["hitPoints"]["maximum"], 10);
        assert_eq!(json["savingThrows"]["fortitude"], 2);
        assert_eq!(json["skills"][0]["abilityScore"], "intelligence");
        assert_eq!(json["skills"][0]["isClassSkill"], false);
        assert_eq!(json["attacks"][0]["attackBonus"], 1);
        assert_eq!(json["attacks"][0]["type"], "Bludgeoning");
        assert_eq!(json["spellsPerDay"]["0"], 3);
        assert!(json["createdAt"].is_string());

        let back: Character = serde_json::from_value(json).unwrap();
        assert_eq!(back, character);
    }

    #[test]
    fn test_race_names() {
        assert_eq!(Race::from_name("half-orc"), Race::HalfOrc);
        assert_eq!(Race::HalfElf.to_string(), "Half-Elf");
        assert_eq!(
            Race::from_name("Tiefling"),
            Race::Custom("Tiefling".to_string())
        );
    }

    #[test]
    fn test_character_id_parse() {
        let id = CharacterId::new();
        let parsed: CharacterId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<CharacterId>().is_err());
    }

    #[test]
    fn test_ability_from_name() {
        assert_eq!(Ability::from_name("dex"), Some(Ability::Dexterity));
        assert_eq!(Ability::from_name("Wisdom"), Some(Ability::Wisdom));
        assert_eq!(Ability::from_name("luck"), None);
    }
}
