//! Character generation.
//!
//! Three creation modes: manual (all defaults), fully random, and partial
//! randomization of an existing character. Plus a fluent builder for
//! constructing a character by hand with derived stats filled in.

use crate::character::{
    Ability, AbilityScores, Alignment, ArmorClass, Character, Race, Size, Spell,
};
use crate::dice::{roll_ability_score_with, DieRoller, RngRoller};
use crate::rules::{self, CharacterClass};
use crate::spells::spells_for_class;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Most spells attached when a caster is randomized.
pub const RANDOM_SPELL_COUNT: usize = 3;

/// Which aspects of a character partial randomization overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizeOptions {
    pub randomize_stats: bool,
    pub randomize_race: bool,
    pub randomize_class: bool,
    pub randomize_alignment: bool,
    /// Reserved; currently has no effect.
    pub randomize_skills: bool,
    /// Reserved; currently has no effect.
    pub randomize_feats: bool,
}

impl Default for RandomizeOptions {
    fn default() -> Self {
        Self {
            randomize_stats: true,
            randomize_race: true,
            randomize_class: true,
            randomize_alignment: true,
            randomize_skills: false,
            randomize_feats: false,
        }
    }
}

impl RandomizeOptions {
    /// All toggles off. Applying this only recomputes derived stats.
    pub fn none() -> Self {
        Self {
            randomize_stats: false,
            randomize_race: false,
            randomize_class: false,
            randomize_alignment: false,
            randomize_skills: false,
            randomize_feats: false,
        }
    }
}

/// How a new character is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationMode {
    Manual,
    Random,
    /// Start from defaults and randomize the selected aspects.
    Partial(RandomizeOptions),
}

fn pick<T: Clone, D: DieRoller + ?Sized>(roller: &mut D, items: &[T]) -> Option<T> {
    roller.pick_index(items.len()).and_then(|i| items.get(i).cloned())
}

/// Roll all six ability scores with 4d6 drop lowest, in ability order.
pub fn roll_ability_scores_with<D: DieRoller + ?Sized>(roller: &mut D) -> AbilityScores {
    let mut scores = AbilityScores::default();
    for ability in Ability::all() {
        scores.set(ability, roll_ability_score_with(roller));
    }
    scores
}

pub fn roll_ability_scores() -> AbilityScores {
    roll_ability_scores_with(&mut RngRoller::thread())
}

/// Create a character in the given mode.
pub fn generate_with<D: DieRoller + ?Sized>(mode: &CreationMode, roller: &mut D) -> Character {
    match mode {
        CreationMode::Manual => Character::default(),
        CreationMode::Random => random_character_with(roller),
        CreationMode::Partial(options) => {
            let mut character = Character::default();
            apply_partial_with(&mut character, options, roller);
            character
        }
    }
}

pub fn generate(mode: &CreationMode) -> Character {
    generate_with(mode, &mut RngRoller::thread())
}

/// A level 1 Medium character with rolled scores and a random race, class
/// and alignment.
///
/// Dice are consumed in a fixed order: 24 d6 for the scores, then one pick
/// each for race, class and alignment.
pub fn random_character_with<D: DieRoller + ?Sized>(roller: &mut D) -> Character {
    let mut character = Character::default();
    character.ability_scores = roll_ability_scores_with(roller);
    if let Some(race) = pick(roller, &Race::all()) {
        character.race = race;
    }
    if let Some(class) = pick(roller, &CharacterClass::all()) {
        character.character_class = class;
    }
    if let Some(alignment) = pick(roller, &Alignment::all()) {
        character.alignment = alignment;
    }
    character.level = 1;
    character.size = Size::Medium;

    character.ability_modifiers = character.ability_scores.modifiers();
    character.armor_class = ArmorClass::unarmored(character.ability_modifiers.dexterity);
    character.recalculate_derived();
    character.experience.current = 0;

    debug!(
        race = %character.race,
        class = %character.character_class,
        "Generated random character"
    );
    character
}

pub fn random_character() -> Character {
    random_character_with(&mut RngRoller::thread())
}

/// Randomize the selected aspects of `character`, then recompute hit
/// points, base attack bonus, saves, armor class and experience.
///
/// Full casters get up to three distinct eligible spells in place of their
/// current list, the first of them prepared. Other classes keep their spells.
pub fn apply_partial_with<D: DieRoller + ?Sized>(
    character: &mut Character,
    options: &RandomizeOptions,
    roller: &mut D,
) {
    if options.randomize_stats {
        character.ability_scores = roll_ability_scores_with(roller);
    }
    if options.randomize_race {
        if let Some(race) = pick(roller, &Race::all()) {
            character.race = race;
        }
    }
    if options.randomize_class {
        if let Some(class) = pick(roller, &CharacterClass::all()) {
            character.character_class = class;
        }
    }
    if options.randomize_alignment {
        if let Some(alignment) = pick(roller, &Alignment::all()) {
            character.alignment = alignment;
        }
    }

    character.recalculate_derived();
    character.experience.current = 0;

    if character.character_class.is_full_caster() {
        character.spells = draw_spells(&character.character_class, character.level, roller);
    }
}

pub fn apply_partial(character: &mut Character, options: &RandomizeOptions) {
    apply_partial_with(character, options, &mut RngRoller::thread());
}

/// Draw up to `RANDOM_SPELL_COUNT` distinct eligible spells.
fn draw_spells<D: DieRoller + ?Sized>(
    class: &CharacterClass,
    level: u8,
    roller: &mut D,
) -> Vec<Spell> {
    let mut pool = spells_for_class(class, level);
    let mut drawn = Vec::with_capacity(RANDOM_SPELL_COUNT);
    while drawn.len() < RANDOM_SPELL_COUNT {
        let Some(index) = roller.pick_index(pool.len()) else {
            break;
        };
        let spell = pool.remove(index);
        drawn.push(spell.to_spell(drawn.is_empty()));
    }
    drawn
}

// ============================================================================
// Builder
// ============================================================================

/// Error from character building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    MissingName,
    InvalidLevel(u8),
}

impl std::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuilderError::MissingName => write!(f, "Character name is required"),
            BuilderError::InvalidLevel(level) => {
                write!(f, "Level must be between 1 and 20, got {level}")
            }
        }
    }
}

impl std::error::Error for BuilderError {}

/// Builder for manually created characters.
#[derive(Debug, Clone, Default)]
pub struct CharacterBuilder {
    name: Option<String>,
    player_name: Option<String>,
    race: Option<Race>,
    class: Option<CharacterClass>,
    level: Option<u8>,
    alignment: Option<Alignment>,
    ability_scores: Option<AbilityScores>,
}

impl CharacterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn player_name(mut self, player_name: impl Into<String>) -> Self {
        self.player_name = Some(player_name.into());
        self
    }

    pub fn race(mut self, race: Race) -> Self {
        self.race = Some(race);
        self
    }

    pub fn class(mut self, class: CharacterClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn ability_scores(mut self, scores: AbilityScores) -> Self {
        self.ability_scores = Some(scores);
        self
    }

    /// Roll the scores with 4d6 drop lowest.
    pub fn rolled<D: DieRoller + ?Sized>(self, roller: &mut D) -> Self {
        let scores = roll_ability_scores_with(roller);
        self.ability_scores(scores)
    }

    /// Build the character, computing every derived stat.
    pub fn build(self) -> Result<Character, BuilderError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(BuilderError::MissingName)?;
        let level = self.level.unwrap_or(1);
        if !(1..=20).contains(&level) {
            return Err(BuilderError::InvalidLevel(level));
        }

        let mut character = Character::new(name);
        if let Some(player_name) = self.player_name {
            character.player_name = player_name;
        }
        character.race = self.race.unwrap_or_default();
        character.character_class = self.class.unwrap_or_default();
        character.level = level;
        character.alignment = self.alignment.unwrap_or_default();
        character.ability_scores = self.ability_scores.unwrap_or_default();
        character.recalculate_derived();
        character.experience.current = rules::experience_for_level(level);
        Ok(character)
    }
}
