//! Testing utilities.
//!
//! - `ScriptedDice` for deterministic rolls
//! - `FailingBackend` for injecting storage failures
//! - `sample_fighter` for a fully populated character

use crate::character::{Ability, AbilityScores, Attack, Character, Equipment, Feat, Race};
use crate::dice::DieRoller;
use crate::rules::CharacterClass;
use crate::storage::{Bucket, MemoryBackend, StorageBackend, StorageError};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// A die source that returns scripted values in order.
///
/// Each value is clamped to the die being rolled. Once the script runs out
/// every roll is a 1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    values: VecDeque<u32>,
    rolled: usize,
}

impl ScriptedDice {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            rolled: 0,
        }
    }

    /// Number of dice rolled so far.
    pub fn rolled(&self) -> usize {
        self.rolled
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl DieRoller for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rolled += 1;
        let value = self.values.pop_front().unwrap_or(1);
        value.clamp(1, sides.max(1))
    }
}

#[derive(Debug, Default)]
struct Faults {
    reads: bool,
    writes: HashSet<Bucket>,
}

/// In-memory backend whose reads or writes can be made to fail.
#[derive(Debug, Default)]
pub struct FailingBackend {
    inner: MemoryBackend,
    faults: Mutex<Faults>,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent read.
    pub fn fail_reads(&self) {
        self.with_faults(|f| f.reads = true);
    }

    /// Fail subsequent writes to `bucket`.
    pub fn fail_writes_to(&self, bucket: Bucket) {
        self.with_faults(|f| {
            f.writes.insert(bucket);
        });
    }

    /// Fail subsequent writes to every bucket.
    pub fn fail_all_writes(&self) {
        self.with_faults(|f| f.writes.extend(Bucket::all()));
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        self.with_faults(|f| *f = Faults::default());
    }

    fn with_faults<T>(&self, op: impl FnOnce(&mut Faults) -> T) -> T {
        let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        op(&mut faults)
    }
}

#[async_trait]
impl StorageBackend for FailingBackend {
    async fn read(&self, bucket: Bucket) -> Result<Option<String>, StorageError> {
        if self.with_faults(|f| f.reads) {
            return Err(StorageError::Backend(format!(
                "injected read failure for {}",
                bucket.key()
            )));
        }
        self.inner.read(bucket).await
    }

    async fn write(&self, bucket: Bucket, contents: &str) -> Result<(), StorageError> {
        if self.with_faults(|f| f.writes.contains(&bucket)) {
            return Err(StorageError::Backend(format!(
                "injected write failure for {}",
                bucket.key()
            )));
        }
        self.inner.write(bucket, contents).await
    }

    async fn remove(&self, bucket: Bucket) -> Result<(), StorageError> {
        if self.with_faults(|f| f.writes.contains(&bucket)) {
            return Err(StorageError::Backend(format!(
                "injected remove failure for {}",
                bucket.key()
            )));
        }
        self.inner.remove(bucket).await
    }
}

/// A level 1 dwarf fighter with gear, an attack, a feat and a trained skill.
pub fn sample_fighter() -> Character {
    let mut character = Character::new("Tordek");
    character.player_name = "Sam".to_string();
    character.race = Race::Dwarf;
    character.character_class = CharacterClass::Fighter;
    character.age = 53;
    character.ability_scores = AbilityScores::new(16, 12, 14, 10, 12, 8);
    character.armor_class.armor = 4;
    character.armor_class.shield = 2;
    character.recalculate_derived();

    if let Some(climb) = character.skill_mut("Climb") {
        climb.ranks = 4;
        climb.is_class_skill = true;
        climb.trained = true;
    }

    character.feats.push(Feat {
        name: "Power Attack".to_string(),
        description: "Trade attack bonus for damage.".to_string(),
        prerequisites: "Str 13".to_string(),
    });
    character.equipment.push(Equipment {
        name: "Dwarven Waraxe".to_string(),
        quantity: 1,
        weight: 8.0,
        description: String::new(),
        equipped: true,
    });
    character.equipment.push(Equipment {
        name: "Scale Mail".to_string(),
        quantity: 1,
        weight: 30.0,
        description: String::new(),
        equipped: true,
    });
    character.attacks.push(Attack {
        name: "Dwarven Waraxe".to_string(),
        attack_bonus: character.base_attack_bonus + character.modifier(Ability::Strength),
        damage: "1d10+3".to_string(),
        critical: "x3".to_string(),
        range: String::new(),
        attack_type: "Slashing".to_string(),
    });
    character.money.gold = 15;
    character
}
