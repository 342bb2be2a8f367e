//! D&D 3.5e character sheet engine.
//!
//! This crate provides:
//! - Dice rolling with injectable randomness
//! - 3.5e derived-stat rules (modifiers, hit points, BAB, saves, experience)
//! - Character generation in manual, random and partial-random modes
//! - A spell catalog filtered by class and level
//! - Gameplay rolls with a bounded roll history
//! - Character persistence over pluggable storage backends
//!
//! # Quick Start
//!
//! ```ignore
//! use dnd35_core::{generator, CharacterStorage, FileBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = CharacterStorage::new(FileBackend::new("dnd35-data"));
//!
//!     let mut character = generator::random_character();
//!     character.name = "Thorin".to_string();
//!     storage.save(&mut character).await?;
//!
//!     for profile in storage.list_profiles().await? {
//!         println!("{} (level {} {})", profile.name, profile.level, profile.character_class);
//!     }
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod character;
pub mod config;
pub mod dice;
pub mod generator;
pub mod rules;
pub mod session;
pub mod spells;
pub mod storage;
pub mod testing;

// Primary public API
pub use actions::{ActionError, ActionRoller, DiceRoll, RollHistory, SaveKind};
pub use character::{
    Ability, AbilityScores, Alignment, Character, CharacterId, CharacterProfile, Race, Size,
    ValidationError,
};
pub use config::{ConfigError, Dnd35Config};
pub use dice::{DamageExpression, DiceError, DieRoller, RngRoller};
pub use generator::{CharacterBuilder, CreationMode, RandomizeOptions};
pub use rules::CharacterClass;
pub use session::{schedule_autosave, spawn_autosave, AutoSaveTicket, EditSession};
pub use storage::{
    Bucket, CharacterStorage, FileBackend, MemoryBackend, StorageBackend, StorageError,
};
