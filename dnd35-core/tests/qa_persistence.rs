//! QA tests for character persistence on disk.
//!
//! These tests drive `CharacterStorage` over a `FileBackend` in a temporary
//! directory and check that saved data survives a fresh storage instance.
//! Run with: `cargo test -p dnd35-core --test qa_persistence`

use dnd35_core::storage::Bucket;
use dnd35_core::testing::sample_fighter;
use dnd35_core::{
    generator, spawn_autosave, Character, CharacterStorage, EditSession, FileBackend,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;

fn storage_in(dir: &TempDir) -> CharacterStorage<FileBackend> {
    CharacterStorage::new(FileBackend::new(dir.path()))
}

// =============================================================================
// TEST 1: Save, then reload from a fresh storage instance
// =============================================================================

#[tokio::test]
async fn test_save_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let mut character = sample_fighter();
    {
        let storage = storage_in(&temp_dir);
        storage.save(&mut character).await.expect("Failed to save");
    }

    let storage = storage_in(&temp_dir);
    let loaded = storage
        .load(character.id)
        .await
        .expect("Failed to load")
        .expect("Character missing after restart");

    assert_eq!(loaded, character);
    assert_eq!(storage.current().await.unwrap(), Some(character.id));

    for bucket in Bucket::all() {
        assert!(
            temp_dir.path().join(format!("{}.json", bucket.key())).exists(),
            "{} should exist on disk",
            bucket.key()
        );
    }
}

// =============================================================================
// TEST 2: Profiles stay consistent with characters
// =============================================================================

#[tokio::test]
async fn test_profiles_track_characters() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let storage = storage_in(&temp_dir);

    let mut ids = Vec::new();
    for name in ["Tordek", "Mialee", "Jozan"] {
        let mut character = generator::random_character();
        character.name = name.to_string();
        storage.save(&mut character).await.expect("Failed to save");
        ids.push(character.id);
    }

    storage.delete(ids[1]).await.expect("Failed to delete");

    let mut character_ids: Vec<_> = storage
        .all_characters()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    let mut profile_ids: Vec<_> = storage
        .list_profiles()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    character_ids.sort();
    profile_ids.sort();

    assert_eq!(character_ids, profile_ids);
    assert_eq!(character_ids.len(), 2);
    assert!(!character_ids.contains(&ids[1]));
}

// =============================================================================
// TEST 3: Export from one store, import into another
// =============================================================================

#[tokio::test]
async fn test_export_import_between_stores() {
    let source_dir = TempDir::new().expect("Failed to create temp directory");
    let target_dir = TempDir::new().expect("Failed to create temp directory");
    let source = storage_in(&source_dir);
    let target = storage_in(&target_dir);

    let mut original = sample_fighter();
    original.notes = "Hates orcs.\nLoves ale.".to_string();
    source.save(&mut original).await.unwrap();

    let json = source
        .export_character(original.id)
        .await
        .unwrap()
        .expect("Export of saved character");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["name"], "Tordek");
    assert_eq!(value["race"], "Dwarf");
    assert_eq!(value["skills"].as_array().map(Vec::len), Some(35));

    let imported = target.import_character(&json).await.unwrap();
    assert_ne!(imported.id, original.id);
    assert_eq!(imported.notes, original.notes);
    assert_eq!(imported.attacks, original.attacks);
    assert_eq!(imported.skills, original.skills);

    let profiles = target.list_profiles().await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, imported.id);
}

// =============================================================================
// TEST 4: Clearing everything removes the files
// =============================================================================

#[tokio::test]
async fn test_clear_all_removes_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let storage = storage_in(&temp_dir);

    let mut character = Character::new("Ember");
    storage.save(&mut character).await.unwrap();
    storage.set_current(character.id).await.unwrap();

    storage.clear_all().await.unwrap();

    for bucket in Bucket::all() {
        assert!(!temp_dir
            .path()
            .join(format!("{}.json", bucket.key()))
            .exists());
    }
    assert!(storage.list_profiles().await.unwrap().is_empty());
}

// =============================================================================
// TEST 5: Auto-save writes pending edits to disk
// =============================================================================

#[tokio::test]
async fn test_autosave_to_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let storage = Arc::new(storage_in(&temp_dir));

    let mut character = sample_fighter();
    storage.save(&mut character).await.unwrap();
    let id = character.id;

    let session = Arc::new(Mutex::new(EditSession::new(character)));
    let ticket = session.lock().await.edit(|c| {
        c.level = 2;
        c.recalculate_derived();
    });

    let saved = spawn_autosave(
        session.clone(),
        storage.clone(),
        ticket,
        Duration::from_millis(10),
    )
    .await
    .expect("Auto-save task panicked")
    .expect("Auto-save failed");
    assert!(saved);

    let fresh = storage_in(&temp_dir);
    let loaded = fresh.load(id).await.unwrap().unwrap();
    assert_eq!(loaded.level, 2);
    assert_eq!(loaded.hit_points.maximum, 20);
    assert_eq!(fresh.list_profiles().await.unwrap()[0].level, 2);
}
