//! Character persistence.
//!
//! Storage is split in two layers. A [`StorageBackend`] is a dumb keyed blob
//! store with three buckets: the character list, the profile list, and the
//! current-character pointer. [`CharacterStorage`] implements the character
//! contract on top of any backend and keeps the profile list consistent with
//! the character list.

use crate::character::{Character, CharacterId, CharacterProfile, ValidationError};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt data in {bucket}: {source}")]
    Corrupt {
        bucket: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// The logical keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Characters,
    Profiles,
    CurrentCharacter,
}

impl Bucket {
    pub fn key(&self) -> &'static str {
        match self {
            Bucket::Characters => "dnd35_characters",
            Bucket::Profiles => "dnd35_character_profiles",
            Bucket::CurrentCharacter => "dnd35_current_character",
        }
    }

    pub fn all() -> [Bucket; 3] {
        [Bucket::Characters, Bucket::Profiles, Bucket::CurrentCharacter]
    }
}

/// A keyed store of serialized documents.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read a bucket. Missing buckets are `Ok(None)`.
    async fn read(&self, bucket: Bucket) -> Result<Option<String>, StorageError>;

    /// Replace a bucket's contents.
    async fn write(&self, bucket: Bucket, contents: &str) -> Result<(), StorageError>;

    /// Remove a bucket. Removing a missing bucket succeeds.
    async fn remove(&self, bucket: Bucket) -> Result<(), StorageError>;
}

// ============================================================================
// Backends
// ============================================================================

/// Backend that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    buckets: RwLock<HashMap<Bucket, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, bucket: Bucket) -> Result<Option<String>, StorageError> {
        Ok(self.buckets.read().await.get(&bucket).cloned())
    }

    async fn write(&self, bucket: Bucket, contents: &str) -> Result<(), StorageError> {
        self.buckets
            .write()
            .await
            .insert(bucket, contents.to_string());
        Ok(())
    }

    async fn remove(&self, bucket: Bucket) -> Result<(), StorageError> {
        self.buckets.write().await.remove(&bucket);
        Ok(())
    }
}

/// Backend storing one JSON file per bucket in a directory.
///
/// Writes go to a temporary file which is then renamed over the target, so
/// a failed write never leaves a truncated bucket behind.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, bucket: Bucket) -> PathBuf {
        self.root.join(format!("{}.json", bucket.key()))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn read(&self, bucket: Bucket) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(bucket)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, bucket: Bucket, contents: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.path_for(bucket);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, bucket: Bucket) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(bucket)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Character storage
// ============================================================================

/// The character persistence contract, over any backend.
#[derive(Debug)]
pub struct CharacterStorage<B> {
    backend: B,
}

impl<B: StorageBackend> CharacterStorage<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn read_list<T: DeserializeOwned>(&self, bucket: Bucket) -> Result<Vec<T>, StorageError> {
        match self.backend.read(bucket).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                bucket: bucket.key(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn write_list<T: Serialize>(&self, bucket: Bucket, items: &[T]) -> Result<(), StorageError> {
        let json = serde_json::to_string(items)?;
        self.backend.write(bucket, &json).await
    }

    /// The raw characters bucket and its parsed contents.
    async fn read_characters_raw(&self) -> Result<(Option<String>, Vec<Character>), StorageError> {
        let raw = self.backend.read(Bucket::Characters).await?;
        let characters = match &raw {
            Some(raw) => serde_json::from_str(raw).map_err(|source| StorageError::Corrupt {
                bucket: Bucket::Characters.key(),
                source,
            })?,
            None => Vec::new(),
        };
        Ok((raw, characters))
    }

    /// Put the characters bucket back to `previous` after a failed profile
    /// write.
    async fn restore_characters(&self, previous: Option<String>) {
        let restored = match previous {
            Some(raw) => self.backend.write(Bucket::Characters, &raw).await,
            None => self.backend.remove(Bucket::Characters).await,
        };
        if let Err(e) = restored {
            error!(error = %e, "Failed to restore character list");
        }
    }

    /// Every stored character, with cached fields re-derived.
    pub async fn all_characters(&self) -> Result<Vec<Character>, StorageError> {
        let mut characters: Vec<Character> = self.read_list(Bucket::Characters).await?;
        for character in &mut characters {
            character.refresh_cached();
        }
        Ok(characters)
    }

    /// Every stored profile, in storage order.
    #[instrument(skip(self), err)]
    pub async fn list_profiles(&self) -> Result<Vec<CharacterProfile>, StorageError> {
        let profiles: Vec<CharacterProfile> = self.read_list(Bucket::Profiles).await?;
        debug!(count = profiles.len(), "Listed character profiles");
        Ok(profiles)
    }

    /// Persist a character and its profile.
    ///
    /// On success `character.updated_at` is set to the save time. On failure
    /// neither the stored data nor `character` is changed.
    #[instrument(skip(self, character), fields(character_id = %character.id), err)]
    pub async fn save(&self, character: &mut Character) -> Result<(), StorageError> {
        character.validate()?;

        let now = Utc::now();
        let mut record = character.clone();
        record.updated_at = now;
        record.refresh_cached();

        let (previous, mut characters) = self.read_characters_raw().await?;
        let mut profiles: Vec<CharacterProfile> = self.read_list(Bucket::Profiles).await?;

        match characters.iter_mut().find(|c| c.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => characters.push(record.clone()),
        }
        let profile = record.profile(now);
        match profiles.iter_mut().find(|p| p.id == record.id) {
            Some(existing) => *existing = profile,
            None => profiles.push(profile),
        }

        self.write_list(Bucket::Characters, &characters).await?;
        if let Err(e) = self.write_list(Bucket::Profiles, &profiles).await {
            error!(error = %e, "Failed to write profile, restoring character list");
            self.restore_characters(previous).await;
            return Err(e);
        }

        *character = record;
        info!(name = %character.name, "Saved character");
        Ok(())
    }

    /// Load a character by id and make it the current character.
    #[instrument(skip(self), fields(character_id = %id), err)]
    pub async fn load(&self, id: CharacterId) -> Result<Option<Character>, StorageError> {
        let character = self
            .all_characters()
            .await?
            .into_iter()
            .find(|c| c.id == id);
        match &character {
            Some(c) => {
                self.set_current(id).await?;
                debug!(name = %c.name, "Loaded character");
            }
            None => debug!("Character not found"),
        }
        Ok(character)
    }

    /// Delete a character and its profile, clearing the current pointer if
    /// it referenced this character. Returns whether anything was removed.
    ///
    /// If the profile write fails the character list is restored, so the
    /// two lists never disagree.
    #[instrument(skip(self), fields(character_id = %id), err)]
    pub async fn delete(&self, id: CharacterId) -> Result<bool, StorageError> {
        let (previous, characters) = self.read_characters_raw().await?;
        let profiles: Vec<CharacterProfile> = self.read_list(Bucket::Profiles).await?;

        let had_character = characters.iter().any(|c| c.id == id);
        let had_profile = profiles.iter().any(|p| p.id == id);

        if had_character {
            let remaining: Vec<_> = characters.into_iter().filter(|c| c.id != id).collect();
            self.write_list(Bucket::Characters, &remaining).await?;
        }
        if had_profile {
            let remaining: Vec<_> = profiles.into_iter().filter(|p| p.id != id).collect();
            if let Err(e) = self.write_list(Bucket::Profiles, &remaining).await {
                if had_character {
                    error!(error = %e, "Failed to write profiles, restoring character list");
                    self.restore_characters(previous).await;
                }
                return Err(e);
            }
        }
        if self.current().await? == Some(id) {
            self.clear_current().await?;
        }

        if had_character || had_profile {
            info!("Deleted character");
        } else {
            debug!("Delete of unknown character ignored");
        }
        Ok(had_character || had_profile)
    }

    pub async fn current(&self) -> Result<Option<CharacterId>, StorageError> {
        match self.backend.read(Bucket::CurrentCharacter).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Corrupt {
                    bucket: Bucket::CurrentCharacter.key(),
                    source,
                }),
            None => Ok(None),
        }
    }

    pub async fn set_current(&self, id: CharacterId) -> Result<(), StorageError> {
        let json = serde_json::to_string(&id)?;
        self.backend.write(Bucket::CurrentCharacter, &json).await
    }

    pub async fn clear_current(&self) -> Result<(), StorageError> {
        self.backend.remove(Bucket::CurrentCharacter).await
    }

    /// The character the current pointer refers to, if it still exists.
    pub async fn current_character(&self) -> Result<Option<Character>, StorageError> {
        let Some(id) = self.current().await? else {
            return Ok(None);
        };
        Ok(self
            .all_characters()
            .await?
            .into_iter()
            .find(|c| c.id == id))
    }

    /// Remove every bucket.
    #[instrument(skip(self), err)]
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        for bucket in Bucket::all() {
            self.backend.remove(bucket).await?;
        }
        warn!("Cleared all stored character data");
        Ok(())
    }

    /// Pretty-printed JSON export of a stored character.
    #[instrument(skip(self), fields(character_id = %id), err)]
    pub async fn export_character(&self, id: CharacterId) -> Result<Option<String>, StorageError> {
        let Some(character) = self
            .all_characters()
            .await?
            .into_iter()
            .find(|c| c.id == id)
        else {
            return Ok(None);
        };
        Ok(Some(serde_json::to_string_pretty(&character)?))
    }

    /// Import an exported character as a new record with its own id and
    /// timestamps.
    #[instrument(skip(self, json), fields(json_len = json.len()), err)]
    pub async fn import_character(&self, json: &str) -> Result<Character, StorageError> {
        let mut character: Character = serde_json::from_str(json)?;
        let now = Utc::now();
        character.id = CharacterId::new();
        character.created_at = now;
        character.updated_at = now;
        character.refresh_cached();

        self.save(&mut character).await?;
        info!(character_id = %character.id, name = %character.name, "Imported character");
        Ok(character)
    }

    /// Save a copy of a stored character under a new id.
    #[instrument(skip(self), fields(character_id = %id), err)]
    pub async fn duplicate_character(
        &self,
        id: CharacterId,
    ) -> Result<Option<Character>, StorageError> {
        let Some(original) = self
            .all_characters()
            .await?
            .into_iter()
            .find(|c| c.id == id)
        else {
            return Ok(None);
        };
        let mut copy = original.duplicate();
        self.save(&mut copy).await?;
        info!(copy_id = %copy.id, "Duplicated character");
        Ok(Some(copy))
    }
}
