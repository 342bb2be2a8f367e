//! Editing session for a single character.
//!
//! An `EditSession` owns the character being edited and tracks whether it
//! has changes that are not yet in storage. Each edit bumps a revision and
//! hands back an [`AutoSaveTicket`]; an auto-save presented with a stale
//! ticket does nothing, so a delayed auto-save can never write over a newer
//! edit or a newer manual save.

use crate::character::Character;
use crate::config::Dnd35Config;
use crate::storage::{CharacterStorage, StorageBackend, StorageError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// Proof of a particular edit, redeemed by [`EditSession::autosave`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveTicket {
    revision: u64,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    character: Character,
    revision: u64,
    saved_revision: u64,
}

impl EditSession {
    /// Start editing a character that matches what is in storage.
    pub fn new(character: Character) -> Self {
        Self {
            character,
            revision: 0,
            saved_revision: 0,
        }
    }

    /// Start editing a character that has never been saved.
    pub fn unsaved(character: Character) -> Self {
        Self {
            character,
            revision: 1,
            saved_revision: 0,
        }
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn into_character(self) -> Character {
        self.character
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Apply an edit. Cached fields are re-derived afterwards.
    pub fn edit<F>(&mut self, change: F) -> AutoSaveTicket
    where
        F: FnOnce(&mut Character),
    {
        change(&mut self.character);
        self.character.refresh_cached();
        self.mark_changed()
    }

    /// Record that the character changed outside [`EditSession::edit`].
    pub fn mark_changed(&mut self) -> AutoSaveTicket {
        self.revision += 1;
        AutoSaveTicket {
            revision: self.revision,
        }
    }

    /// Save now. On failure the session keeps its unsaved changes.
    #[instrument(skip_all, fields(character_id = %self.character.id))]
    pub async fn save<B: StorageBackend>(
        &mut self,
        storage: &CharacterStorage<B>,
    ) -> Result<(), StorageError> {
        storage.save(&mut self.character).await?;
        self.saved_revision = self.revision;
        Ok(())
    }

    /// Save if `ticket` is still the latest edit and it has not been saved.
    /// Returns whether a save happened.
    pub async fn autosave<B: StorageBackend>(
        &mut self,
        storage: &CharacterStorage<B>,
        ticket: AutoSaveTicket,
    ) -> Result<bool, StorageError> {
        if ticket.revision != self.revision || !self.has_unsaved_changes() {
            debug!(
                ticket = ticket.revision,
                revision = self.revision,
                "Skipping superseded auto-save"
            );
            return Ok(false);
        }
        self.save(storage).await?;
        debug!(character_id = %self.character.id, "Auto-saved character");
        Ok(true)
    }
}

/// Auto-save `session` after `delay`, unless a newer edit or save happened
/// in the meantime.
pub fn spawn_autosave<B>(
    session: Arc<Mutex<EditSession>>,
    storage: Arc<CharacterStorage<B>>,
    ticket: AutoSaveTicket,
    delay: Duration,
) -> JoinHandle<Result<bool, StorageError>>
where
    B: StorageBackend + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let mut session = session.lock().await;
        let result = session.autosave(&storage, ticket).await;
        if let Err(e) = &result {
            warn!(error = %e, "Auto-save failed");
        }
        result
    })
}

/// [`spawn_autosave`] using the configured auto-save delay.
pub fn schedule_autosave<B>(
    session: Arc<Mutex<EditSession>>,
    storage: Arc<CharacterStorage<B>>,
    ticket: AutoSaveTicket,
    config: &Dnd35Config,
) -> JoinHandle<Result<bool, StorageError>>
where
    B: StorageBackend + 'static,
{
    spawn_autosave(session, storage, ticket, config.autosave_delay)
}
