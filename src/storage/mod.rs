//! Persistence collaborator and per-entity locking.
mod memory;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{
    Mutex,
    MutexGuard,
};
use thiserror::Error;

pub use memory::{
    InMemoryStorage,
    StorageOp,
};

use crate::content::ContentEntity;
use crate::error::TranslationError;
use crate::types::{
    EntityId,
    EntityKey,
    RevisionId,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity {0} not found")]
    EntityNotFound(EntityKey),

    #[error("Revision {revision_id} of entity type '{entity_type}' not found")]
    RevisionNotFound { entity_type: String, revision_id: RevisionId },

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Loads and persists content entities.
pub trait EntityStorage: fmt::Debug + Send + Sync {
    /// Loads the current default revision of an entity.
    fn load_entity(&self, entity_type: &str, id: EntityId) -> Result<ContentEntity, StorageError>;

    fn load_revision(
        &self,
        entity_type: &str,
        revision_id: RevisionId,
    ) -> Result<ContentEntity, StorageError>;

    /// Materializes a translation by cloning the source-language values.
    ///
    /// Must not change `default_revision`.
    fn create_translation(
        &self,
        entity: &mut ContentEntity,
        langcode: &str,
    ) -> Result<(), StorageError> {
        entity.add_translation(langcode);
        Ok(())
    }

    /// Persists one language of a revision in place.
    fn save_translation(&self, entity: &ContentEntity, langcode: &str) -> Result<(), StorageError>;

    /// Allocates a language-tagged copy of a language-unaware entity. The copy keeps
    /// the source id in `duplicated_from`. Nothing is persisted until
    /// [`EntityStorage::save_entity`].
    fn duplicate(&self, entity: &ContentEntity, langcode: &str) -> Result<ContentEntity, StorageError>;

    /// Persists a whole entity (used for duplicates).
    fn save_entity(&self, entity: &ContentEntity) -> Result<(), StorageError>;

    fn locks(&self) -> &EntityLocks;
}

/// Per-entity mutual exclusion.
#[derive(Debug, Default)]
pub struct EntityLocks {
    locks: Mutex<HashMap<EntityKey, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock of `key`.
    ///
    /// Locks are not re-entrant: `f` must not lock the same entity again.
    pub fn with_lock<T>(&self, key: &EntityKey, f: impl FnOnce(&EntityLock<'_>) -> T) -> T {
        let mutex = Arc::clone(self.locks.lock().entry(key.clone()).or_default());
        tracing::trace!(entity = %key, "Acquiring entity lock");
        let lock = EntityLock { key: key.clone(), _guard: mutex.lock() };
        f(&lock)
    }
}

/// Proof that the lock of one entity is held.
#[derive(Debug)]
pub struct EntityLock<'a> {
    key: EntityKey,
    _guard: MutexGuard<'a, ()>,
}

impl EntityLock<'_> {
    #[must_use]
    pub const fn key(&self) -> &EntityKey {
        &self.key
    }

    /// Fails with `LockNotHeld` unless this lock guards `key`.
    pub fn ensure_held(&self, key: &EntityKey) -> Result<(), TranslationError> {
        if &self.key == key {
            Ok(())
        } else {
            Err(TranslationError::LockNotHeld { expected: key.clone(), held: self.key.clone() })
        }
    }
}
