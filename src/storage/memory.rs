use std::collections::HashMap;

use parking_lot::RwLock;

use super::{
    EntityLocks,
    EntityStorage,
    StorageError,
};
use crate::content::ContentEntity;
use crate::types::{
    EntityId,
    EntityKey,
    RevisionId,
};

/// Write recorded by [`InMemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    SaveTranslation { key: EntityKey, revision_id: RevisionId, langcode: String },
    SaveEntity { key: EntityKey, revision_id: RevisionId },
}

#[derive(Debug, Default)]
struct StoreState {
    /// Every stored revision, keyed by entity type and revision id.
    revisions: HashMap<(String, RevisionId), ContentEntity>,
    /// Default revision per entity.
    defaults: HashMap<EntityKey, RevisionId>,
    /// Highest entity id handed out per entity type.
    last_entity_id: HashMap<String, EntityId>,
    /// Highest revision id handed out per entity type.
    last_revision_id: HashMap<String, RevisionId>,
    journal: Vec<StorageOp>,
}

impl StoreState {
    fn store(&mut self, entity: ContentEntity) {
        let key = entity.key();
        let last_id = self.last_entity_id.entry(entity.entity_type.clone()).or_default();
        *last_id = (*last_id).max(entity.id);
        let last_revision = self.last_revision_id.entry(entity.entity_type.clone()).or_default();
        *last_revision = (*last_revision).max(entity.revision_id);

        if entity.default_revision
            && let Some(previous) = self.defaults.insert(key, entity.revision_id)
            && previous != entity.revision_id
            && let Some(stored) = self.revisions.get_mut(&(entity.entity_type.clone(), previous))
        {
            stored.default_revision = false;
        }

        self.revisions.insert((entity.entity_type.clone(), entity.revision_id), entity);
    }

    fn next_ids(&mut self, entity_type: &str) -> (EntityId, RevisionId) {
        let id = self.last_entity_id.entry(entity_type.to_string()).or_default();
        *id += 1;
        let id = *id;
        let revision = self.last_revision_id.entry(entity_type.to_string()).or_default();
        *revision += 1;
        (id, *revision)
    }
}

/// Entity storage kept in memory, recording every write.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    state: RwLock<StoreState>,
    locks: EntityLocks,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a revision without journaling it. A default revision replaces the
    /// previous default of the same entity.
    pub fn insert(&self, entity: ContentEntity) {
        self.state.write().store(entity);
    }

    /// Writes performed through [`EntityStorage`] so far.
    #[must_use]
    pub fn journal(&self) -> Vec<StorageOp> {
        self.state.read().journal.clone()
    }

    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.read().journal.len()
    }

    pub fn clear_journal(&self) {
        self.state.write().journal.clear();
    }
}

impl EntityStorage for InMemoryStorage {
    fn load_entity(&self, entity_type: &str, id: EntityId) -> Result<ContentEntity, StorageError> {
        let state = self.state.read();
        let key = EntityKey::new(entity_type, id);
        let revision_id =
            state.defaults.get(&key).copied().ok_or_else(|| StorageError::EntityNotFound(key))?;
        state
            .revisions
            .get(&(entity_type.to_string(), revision_id))
            .cloned()
            .ok_or_else(|| StorageError::RevisionNotFound {
                entity_type: entity_type.to_string(),
                revision_id,
            })
    }

    fn load_revision(
        &self,
        entity_type: &str,
        revision_id: RevisionId,
    ) -> Result<ContentEntity, StorageError> {
        self.state.read().revisions.get(&(entity_type.to_string(), revision_id)).cloned().ok_or_else(
            || StorageError::RevisionNotFound { entity_type: entity_type.to_string(), revision_id },
        )
    }

    fn save_translation(&self, entity: &ContentEntity, langcode: &str) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let slot = (entity.entity_type.clone(), entity.revision_id);
        let Some(stored) = state.revisions.get_mut(&slot) else {
            return Err(StorageError::RevisionNotFound {
                entity_type: entity.entity_type.clone(),
                revision_id: entity.revision_id,
            });
        };

        let values = entity.translation(langcode).cloned().unwrap_or_default();
        stored.set_translation(langcode, values);
        tracing::debug!(
            entity = %entity.key(),
            revision_id = entity.revision_id,
            langcode,
            "Saved translation"
        );
        state.journal.push(StorageOp::SaveTranslation {
            key: entity.key(),
            revision_id: entity.revision_id,
            langcode: langcode.to_string(),
        });
        Ok(())
    }

    fn duplicate(&self, entity: &ContentEntity, langcode: &str) -> Result<ContentEntity, StorageError> {
        let (id, revision_id) = self.state.write().next_ids(&entity.entity_type);

        let mut copy = entity.clone();
        copy.id = id;
        copy.revision_id = revision_id;
        copy.default_revision = true;
        copy.duplicated_from = Some(entity.id);
        copy.retag_language(langcode);
        tracing::debug!(source = %entity.key(), copy = %copy.key(), langcode, "Duplicated entity");
        Ok(copy)
    }

    fn save_entity(&self, entity: &ContentEntity) -> Result<(), StorageError> {
        let mut state = self.state.write();
        state.store(entity.clone());
        state.journal.push(StorageOp::SaveEntity {
            key: entity.key(),
            revision_id: entity.revision_id,
        });
        Ok(())
    }

    fn locks(&self) -> &EntityLocks {
        &self.locks
    }
}
