//! Cache of recomposed previews.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::content::ContentEntity;
use crate::types::{
    EntityId,
    EntityKey,
    RevisionId,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewKey {
    pub entity_type: String,
    pub entity_id: EntityId,
    pub langcode: String,
    pub revision_id: RevisionId,
}

impl PreviewKey {
    #[must_use]
    pub fn new(key: &EntityKey, langcode: &str, revision_id: RevisionId) -> Self {
        Self {
            entity_type: key.entity_type.clone(),
            entity_id: key.entity_id,
            langcode: langcode.to_string(),
            revision_id,
        }
    }
}

/// Previews keyed by entity, language and revision. The owner decides when entries
/// go stale and calls [`PreviewCache::invalidate`].
#[derive(Debug, Default)]
pub struct PreviewCache {
    entries: Mutex<HashMap<PreviewKey, Arc<ContentEntity>>>,
}

impl PreviewCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &PreviewKey) -> Option<Arc<ContentEntity>> {
        self.entries.lock().get(key).cloned()
    }

    /// Returns the cached preview or builds and stores it. Failed builds are not cached.
    pub fn get_or_try_insert<E>(
        &self,
        key: PreviewKey,
        build: impl FnOnce() -> Result<ContentEntity, E>,
    ) -> Result<Arc<ContentEntity>, E> {
        if let Some(hit) = self.get(&key) {
            tracing::debug!(entity_id = key.entity_id, langcode = %key.langcode, "Preview cache hit");
            return Ok(hit);
        }
        let preview = Arc::new(build()?);
        self.entries.lock().insert(key, preview.clone());
        Ok(preview)
    }

    /// Drops every preview of an entity.
    pub fn invalidate(&self, entity: &EntityKey) {
        self.entries
            .lock()
            .retain(|key, _| key.entity_type != entity.entity_type || key.entity_id != entity.entity_id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
