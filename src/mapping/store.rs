use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

use super::ActiveMappingRecord;
use crate::storage::StorageError;
use crate::types::EntityKey;

/// Persistence of active mapping records, at most one per entity.
pub trait MappingStore: fmt::Debug + Send + Sync {
    fn load(&self, key: &EntityKey) -> Result<Option<ActiveMappingRecord>, StorageError>;

    fn save(&self, record: ActiveMappingRecord) -> Result<(), StorageError>;

    fn delete(&self, key: &EntityKey) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct InMemoryMappingStore {
    records: RwLock<HashMap<EntityKey, ActiveMappingRecord>>,
}

impl InMemoryMappingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl MappingStore for InMemoryMappingStore {
    fn load(&self, key: &EntityKey) -> Result<Option<ActiveMappingRecord>, StorageError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn save(&self, record: ActiveMappingRecord) -> Result<(), StorageError> {
        self.records.write().insert(record.entity().clone(), record);
        Ok(())
    }

    fn delete(&self, key: &EntityKey) -> Result<(), StorageError> {
        self.records.write().remove(key);
        Ok(())
    }
}
