//! Active mapping records: per-language overrides of the revision a translation is read from.

use serde::{
    Deserialize,
    Serialize,
};

use crate::types::{
    EntityKey,
    ModerationState,
    RevisionRef,
    Scope,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    pub langcode: String,
    pub mapped_revision: RevisionRef,
    pub scope: Scope,
}

impl MappingEntry {
    #[must_use]
    pub fn new(langcode: impl Into<String>, mapped_revision: RevisionRef, scope: Scope) -> Self {
        Self { langcode: langcode.into(), mapped_revision, scope }
    }
}

/// Mapping entries of one entity, unique by langcode and never empty.
///
/// Removing the last entry consumes the record, so an empty record cannot exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordData", into = "RecordData")]
pub struct ActiveMappingRecord {
    entity: EntityKey,
    entries: Vec<MappingEntry>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordData {
    entity: EntityKey,
    entries: Vec<MappingEntry>,
}

impl TryFrom<RecordData> for ActiveMappingRecord {
    type Error = String;

    fn try_from(data: RecordData) -> Result<Self, Self::Error> {
        let mut entries = data.entries.into_iter();
        let first = entries
            .next()
            .ok_or_else(|| format!("mapping record for {} has no entries", data.entity))?;
        let mut record = Self::new(data.entity, first);
        for entry in entries {
            record.upsert(entry);
        }
        Ok(record)
    }
}

impl From<ActiveMappingRecord> for RecordData {
    fn from(record: ActiveMappingRecord) -> Self {
        Self { entity: record.entity, entries: record.entries }
    }
}

impl ActiveMappingRecord {
    #[must_use]
    pub fn new(entity: EntityKey, first: MappingEntry) -> Self {
        Self { entity, entries: vec![first] }
    }

    #[must_use]
    pub const fn entity(&self) -> &EntityKey {
        &self.entity
    }

    #[must_use]
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, langcode: &str) -> Option<&MappingEntry> {
        self.entries.iter().find(|entry| entry.langcode == langcode)
    }

    /// The entry applying to `langcode` when displaying `state`.
    #[must_use]
    pub fn mapping_for(&self, langcode: &str, state: ModerationState) -> Option<&MappingEntry> {
        self.entry(langcode).filter(|entry| entry.scope.covers(state))
    }

    /// Adds an entry or replaces the entry of the same language.
    pub fn upsert(&mut self, entry: MappingEntry) {
        match self.entries.iter_mut().find(|existing| existing.langcode == entry.langcode) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Removes the entry of `langcode`; `None` when no entry is left.
    #[must_use]
    pub fn without(self, langcode: &str) -> Option<Self> {
        self.filter_map(|entry| (entry.langcode != langcode).then_some(entry))
    }

    /// Stops mapping `state` for `langcode`: `Both` narrows to the other state, a
    /// single matching scope removes the entry.
    #[must_use]
    pub fn narrowed(self, langcode: &str, state: ModerationState) -> Option<Self> {
        self.filter_map(|mut entry| {
            if entry.langcode != langcode {
                return Some(entry);
            }
            entry.scope = entry.scope.without(state)?;
            Some(entry)
        })
    }

    /// Rewrites or drops every entry; `None` when no entry is left.
    #[must_use]
    pub fn filter_map(self, f: impl FnMut(MappingEntry) -> Option<MappingEntry>) -> Option<Self> {
        let entries: Vec<MappingEntry> = self.entries.into_iter().filter_map(f).collect();
        (!entries.is_empty()).then_some(Self { entity: self.entity, entries })
    }
}
