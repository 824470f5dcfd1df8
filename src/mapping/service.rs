use std::sync::Arc;

use super::{
    ActiveMappingRecord,
    MappingEntry,
    MappingStore,
};
use crate::error::TranslationError;
use crate::revision::ModerationInfo;
use crate::storage::EntityLock;
use crate::types::{
    EntityKey,
    HIDDEN_REVISION,
    ModerationState,
    RevisionId,
    RevisionRef,
    Scope,
};

/// Reads and maintains active mapping records.
///
/// Every mutation requires the lock of the entity it touches.
#[derive(Debug, Clone)]
pub struct ActiveMappingService {
    store: Arc<dyn MappingStore>,
    moderation: Arc<dyn ModerationInfo>,
}

impl ActiveMappingService {
    #[must_use]
    pub fn new(store: Arc<dyn MappingStore>, moderation: Arc<dyn ModerationInfo>) -> Self {
        Self { store, moderation }
    }

    pub fn record(&self, key: &EntityKey) -> Result<Option<ActiveMappingRecord>, TranslationError> {
        Ok(self.store.load(key)?)
    }

    /// The entry deciding which revision shows `langcode` in `state`, if any.
    pub fn mapping_for(
        &self,
        key: &EntityKey,
        langcode: &str,
        state: ModerationState,
    ) -> Result<Option<MappingEntry>, TranslationError> {
        Ok(self.record(key)?.and_then(|record| record.mapping_for(langcode, state).cloned()))
    }

    /// Revision whose `langcode` values should be shown for the `state` revision
    /// `own_revision`. May be the hidden sentinel.
    pub fn display_revision(
        &self,
        key: &EntityKey,
        langcode: &str,
        state: ModerationState,
        own_revision: RevisionId,
    ) -> Result<RevisionRef, TranslationError> {
        Ok(self
            .mapping_for(key, langcode, state)?
            .map_or_else(|| RevisionRef::new(key, own_revision), |entry| entry.mapped_revision))
    }

    /// Keeps showing the `previous_revision` translation of `langcode` for the
    /// advanced states. An existing entry keeps its mapped revision and widens its scope.
    pub fn carry_forward(
        &self,
        lock: &EntityLock<'_>,
        key: &EntityKey,
        langcode: &str,
        previous_revision: RevisionId,
        advanced: Scope,
    ) -> Result<(), TranslationError> {
        self.update(lock, key, |record| {
            let entry = match record.as_ref().and_then(|record| record.entry(langcode)) {
                Some(existing) => MappingEntry {
                    scope: existing.scope.union(advanced),
                    ..existing.clone()
                },
                None => MappingEntry::new(langcode, RevisionRef::new(key, previous_revision), advanced),
            };
            tracing::debug!(
                entity = %key,
                langcode,
                mapped_revision = entry.mapped_revision.revision_id,
                scope = %entry.scope,
                "Carried translation forward"
            );
            Ok(Some(upsert(record, key, entry)))
        })
    }

    /// Called after `langcode` was retranslated on the current revision of `state`.
    pub fn narrow(
        &self,
        lock: &EntityLock<'_>,
        key: &EntityKey,
        langcode: &str,
        state: ModerationState,
    ) -> Result<(), TranslationError> {
        self.update(lock, key, |record| Ok(record.and_then(|record| record.narrowed(langcode, state))))
    }

    /// The validated revision got published: Validated entries now apply to
    /// Published, former Published entries are dropped.
    pub fn collapse_to_published(
        &self,
        lock: &EntityLock<'_>,
        key: &EntityKey,
    ) -> Result<(), TranslationError> {
        self.update(lock, key, |record| {
            Ok(record.and_then(|record| {
                record.filter_map(|entry| match entry.scope {
                    Scope::Published => None,
                    Scope::Validated | Scope::Both => {
                        Some(MappingEntry { scope: Scope::Published, ..entry })
                    }
                })
            }))
        })
    }

    /// Maps `langcode` onto a past revision, or onto [`HIDDEN_REVISION`] to hide it.
    pub fn set_mapping(
        &self,
        lock: &EntityLock<'_>,
        key: &EntityKey,
        langcode: &str,
        revision_id: RevisionId,
        scope: Scope,
    ) -> Result<(), TranslationError> {
        self.check_target(key, langcode, revision_id, scope)?;
        self.update(lock, key, |record| {
            let entry = MappingEntry::new(langcode, RevisionRef::new(key, revision_id), scope);
            Ok(Some(upsert(record, key, entry)))
        })
    }

    pub fn hide(
        &self,
        lock: &EntityLock<'_>,
        key: &EntityKey,
        langcode: &str,
        scope: Scope,
    ) -> Result<(), TranslationError> {
        self.set_mapping(lock, key, langcode, HIDDEN_REVISION, scope)
    }

    pub fn remove_mapping(
        &self,
        lock: &EntityLock<'_>,
        key: &EntityKey,
        langcode: &str,
    ) -> Result<(), TranslationError> {
        self.update(lock, key, |record| Ok(record.and_then(|record| record.without(langcode))))
    }

    pub fn delete_record(&self, lock: &EntityLock<'_>, key: &EntityKey) -> Result<(), TranslationError> {
        self.update(lock, key, |_| Ok(None))
    }

    fn check_target(
        &self,
        key: &EntityKey,
        langcode: &str,
        revision_id: RevisionId,
        scope: Scope,
    ) -> Result<(), TranslationError> {
        let invalid = |reason: String| TranslationError::InvalidMappingTarget {
            langcode: langcode.to_string(),
            revision_id,
            reason,
        };

        let live = self.moderation.live_revisions(key);
        for state in scope.states() {
            let current = live
                .revision_for(state)
                .ok_or_else(|| invalid(format!("there is no live {state} revision")))?;
            if revision_id != HIDDEN_REVISION && revision_id >= current {
                return Err(invalid(format!(
                    "it is not older than the current {state} revision {current}"
                )));
            }
        }

        if revision_id == HIDDEN_REVISION {
            return Ok(());
        }

        let was_default = self
            .moderation
            .default_revisions(key)
            .iter()
            .any(|default| default.revision_id == revision_id && default.state.is_live());
        if was_default {
            Ok(())
        } else {
            Err(invalid("it was never a published or validated revision".to_string()))
        }
    }

    fn update(
        &self,
        lock: &EntityLock<'_>,
        key: &EntityKey,
        f: impl FnOnce(
            Option<ActiveMappingRecord>,
        ) -> Result<Option<ActiveMappingRecord>, TranslationError>,
    ) -> Result<(), TranslationError> {
        lock.ensure_held(key)?;

        match f(self.store.load(key)?)? {
            Some(record) => self.store.save(record)?,
            None => self.store.delete(key)?,
        }
        Ok(())
    }
}

fn upsert(
    record: Option<ActiveMappingRecord>,
    key: &EntityKey,
    entry: MappingEntry,
) -> ActiveMappingRecord {
    match record {
        Some(mut record) => {
            record.upsert(entry);
            record
        }
        None => ActiveMappingRecord::new(key.clone(), entry),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::mapping::InMemoryMappingStore;
    use crate::revision::InMemoryModeration;
    use crate::storage::EntityLocks;

    struct Fixture {
        service: ActiveMappingService,
        moderation: Arc<InMemoryModeration>,
        locks: EntityLocks,
        key: EntityKey,
    }

    /// R1 published, R2 validated.
    fn fixture() -> Fixture {
        let moderation = Arc::new(InMemoryModeration::new());
        let key = EntityKey::new("node", 1);
        moderation.record_default(&key, 1, ModerationState::Published);
        moderation.record_default(&key, 2, ModerationState::Validated);
        let service =
            ActiveMappingService::new(Arc::new(InMemoryMappingStore::new()), moderation.clone());
        Fixture { service, moderation, locks: EntityLocks::new(), key }
    }

    impl Fixture {
        fn with_lock<T>(&self, f: impl FnOnce(&EntityLock<'_>) -> T) -> T {
            self.locks.with_lock(&self.key, f)
        }

        fn scope_of(&self, langcode: &str) -> Option<Scope> {
            let record = self.service.record(&self.key).unwrap()?;
            record.entry(langcode).map(|entry| entry.scope)
        }
    }

    #[googletest::test]
    fn carry_forward_creates_the_record() {
        let f = fixture();

        f.with_lock(|lock| f.service.carry_forward(lock, &f.key, "fr", 1, Scope::Validated)).unwrap();

        expect_that!(
            f.service.display_revision(&f.key, "fr", ModerationState::Validated, 2).unwrap(),
            eq(&RevisionRef::new(&f.key, 1))
        );
        expect_that!(
            f.service.display_revision(&f.key, "fr", ModerationState::Published, 1).unwrap(),
            eq(&RevisionRef::new(&f.key, 1))
        );
        expect_that!(f.scope_of("fr"), some(eq(Scope::Validated)));
    }

    #[googletest::test]
    fn carry_forward_keeps_the_original_translation() {
        let f = fixture();

        f.with_lock(|lock| {
            f.service.carry_forward(lock, &f.key, "fr", 1, Scope::Validated)?;
            f.service.carry_forward(lock, &f.key, "fr", 2, Scope::Published)
        })
        .unwrap();

        let entry = f.service.mapping_for(&f.key, "fr", ModerationState::Published).unwrap().unwrap();
        expect_that!(entry.mapped_revision.revision_id, eq(1));
        expect_that!(entry.scope, eq(Scope::Both));
    }

    #[googletest::test]
    fn both_narrows_then_disappears() {
        let f = fixture();
        f.with_lock(|lock| f.service.carry_forward(lock, &f.key, "fr", 1, Scope::Both)).unwrap();

        f.with_lock(|lock| f.service.narrow(lock, &f.key, "fr", ModerationState::Published)).unwrap();
        expect_that!(f.scope_of("fr"), some(eq(Scope::Validated)));

        f.with_lock(|lock| f.service.narrow(lock, &f.key, "fr", ModerationState::Validated)).unwrap();
        expect_that!(f.service.record(&f.key).unwrap().is_none(), eq(true));
    }

    #[rstest]
    #[case(Scope::Validated, Some(Scope::Published))]
    #[case(Scope::Both, Some(Scope::Published))]
    #[case(Scope::Published, None)]
    fn collapse_rewrites_scopes(#[case] scope: Scope, #[case] expected: Option<Scope>) {
        let f = fixture();
        f.with_lock(|lock| f.service.carry_forward(lock, &f.key, "fr", 1, scope)).unwrap();

        f.with_lock(|lock| f.service.collapse_to_published(lock, &f.key)).unwrap();

        assert_eq!(f.scope_of("fr"), expected);
    }

    #[googletest::test]
    fn mapping_onto_the_current_validated_revision_is_rejected() {
        let f = fixture();

        let result =
            f.with_lock(|lock| f.service.set_mapping(lock, &f.key, "fr", 2, Scope::Validated));

        expect_that!(result, err(displays_as(contains_substring("not older"))));
        expect_that!(f.service.record(&f.key).unwrap().is_none(), eq(true));
    }

    #[googletest::test]
    fn mapping_requires_a_past_live_default() {
        let f = fixture();
        f.moderation.record_default(&f.key, 3, ModerationState::Draft);
        f.moderation.record_default(&f.key, 4, ModerationState::Validated);

        let draft = f.with_lock(|lock| f.service.set_mapping(lock, &f.key, "fr", 3, Scope::Validated));
        let validated =
            f.with_lock(|lock| f.service.set_mapping(lock, &f.key, "fr", 2, Scope::Validated));

        expect_that!(draft, err(displays_as(contains_substring("never a published"))));
        expect_that!(validated, ok(anything()));
    }

    #[googletest::test]
    fn mapping_a_state_that_is_not_live_is_rejected() {
        let moderation = Arc::new(InMemoryModeration::new());
        let key = EntityKey::new("node", 1);
        moderation.record_default(&key, 1, ModerationState::Published);
        let service = ActiveMappingService::new(Arc::new(InMemoryMappingStore::new()), moderation);
        let locks = EntityLocks::new();

        let result = locks.with_lock(&key, |lock| service.hide(lock, &key, "fr", Scope::Both));

        expect_that!(result, err(displays_as(contains_substring("no live validated revision"))));
    }

    #[googletest::test]
    fn hiding_maps_onto_the_sentinel() {
        let f = fixture();

        f.with_lock(|lock| f.service.hide(lock, &f.key, "de", Scope::Published)).unwrap();

        let shown = f.service.display_revision(&f.key, "de", ModerationState::Published, 1).unwrap();
        expect_that!(shown.is_hidden(), eq(true));

        f.with_lock(|lock| f.service.remove_mapping(lock, &f.key, "de")).unwrap();
        expect_that!(f.service.record(&f.key).unwrap().is_none(), eq(true));
    }

    #[googletest::test]
    fn mutations_require_the_entity_lock() {
        let f = fixture();
        let other = EntityKey::new("node", 2);

        let result = f
            .locks
            .with_lock(&other, |lock| f.service.carry_forward(lock, &f.key, "fr", 1, Scope::Both));

        expect_that!(result, err(displays_as(contains_substring("is not held"))));
    }

    #[googletest::test]
    fn delete_record_removes_everything() {
        let f = fixture();
        f.with_lock(|lock| {
            f.service.carry_forward(lock, &f.key, "fr", 1, Scope::Both)?;
            f.service.carry_forward(lock, &f.key, "de", 1, Scope::Validated)?;
            f.service.delete_record(lock, &f.key)
        })
        .unwrap();

        expect_that!(f.service.record(&f.key).unwrap().is_none(), eq(true));
    }
}
