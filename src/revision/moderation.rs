//! Moderation history as seen by the translation core.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{
    Deserialize,
    Serialize,
};

use crate::types::{
    EntityKey,
    ModerationState,
    RevisionId,
};

/// A revision that became the current revision of a moderation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultRevision {
    pub revision_id: RevisionId,
    pub state: ModerationState,
}

/// The revisions currently alive for an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveRevisions {
    pub published: Option<RevisionId>,
    /// Only set when newer than the published revision.
    pub validated: Option<RevisionId>,
}

impl LiveRevisions {
    #[must_use]
    pub const fn revision_for(&self, state: ModerationState) -> Option<RevisionId> {
        match state {
            ModerationState::Published => self.published,
            ModerationState::Validated => self.validated,
            ModerationState::Draft | ModerationState::Archived => None,
        }
    }

    /// The live state a revision currently represents, Validated first.
    #[must_use]
    pub fn state_of(&self, revision_id: RevisionId) -> Option<ModerationState> {
        if self.validated == Some(revision_id) {
            Some(ModerationState::Validated)
        } else if self.published == Some(revision_id) {
            Some(ModerationState::Published)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.published.is_none() && self.validated.is_none()
    }
}

/// Read access to the moderation engine.
pub trait ModerationInfo: fmt::Debug + Send + Sync {
    /// Revisions that were ever the current revision of a state, oldest first.
    fn default_revisions(&self, key: &EntityKey) -> Vec<DefaultRevision>;

    /// Current revision of a moderation state.
    fn current_revision_for(&self, key: &EntityKey, state: ModerationState) -> Option<RevisionId>;

    fn live_revisions(&self, key: &EntityKey) -> LiveRevisions {
        let published = self.current_revision_for(key, ModerationState::Published);
        let validated = self
            .current_revision_for(key, ModerationState::Validated)
            .filter(|validated| published.is_none_or(|published| *validated > published));
        LiveRevisions { published, validated }
    }
}

/// Moderation history kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryModeration {
    history: RwLock<HashMap<EntityKey, Vec<DefaultRevision>>>,
}

impl InMemoryModeration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `revision_id` became the current revision of `state`.
    pub fn record_default(&self, key: &EntityKey, revision_id: RevisionId, state: ModerationState) {
        tracing::debug!(entity = %key, revision_id, %state, "Recorded default revision");
        self.history
            .write()
            .entry(key.clone())
            .or_default()
            .push(DefaultRevision { revision_id, state });
    }

    pub fn forget(&self, key: &EntityKey) {
        self.history.write().remove(key);
    }
}

impl ModerationInfo for InMemoryModeration {
    fn default_revisions(&self, key: &EntityKey) -> Vec<DefaultRevision> {
        self.history.read().get(key).cloned().unwrap_or_default()
    }

    fn current_revision_for(&self, key: &EntityKey, state: ModerationState) -> Option<RevisionId> {
        self.history
            .read()
            .get(key)?
            .iter()
            .rev()
            .find(|default| default.state == state)
            .map(|default| default.revision_id)
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn history(entries: &[(RevisionId, ModerationState)]) -> (InMemoryModeration, EntityKey) {
        let moderation = InMemoryModeration::new();
        let key = EntityKey::new("node", 1);
        for (revision_id, state) in entries {
            moderation.record_default(&key, *revision_id, *state);
        }
        (moderation, key)
    }

    #[rstest]
    #[case(&[(1, ModerationState::Published)], Some(1), None)]
    #[case(&[(1, ModerationState::Validated)], None, Some(1))]
    #[case(&[(1, ModerationState::Published), (2, ModerationState::Validated)], Some(1), Some(2))]
    #[case(
        &[(1, ModerationState::Published), (2, ModerationState::Validated), (2, ModerationState::Published)],
        Some(2),
        None
    )]
    #[case(&[], None, None)]
    fn live_revisions(
        #[case] entries: &[(RevisionId, ModerationState)],
        #[case] published: Option<RevisionId>,
        #[case] validated: Option<RevisionId>,
    ) {
        let (moderation, key) = history(entries);

        assert_eq!(moderation.live_revisions(&key), LiveRevisions { published, validated });
    }

    #[googletest::test]
    fn state_of_prefers_validated() {
        let live = LiveRevisions { published: Some(1), validated: Some(2) };

        expect_that!(live.state_of(2), some(eq(ModerationState::Validated)));
        expect_that!(live.state_of(1), some(eq(ModerationState::Published)));
        expect_that!(live.state_of(3), none());
        expect_that!(live.revision_for(ModerationState::Draft), none());
    }

    #[googletest::test]
    fn default_revisions_are_kept_in_order() {
        let (moderation, key) =
            history(&[(1, ModerationState::Published), (2, ModerationState::Validated)]);

        expect_that!(
            moderation.default_revisions(&key).iter().map(|d| d.revision_id).collect::<Vec<_>>(),
            elements_are![eq(&1), eq(&2)]
        );

        moderation.forget(&key);
        expect_that!(moderation.default_revisions(&key).is_empty(), eq(true));
    }
}
