use std::collections::BTreeSet;

use serde::{
    Deserialize,
    Serialize,
};

use crate::types::{
    EntityKey,
    RevisionId,
    Scope,
};

/// Notifications from the moderation engine that affect active mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ModerationEvent {
    /// `new_revision` became the current revision of the `advanced` state(s).
    NewDefaultRevision {
        entity: EntityKey,
        advanced: Scope,
        previous_revision: RevisionId,
        new_revision: RevisionId,
        /// Languages translated anew on `new_revision`.
        #[serde(default)]
        retranslated: BTreeSet<String>,
        /// The transition asked not to carry translations over.
        #[serde(default)]
        drop_translations: bool,
    },
    /// The validated revision was published; only Published remains alive.
    StateCollapsed { entity: EntityKey, published_revision: RevisionId },
    EntityDeleted { entity: EntityKey },
}

impl ModerationEvent {
    #[must_use]
    pub const fn entity(&self) -> &EntityKey {
        match self {
            Self::NewDefaultRevision { entity, .. }
            | Self::StateCollapsed { entity, .. }
            | Self::EntityDeleted { entity } => entity,
        }
    }
}
