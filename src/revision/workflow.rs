//! Corporate workflow: a published revision and a newer validated revision can be
//! alive at the same time.

use std::sync::Arc;

use super::{
    ModerationEvent,
    ModerationInfo,
    ResolveRequest,
    RevisionResolver,
};
use crate::error::TranslationError;
use crate::mapping::ActiveMappingService;
use crate::storage::{
    EntityLock,
    EntityStorage,
};
use crate::types::{
    ModerationState,
    RevisionId,
};

#[derive(Debug, Clone)]
pub struct CorporateWorkflowPolicy {
    moderation: Arc<dyn ModerationInfo>,
}

impl CorporateWorkflowPolicy {
    pub const PRIORITY: i32 = 100;

    #[must_use]
    pub fn new(moderation: Arc<dyn ModerationInfo>) -> Self {
        Self { moderation }
    }

    /// Updates active mappings after a moderation transition.
    ///
    /// The caller holds the lock of the event's entity.
    pub fn handle_event(
        &self,
        event: &ModerationEvent,
        storage: &dyn EntityStorage,
        mappings: &ActiveMappingService,
        lock: &EntityLock<'_>,
    ) -> Result<(), TranslationError> {
        let entity = event.entity();
        lock.ensure_held(entity)?;

        match event {
            ModerationEvent::NewDefaultRevision {
                advanced,
                previous_revision,
                new_revision,
                retranslated,
                drop_translations,
                ..
            } => {
                if *drop_translations {
                    tracing::debug!(
                        entity = %entity,
                        new_revision,
                        "Transition drops translations, nothing carried forward"
                    );
                    return Ok(());
                }

                let previous = storage.load_revision(&entity.entity_type, *previous_revision)?;
                for langcode in previous.translation_languages() {
                    if langcode == previous.default_langcode || retranslated.contains(langcode) {
                        continue;
                    }
                    mappings.carry_forward(lock, entity, langcode, *previous_revision, *advanced)?;
                }
                Ok(())
            }
            ModerationEvent::StateCollapsed { published_revision, .. } => {
                tracing::debug!(
                    entity = %entity,
                    published_revision,
                    "Collapsing mappings to published"
                );
                mappings.collapse_to_published(lock, entity)
            }
            ModerationEvent::EntityDeleted { .. } => mappings.delete_record(lock, entity),
        }
    }
}

impl RevisionResolver for CorporateWorkflowPolicy {
    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn resolve(&self, request: &ResolveRequest<'_>) -> Option<RevisionId> {
        let live = self.moderation.live_revisions(&request.entity.key());

        match (live.published, live.validated) {
            (None, None) => None,
            (Some(only), None) | (None, Some(only)) => Some(only),
            (Some(published), Some(validated)) => {
                let wants_published = match request.requested_state {
                    Some(state) => state == ModerationState::Published,
                    None => request.opened_against == Some(published),
                };
                Some(if wants_published { published } else { validated })
            }
        }
    }
}
