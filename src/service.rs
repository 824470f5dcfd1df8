//! Entry point tying extraction, recomposition and active mappings together.

use std::sync::Arc;

use serde::{
    Deserialize,
    Serialize,
};

use crate::config::{
    ConfigManager,
    MatcherError,
};
use crate::content::{
    ContentEntity,
    SchemaRegistry,
};
use crate::error::TranslationError;
use crate::mapping::{
    ActiveMappingService,
    MappingStore,
};
use crate::revision::{
    CorporateWorkflowPolicy,
    ModerationEvent,
    ModerationInfo,
    RevisionResolver,
    RevisionResolverChain,
};
use crate::source::{
    Extraction,
    PreviewCache,
    PreviewKey,
    RecomposeOptions,
    RecomposeOutcome,
    SourceExtractor,
    SourceRecomposer,
    TranslationContext,
};
use crate::storage::EntityStorage;
use crate::tree::{
    FlatUnits,
    TranslationNode,
    TreeCodec,
};
use crate::types::{
    EntityKey,
    ModerationState,
    RevisionId,
    RevisionRef,
    Scope,
};

/// A translation job opened against one source revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub entity: EntityKey,
    pub source_revision: RevisionId,
    pub source_langcode: String,
    pub target_langcode: String,
    #[serde(default)]
    pub state: Option<ModerationState>,
    /// The tree as extracted.
    pub tree: TranslationNode,
    /// Flat units handed to translators.
    pub units: FlatUnits,
}

#[derive(Debug)]
pub struct TranslationService {
    context: TranslationContext,
    moderation: Arc<dyn ModerationInfo>,
    resolvers: RevisionResolverChain,
    workflow: CorporateWorkflowPolicy,
    mappings: ActiveMappingService,
    codec: TreeCodec,
}

impl TranslationService {
    /// Creates the service with the corporate workflow registered as resolver.
    #[must_use]
    pub fn new(
        context: TranslationContext,
        moderation: Arc<dyn ModerationInfo>,
        mapping_store: Arc<dyn MappingStore>,
    ) -> Self {
        let workflow = CorporateWorkflowPolicy::new(moderation.clone());
        let codec = TreeCodec::new(context.settings.path_delimiter.clone());
        Self {
            resolvers: RevisionResolverChain::new().with(Box::new(workflow.clone())),
            mappings: ActiveMappingService::new(mapping_store, moderation.clone()),
            workflow,
            moderation,
            context,
            codec,
        }
    }

    /// Creates the service from the settings currently held by `config`.
    ///
    /// Later changes to `config` do not reach the returned service.
    pub fn from_config(
        config: &ConfigManager,
        schema: SchemaRegistry,
        storage: Arc<dyn EntityStorage>,
        moderation: Arc<dyn ModerationInfo>,
        mapping_store: Arc<dyn MappingStore>,
    ) -> Result<Self, MatcherError> {
        let settings = config.get_settings().clone();
        tracing::debug!(config_path = ?config.config_path(), "Creating translation service");
        let context = TranslationContext::new(schema, storage, settings)?;
        Ok(Self::new(context, moderation, mapping_store))
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Box<dyn RevisionResolver>) -> Self {
        self.resolvers.register(resolver);
        self
    }

    #[must_use]
    pub const fn context(&self) -> &TranslationContext {
        &self.context
    }

    #[must_use]
    pub const fn codec(&self) -> &TreeCodec {
        &self.codec
    }

    #[must_use]
    pub const fn mappings(&self) -> &ActiveMappingService {
        &self.mappings
    }

    /// Extracts the source of a translation into `target_langcode`.
    ///
    /// With a state, the current revision of that state is the source; otherwise the
    /// default revision.
    pub fn open_request(
        &self,
        key: &EntityKey,
        target_langcode: &str,
        state: Option<ModerationState>,
    ) -> Result<TranslationRequest, TranslationError> {
        let extractor = SourceExtractor::new(&self.context);
        let Extraction { entity, tree } = match state {
            Some(state) => extractor.extract_for_state(key, state, self.moderation.as_ref())?,
            None => {
                let entity = self.context.storage.load_entity(&key.entity_type, key.entity_id)?;
                let tree = extractor.extract(&entity)?;
                Extraction { entity, tree }
            }
        };

        let units = self.codec.flatten(&tree);
        tracing::debug!(
            entity = %key,
            revision_id = entity.revision_id,
            target_langcode,
            units = units.len(),
            words = units.word_count(),
            "Opened translation request"
        );
        Ok(TranslationRequest {
            entity: key.clone(),
            source_revision: entity.revision_id,
            source_langcode: entity.default_langcode,
            target_langcode: target_langcode.to_string(),
            state,
            tree,
            units,
        })
    }

    /// Writes translated flat units back. See [`TranslationService::save_tree`].
    pub fn submit(
        &self,
        request: &TranslationRequest,
        units: &FlatUnits,
        options: RecomposeOptions,
    ) -> Result<RecomposeOutcome, TranslationError> {
        let tree = self.codec.unflatten(units)?;
        self.save_tree(request, &tree, options)
    }

    /// Recomposes `tree` under the entity lock. A persisted write narrows the active
    /// mapping of the target language for the state of the written revision.
    pub fn save_tree(
        &self,
        request: &TranslationRequest,
        tree: &TranslationNode,
        options: RecomposeOptions,
    ) -> Result<RecomposeOutcome, TranslationError> {
        let options = request_options(request, options);
        let key = &request.entity;
        let langcode = request.target_langcode.as_str();

        self.context.storage.locks().with_lock(key, |lock| -> Result<_, TranslationError> {
            let entity = self.context.storage.load_revision(&key.entity_type, request.source_revision)?;
            let outcome = SourceRecomposer::new(&self.context, &self.resolvers).recompose(
                tree,
                &entity,
                langcode,
                &options,
                Some(&request.tree),
            )?;

            if outcome.persisted
                && let Some(state) = self.moderation.live_revisions(key).state_of(outcome.entity.revision_id)
            {
                self.mappings.narrow(lock, key, langcode, state)?;
            }
            for warning in &outcome.warnings {
                tracing::warn!(entity = %key, langcode, warning = %warning, "Recomposition warning");
            }
            Ok(outcome)
        })
    }

    /// Recomposes without saving, caching the result per entity, language and
    /// source revision.
    ///
    /// A cache hit returns the stored preview and ignores `units`. Callers that
    /// re-preview edited units must [`PreviewCache::invalidate`] the entity first.
    pub fn preview(
        &self,
        request: &TranslationRequest,
        units: &FlatUnits,
        cache: &PreviewCache,
    ) -> Result<Arc<ContentEntity>, TranslationError> {
        let key = PreviewKey::new(&request.entity, &request.target_langcode, request.source_revision);
        cache.get_or_try_insert(key, || -> Result<_, TranslationError> {
            let tree = self.codec.unflatten(units)?;
            let options = request_options(request, RecomposeOptions::preview());
            let entity =
                self.context.storage.load_revision(&request.entity.entity_type, request.source_revision)?;
            let outcome = SourceRecomposer::new(&self.context, &self.resolvers).recompose(
                &tree,
                &entity,
                &request.target_langcode,
                &options,
                Some(&request.tree),
            )?;
            Ok(outcome.entity)
        })
    }

    pub fn handle_moderation_event(&self, event: &ModerationEvent) -> Result<(), TranslationError> {
        let storage = self.context.storage.as_ref();
        storage
            .locks()
            .with_lock(event.entity(), |lock| self.workflow.handle_event(event, storage, &self.mappings, lock))
    }

    /// Maps `langcode` of the `scope` revisions onto a past revision.
    pub fn set_mapping(
        &self,
        key: &EntityKey,
        langcode: &str,
        revision_id: RevisionId,
        scope: Scope,
    ) -> Result<(), TranslationError> {
        self.context
            .storage
            .locks()
            .with_lock(key, |lock| self.mappings.set_mapping(lock, key, langcode, revision_id, scope))
    }

    /// Hides `langcode` of the `scope` revisions.
    pub fn hide_translation(
        &self,
        key: &EntityKey,
        langcode: &str,
        scope: Scope,
    ) -> Result<(), TranslationError> {
        self.context.storage.locks().with_lock(key, |lock| self.mappings.hide(lock, key, langcode, scope))
    }

    pub fn remove_mapping(&self, key: &EntityKey, langcode: &str) -> Result<(), TranslationError> {
        self.context
            .storage
            .locks()
            .with_lock(key, |lock| self.mappings.remove_mapping(lock, key, langcode))
    }

    /// Revision whose `langcode` values are shown for the current `state` revision.
    pub fn display_revision(
        &self,
        key: &EntityKey,
        langcode: &str,
        state: ModerationState,
    ) -> Result<Option<RevisionRef>, TranslationError> {
        let Some(own_revision) = self.moderation.live_revisions(key).revision_for(state) else {
            return Ok(None);
        };
        self.mappings.display_revision(key, langcode, state, own_revision).map(Some)
    }
}

/// Fills the resolver hints a caller left open from the request.
fn request_options(request: &TranslationRequest, options: RecomposeOptions) -> RecomposeOptions {
    RecomposeOptions {
        requested_state: options.requested_state.or(request.state.filter(|state| state.is_live())),
        opened_against: options.opened_against.or(Some(request.source_revision)),
        ..options
    }
}
