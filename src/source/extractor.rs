//! Walks an entity and its embedded children into a translation tree.

use std::collections::HashSet;

use super::{
    EligibleField,
    TranslationContext,
};
use crate::content::{
    ContentEntity,
    FieldItem,
    target_id,
    target_revision_id,
};
use crate::error::TranslationError;
use crate::revision::ModerationInfo;
use crate::tree::{
    EmbeddedReference,
    ListNode,
    ObjectNode,
    TranslationNode,
};
use crate::types::{
    EntityKey,
    ModerationState,
};

/// An extracted tree and the revision it was extracted from.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub entity: ContentEntity,
    pub tree: TranslationNode,
}

#[derive(Debug, Clone, Copy)]
pub struct SourceExtractor<'a> {
    context: &'a TranslationContext,
}

impl<'a> SourceExtractor<'a> {
    #[must_use]
    pub const fn new(context: &'a TranslationContext) -> Self {
        Self { context }
    }

    /// Extracts the current revision of `state`, or the default revision when the
    /// entity has no such revision.
    pub fn extract_for_state(
        &self,
        key: &EntityKey,
        state: ModerationState,
        moderation: &dyn ModerationInfo,
    ) -> Result<Extraction, TranslationError> {
        let storage = &self.context.storage;
        let entity = match moderation.current_revision_for(key, state) {
            Some(revision_id) => storage.load_revision(&key.entity_type, revision_id)?,
            None => {
                tracing::debug!(entity = %key, state = %state, "No revision in state, using default");
                storage.load_entity(&key.entity_type, key.entity_id)?
            }
        };
        let tree = self.extract(&entity)?;
        Ok(Extraction { entity, tree })
    }

    /// Extracts the source-language tree of `entity`.
    ///
    /// Fields that fail to extract are logged and left out.
    pub fn extract(&self, entity: &ContentEntity) -> Result<TranslationNode, TranslationError> {
        let mut ancestors = HashSet::from([entity.key()]);
        let root = self.extract_entity(entity, &entity.default_langcode, 0, &mut ancestors)?;

        let mut tree = TranslationNode::Object(root);
        tree.assign_label_paths();
        Ok(tree)
    }

    fn extract_entity(
        &self,
        entity: &ContentEntity,
        langcode: &str,
        depth: usize,
        ancestors: &mut HashSet<EntityKey>,
    ) -> Result<ObjectNode, TranslationError> {
        let limit = self.context.settings.max_depth;
        if depth > limit {
            return Err(TranslationError::DepthLimitExceeded { limit });
        }

        let bundle = self.context.schema.bundle(&entity.entity_type, &entity.bundle)?;
        let values = entity.translation(langcode).unwrap_or_else(|| entity.source_values());

        let mut object = ObjectNode::labeled(bundle.label.clone())
            .with_provenance(&entity.entity_type, &entity.bundle);
        for field in self.context.eligible_fields(entity)? {
            let name = &field.definition.name;
            let items = values.items(name);
            let extracted = if field.embeddable {
                self.extract_embedded(field, items, langcode, depth, ancestors)
            } else {
                self.context
                    .processors
                    .processor_for(&field.definition.field_type)
                    .extract(field.definition, items)
            };

            match extracted {
                Ok(Some(node)) if node.has_translatable_leaf() => object.insert(name.clone(), node),
                Ok(_) => {}
                Err(error) => tracing::warn!(
                    entity = %entity.key(),
                    field = %name,
                    error = %error,
                    "Skipping field that failed to extract"
                ),
            }
        }

        let weights = &self.context.weights;
        object.sort_by_key(|name| {
            let weight = weights.weight_of(&entity.entity_type, &entity.bundle, name);
            (weight.is_none(), weight.unwrap_or_default(), name.to_string())
        });
        Ok(object)
    }

    fn extract_embedded(
        &self,
        field: EligibleField<'_>,
        items: &[FieldItem],
        langcode: &str,
        depth: usize,
        ancestors: &mut HashSet<EntityKey>,
    ) -> Result<Option<TranslationNode>, TranslationError> {
        let definition = field.definition;
        let target_type = definition.target_type.as_deref().ok_or_else(|| {
            TranslationError::shape(&definition.name, "embeddable field has no target type")
        })?;

        let mut list = ListNode::labeled(definition.label.clone());
        for (delta, item) in items.iter().enumerate() {
            let Some(entity_id) = target_id(item) else {
                continue;
            };
            let loaded = match target_revision_id(item) {
                Some(revision_id) => self.context.storage.load_revision(target_type, revision_id),
                None => self.context.storage.load_entity(target_type, entity_id),
            };
            let child = match loaded {
                Ok(child) => child,
                Err(error) => {
                    tracing::warn!(
                        field = %definition.name,
                        delta,
                        error = %error,
                        "Skipping embedded entity that failed to load"
                    );
                    continue;
                }
            };

            let key = child.key();
            if !ancestors.insert(key.clone()) {
                tracing::warn!(field = %definition.name, entity = %key, "Skipping cyclic reference");
                continue;
            }
            let child_langcode =
                if child.has_translation(langcode) { langcode } else { child.default_langcode.as_str() };
            let object = self.extract_entity(&child, child_langcode, depth + 1, ancestors);
            ancestors.remove(&key);

            let object = object?;
            if object.is_empty() {
                continue;
            }
            list.items.insert(
                delta,
                TranslationNode::Reference(EmbeddedReference {
                    entity_type: child.entity_type.clone(),
                    entity_bundle: child.bundle.clone(),
                    entity_id: child.id,
                    child: Box::new(TranslationNode::Object(object)),
                }),
            );
        }

        Ok((!list.items.is_empty()).then_some(TranslationNode::List(list)))
    }
}
