//! Writes a translated tree back onto the revision it belongs to.

use std::collections::HashSet;

use serde_json::Value;

use super::{
    EligibleField,
    TranslationContext,
};
use crate::content::{
    ContentEntity,
    FieldItem,
    FieldItemList,
    TARGET_ID,
    TARGET_REVISION_ID,
    target_id,
    target_revision_id,
};
use crate::error::TranslationError;
use crate::revision::{
    ResolveRequest,
    RevisionResolverChain,
};
use crate::storage::StorageError;
use crate::tree::TranslationNode;
use crate::types::{
    EntityId,
    EntityKey,
    ModerationState,
    RevisionId,
};

#[derive(Debug, Clone, Copy)]
pub struct RecomposeOptions {
    /// Save the result. Previews leave storage untouched.
    pub persist: bool,
    pub requested_state: Option<ModerationState>,
    /// Revision the translation request was opened against.
    pub opened_against: Option<RevisionId>,
}

impl Default for RecomposeOptions {
    fn default() -> Self {
        Self { persist: true, requested_state: None, opened_against: None }
    }
}

impl RecomposeOptions {
    #[must_use]
    pub fn preview() -> Self {
        Self { persist: false, ..Self::default() }
    }
}

/// An embedded entity modified alongside the recomposed one.
#[derive(Debug, Clone)]
pub struct Dependent {
    pub entity: ContentEntity,
    /// A language-tagged copy saved as a whole entity; otherwise only the target
    /// language of `entity` is saved.
    pub duplicated: bool,
}

#[derive(Debug)]
pub struct RecomposeOutcome {
    pub entity: ContentEntity,
    pub dependents: Vec<Dependent>,
    /// Non-fatal problems, e.g. references that no longer resolve.
    pub warnings: Vec<TranslationError>,
    /// Whether anything was written to storage.
    pub persisted: bool,
}

/// State of one recomposition walk.
#[derive(Debug, Default)]
struct Pending {
    dependents: Vec<Dependent>,
    warnings: Vec<TranslationError>,
    /// Entities on the path from the root to the entity being recomposed.
    ancestors: HashSet<EntityKey>,
}

#[derive(Debug, Clone, Copy)]
pub struct SourceRecomposer<'a> {
    context: &'a TranslationContext,
    resolvers: &'a RevisionResolverChain,
}

impl<'a> SourceRecomposer<'a> {
    #[must_use]
    pub const fn new(context: &'a TranslationContext, resolvers: &'a RevisionResolverChain) -> Self {
        Self { context, resolvers }
    }

    /// Applies `tree` to the `target_langcode` translation of the revision picked by
    /// the resolver chain.
    ///
    /// `original` is the tree as extracted; it restores embedded references and unit
    /// metadata a flat submission cannot carry. Any error aborts before anything is
    /// saved.
    pub fn recompose(
        &self,
        tree: &TranslationNode,
        entity: &ContentEntity,
        target_langcode: &str,
        options: &RecomposeOptions,
        original: Option<&TranslationNode>,
    ) -> Result<RecomposeOutcome, TranslationError> {
        let mut tree = tree.clone();
        if let Some(original) = original {
            tree.adopt_metadata(original);
        }

        let request = ResolveRequest {
            requested_state: options.requested_state,
            opened_against: options.opened_against,
            ..ResolveRequest::new(entity, target_langcode)
        };
        let revision_id = self.resolvers.resolve(&request);
        let mut target = if revision_id == entity.revision_id {
            entity.clone()
        } else {
            self.context.storage.load_revision(&entity.entity_type, revision_id)?
        };

        let mut pending = Pending { ancestors: HashSet::from([target.key()]), ..Pending::default() };
        let changed = self.recompose_entity(&mut target, &tree, target_langcode, 0, &mut pending)?;

        let mut persisted = false;
        if options.persist {
            let storage = &self.context.storage;
            for dependent in pending.dependents.iter().filter(|dependent| dependent.duplicated) {
                storage.save_entity(&dependent.entity)?;
                persisted = true;
            }
            for dependent in pending.dependents.iter().filter(|dependent| !dependent.duplicated) {
                storage.save_translation(&dependent.entity, target_langcode)?;
                persisted = true;
            }
            if changed {
                storage.save_translation(&target, target_langcode)?;
                persisted = true;
            }
        }

        tracing::debug!(
            entity = %target.key(),
            revision_id = target.revision_id,
            langcode = target_langcode,
            changed,
            dependents = pending.dependents.len(),
            warnings = pending.warnings.len(),
            persisted,
            "Recomposed translation"
        );
        Ok(RecomposeOutcome {
            entity: target,
            dependents: pending.dependents,
            warnings: pending.warnings,
            persisted,
        })
    }

    /// Returns whether the `langcode` values of `entity` changed.
    fn recompose_entity(
        &self,
        entity: &mut ContentEntity,
        tree: &TranslationNode,
        langcode: &str,
        depth: usize,
        pending: &mut Pending,
    ) -> Result<bool, TranslationError> {
        let limit = self.context.settings.max_depth;
        if depth > limit {
            return Err(TranslationError::DepthLimitExceeded { limit });
        }
        let TranslationNode::Object(object) = tree else {
            return Err(TranslationError::shape(entity.key().to_string(), "expected an object of fields"));
        };

        let mut changed = false;
        if !entity.has_translation(langcode) {
            let default_revision = entity.default_revision;
            self.context.storage.create_translation(entity, langcode)?;
            entity.default_revision = default_revision;
            changed = true;
        }

        let fields = self.context.eligible_fields(entity)?;
        if let Some(unknown) = object.keys().find(|key| !fields.iter().any(|f| f.definition.name == *key)) {
            return Err(TranslationError::shape(unknown, "no translatable field of this name"));
        }

        let source = entity.source_values().clone();
        let mut values = entity.translation(langcode).cloned().unwrap_or_default();
        for field in &fields {
            let name = &field.definition.name;
            let current = values.items(name);
            let updated = match object.get(name) {
                Some(node) if field.embeddable => {
                    self.recompose_embedded(*field, node, current, langcode, depth, pending)?
                }
                Some(node) => self
                    .context
                    .processors
                    .processor_for(&field.definition.field_type)
                    .apply(field.definition, node, current)?,
                None if !field.embeddable && source.is_empty_field(name) && !current.is_empty() => {
                    Vec::new()
                }
                None => continue,
            };

            if updated.as_slice() != values.items(name) {
                values.set(name.clone(), updated);
                changed = true;
            }
        }

        if changed {
            entity.set_translation(langcode, values);
        }
        Ok(changed)
    }

    /// Recomposes the embedded entities of one field of the `langcode` translation.
    ///
    /// Tree items carrying a reference are matched by entity id against `current`,
    /// the translation's own items, so per-language ordering never matters.
    fn recompose_embedded(
        &self,
        field: EligibleField<'_>,
        node: &TranslationNode,
        current: &[FieldItem],
        langcode: &str,
        depth: usize,
        pending: &mut Pending,
    ) -> Result<FieldItemList, TranslationError> {
        let definition = field.definition;
        let TranslationNode::List(list) = node else {
            return Err(TranslationError::shape(&definition.name, "expected a list of embedded entities"));
        };
        let target_type = definition.target_type.as_deref().ok_or_else(|| {
            TranslationError::shape(&definition.name, "embeddable field has no target type")
        })?;

        let mut items = current.to_vec();
        for (delta, item_node) in &list.items {
            let item_path = format!("{}[{delta}]", definition.name);
            let (position, child_tree) = match item_node {
                TranslationNode::Reference(reference) => {
                    let Some(position) = self.locate(target_type, &items, reference.entity_id) else {
                        tracing::warn!(
                            field = %definition.name,
                            entity_id = reference.entity_id,
                            langcode,
                            "Referenced entity is gone from the translation"
                        );
                        pending.warnings.push(TranslationError::MissingReferencedEntity {
                            field: definition.name.clone(),
                            entity_type: reference.entity_type.clone(),
                            entity_id: reference.entity_id,
                        });
                        continue;
                    };
                    (position, reference.child.as_ref())
                }
                other => {
                    tracing::warn!(
                        field = %definition.name,
                        delta,
                        "Embedded item carries no reference id, matching by position"
                    );
                    (*delta, other)
                }
            };

            let item = items.get_mut(position).ok_or_else(|| {
                TranslationError::shape(&item_path, "no embedded entity at this position")
            })?;
            let Some(child_id) = target_id(item) else {
                return Err(TranslationError::shape(&item_path, "item does not reference an entity"));
            };
            let child = match self.load_referenced(target_type, item, child_id) {
                Ok(child) => child,
                Err(StorageError::EntityNotFound(_) | StorageError::RevisionNotFound { .. }) => {
                    tracing::warn!(
                        field = %definition.name,
                        entity_id = child_id,
                        "Referenced entity could not be loaded"
                    );
                    pending.warnings.push(TranslationError::MissingReferencedEntity {
                        field: definition.name.clone(),
                        entity_type: target_type.to_string(),
                        entity_id: child_id,
                    });
                    continue;
                }
                Err(error) => return Err(error.into()),
            };

            let key = child.key();
            if !pending.ancestors.insert(key.clone()) {
                return Err(TranslationError::shape(item_path, format!("{key} embeds one of its ancestors")));
            }
            let result = self.recompose_child(child, child_tree, item, langcode, depth + 1, pending);
            pending.ancestors.remove(&key);
            result?;
        }

        Ok(items)
    }

    /// Recomposes one embedded entity and points `item` at its language-tagged copy
    /// when one had to be made.
    fn recompose_child(
        &self,
        mut child: ContentEntity,
        tree: &TranslationNode,
        item: &mut FieldItem,
        langcode: &str,
        depth: usize,
        pending: &mut Pending,
    ) -> Result<(), TranslationError> {
        if self.context.schema.is_language_aware(&child.entity_type, &child.bundle)? {
            if self.recompose_entity(&mut child, tree, langcode, depth, pending)? {
                pending.dependents.push(Dependent { entity: child, duplicated: false });
            }
            return Ok(());
        }

        let fresh_copy = child.default_langcode != langcode;
        if fresh_copy {
            child = self.context.storage.duplicate(&child, langcode)?;
        }
        let changed = self.recompose_entity(&mut child, tree, langcode, depth, pending)?;
        if fresh_copy {
            item.insert(TARGET_ID.to_string(), Value::from(child.id));
            item.insert(TARGET_REVISION_ID.to_string(), Value::from(child.revision_id));
        }
        if fresh_copy || changed {
            pending.dependents.push(Dependent { entity: child, duplicated: true });
        }
        Ok(())
    }

    /// Position of the item referencing `entity_id`, directly or through a
    /// language-tagged copy of it.
    fn locate(&self, target_type: &str, items: &[FieldItem], entity_id: EntityId) -> Option<usize> {
        items.iter().position(|item| target_id(item) == Some(entity_id)).or_else(|| {
            items.iter().position(|item| {
                target_id(item).is_some_and(|id| {
                    self.load_referenced(target_type, item, id)
                        .is_ok_and(|child| child.duplicated_from == Some(entity_id))
                })
            })
        })
    }

    fn load_referenced(
        &self,
        target_type: &str,
        item: &FieldItem,
        entity_id: EntityId,
    ) -> Result<ContentEntity, StorageError> {
        let storage = &self.context.storage;
        match target_revision_id(item) {
            Some(revision_id) => storage.load_revision(target_type, revision_id),
            None => storage.load_entity(target_type, entity_id),
        }
    }
}
