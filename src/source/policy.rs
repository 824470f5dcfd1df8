//! Pluggable decisions made while walking an entity's fields.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::FieldMatcher;
use crate::content::{
    FieldDefinition,
    SchemaRegistry,
};

/// Orders fields in extracted trees. Lower weights come first.
pub trait FieldWeightPolicy: fmt::Debug + Send + Sync {
    fn weight_of(&self, entity_type: &str, bundle: &str, field_name: &str) -> Option<i32>;
}

/// Weights from the `fieldWeights` setting.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredWeights {
    weights: BTreeMap<String, i32>,
}

impl ConfiguredWeights {
    #[must_use]
    pub const fn new(weights: BTreeMap<String, i32>) -> Self {
        Self { weights }
    }
}

impl FieldWeightPolicy for ConfiguredWeights {
    fn weight_of(&self, entity_type: &str, bundle: &str, field_name: &str) -> Option<i32> {
        self.weights.get(&FieldMatcher::field_id(entity_type, bundle, field_name)).copied()
    }
}

/// Decides which reference fields have their targets embedded into the parent's tree.
pub trait EmbeddabilityPolicy: fmt::Debug + Send + Sync {
    fn is_embeddable(&self, entity_type: &str, bundle: &str, field: &FieldDefinition) -> bool;
}

/// Embeds fields matching `embeddableFields`, and every reference to a composite type.
#[derive(Debug, Clone)]
pub struct DefaultEmbeddability {
    matcher: FieldMatcher,
    schema: Arc<SchemaRegistry>,
}

impl DefaultEmbeddability {
    #[must_use]
    pub const fn new(matcher: FieldMatcher, schema: Arc<SchemaRegistry>) -> Self {
        Self { matcher, schema }
    }
}

impl EmbeddabilityPolicy for DefaultEmbeddability {
    fn is_embeddable(&self, entity_type: &str, bundle: &str, field: &FieldDefinition) -> bool {
        let Some(target_type) = &field.target_type else {
            return false;
        };
        if self.matcher.is_excluded(entity_type, bundle, &field.name) {
            return false;
        }
        self.matcher.is_embeddable(entity_type, bundle, &field.name)
            || self.schema.is_composite(target_type)
    }
}
