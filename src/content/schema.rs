//! Entity type, bundle and field definitions.

use std::collections::{
    BTreeMap,
    HashMap,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::TranslationError;

/// Declared field of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    /// Field type identifier used to select a field processor (e.g. `text_long`, `link`).
    pub field_type: String,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
    /// Target entity type for reference fields.
    #[serde(default)]
    pub target_type: Option<String>,
}

impl FieldDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            field_type: field_type.into(),
            translatable: true,
            max_length: None,
            target_type: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub const fn translatable(mut self, translatable: bool) -> Self {
        self.translatable = translatable;
        self
    }

    #[must_use]
    pub const fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    #[must_use]
    pub fn target_type(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDefinition {
    pub id: String,
    pub label: String,
    /// Content translation is enabled for this bundle.
    #[serde(default)]
    pub translatable: bool,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl BundleDefinition {
    #[must_use]
    pub fn new(id: impl Into<String>, translatable: bool) -> Self {
        let id = id.into();
        Self { label: id.clone(), id, translatable, fields: Vec::new() }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeDefinition {
    pub id: String,
    /// Storage can hold per-language values for this type.
    #[serde(default)]
    pub translatable: bool,
    /// Instances are owned by a parent entity (embedded/composite content).
    #[serde(default)]
    pub composite: bool,
    #[serde(default)]
    pub bundles: BTreeMap<String, BundleDefinition>,
}

impl EntityTypeDefinition {
    #[must_use]
    pub fn new(id: impl Into<String>, translatable: bool) -> Self {
        Self { id: id.into(), translatable, composite: false, bundles: BTreeMap::new() }
    }

    #[must_use]
    pub const fn composite(mut self, composite: bool) -> Self {
        self.composite = composite;
        self
    }

    #[must_use]
    pub fn bundle(mut self, bundle: BundleDefinition) -> Self {
        self.bundles.insert(bundle.id.clone(), bundle);
        self
    }
}

/// Registry of every entity type known to the translation core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaRegistry {
    types: HashMap<String, EntityTypeDefinition>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type(mut self, definition: EntityTypeDefinition) -> Self {
        self.register(definition);
        self
    }

    pub fn register(&mut self, definition: EntityTypeDefinition) {
        self.types.insert(definition.id.clone(), definition);
    }

    pub fn entity_type(&self, entity_type: &str) -> Result<&EntityTypeDefinition, TranslationError> {
        self.types
            .get(entity_type)
            .ok_or_else(|| TranslationError::UnknownEntityType(entity_type.to_string()))
    }

    pub fn bundle(
        &self,
        entity_type: &str,
        bundle: &str,
    ) -> Result<&BundleDefinition, TranslationError> {
        self.entity_type(entity_type)?.bundles.get(bundle).ok_or_else(|| {
            TranslationError::UnknownBundle {
                entity_type: entity_type.to_string(),
                bundle: bundle.to_string(),
            }
        })
    }

    /// Whether instances of this bundle keep separate per-language values.
    pub fn is_language_aware(&self, entity_type: &str, bundle: &str) -> Result<bool, TranslationError> {
        let definition = self.entity_type(entity_type)?;
        Ok(definition.translatable && self.bundle(entity_type, bundle)?.translatable)
    }

    /// Whether the entity type is a composite owned by its parent.
    #[must_use]
    pub fn is_composite(&self, entity_type: &str) -> bool {
        self.types.get(entity_type).is_some_and(|definition| definition.composite)
    }
}
