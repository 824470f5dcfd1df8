//! Content entities as seen by the translation core.

use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

use crate::types::{
    EntityId,
    EntityKey,
    ModerationState,
    RevisionId,
    RevisionRef,
};

/// One item of a field: a map of property name to value.
pub type FieldItem = serde_json::Map<String, Value>;

/// Ordered items of one field (delta order).
pub type FieldItemList = Vec<FieldItem>;

/// Property holding the referenced entity id in reference field items.
pub const TARGET_ID: &str = "target_id";

/// Property holding the referenced revision id in reference field items.
pub const TARGET_REVISION_ID: &str = "target_revision_id";

/// Field values of one language of an entity revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValues(BTreeMap<String, FieldItemList>);

impl FieldValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self, field: &str) -> &[FieldItem] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn set(&mut self, field: impl Into<String>, items: FieldItemList) {
        self.0.insert(field.into(), items);
    }

    pub fn clear(&mut self, field: &str) {
        if let Some(items) = self.0.get_mut(field) {
            items.clear();
        }
    }

    /// A field is empty when it has no item carrying a non-blank value.
    #[must_use]
    pub fn is_empty_field(&self, field: &str) -> bool {
        self.items(field).iter().all(|item| item.values().all(is_blank))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldItemList)> {
        self.0.iter()
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(values) => values.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Renders a property value as translation unit text.
#[must_use]
pub fn property_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Reads the referenced entity id of a reference field item.
#[must_use]
pub fn target_id(item: &FieldItem) -> Option<EntityId> {
    read_id(item.get(TARGET_ID)?)
}

/// Reads the referenced revision id of a reference field item.
#[must_use]
pub fn target_revision_id(item: &FieldItem) -> Option<RevisionId> {
    read_id(item.get(TARGET_REVISION_ID)?)
}

fn read_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// A loaded revision of a content entity with all of its translations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntity {
    pub entity_type: String,
    pub bundle: String,
    pub id: EntityId,
    pub revision_id: RevisionId,
    /// Source language of the entity.
    pub default_langcode: String,
    /// Whether this revision is the current/default revision of the entity.
    pub default_revision: bool,
    #[serde(default)]
    pub moderation_state: Option<ModerationState>,
    /// Source entity of a language-tagged copy.
    #[serde(default)]
    pub duplicated_from: Option<EntityId>,
    translations: BTreeMap<String, FieldValues>,
}

impl ContentEntity {
    #[must_use]
    pub fn new(
        entity_type: impl Into<String>,
        bundle: impl Into<String>,
        id: EntityId,
        revision_id: RevisionId,
        default_langcode: impl Into<String>,
    ) -> Self {
        let default_langcode = default_langcode.into();
        let mut translations = BTreeMap::new();
        translations.insert(default_langcode.clone(), FieldValues::new());
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            id,
            revision_id,
            default_langcode,
            default_revision: true,
            moderation_state: None,
            duplicated_from: None,
            translations,
        }
    }

    /// Sets a field on the source language.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, items: FieldItemList) -> Self {
        let langcode = self.default_langcode.clone();
        self.translations.entry(langcode).or_default().set(field, items);
        self
    }

    /// Sets a field on the given language, creating the translation when absent.
    #[must_use]
    pub fn with_translated_field(
        mut self,
        langcode: &str,
        field: impl Into<String>,
        items: FieldItemList,
    ) -> Self {
        if !self.has_translation(langcode) {
            self.add_translation(langcode);
        }
        self.translations.entry(langcode.to_string()).or_default().set(field, items);
        self
    }

    #[must_use]
    pub const fn with_default_revision(mut self, default_revision: bool) -> Self {
        self.default_revision = default_revision;
        self
    }

    #[must_use]
    pub const fn with_moderation_state(mut self, state: ModerationState) -> Self {
        self.moderation_state = Some(state);
        self
    }

    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.entity_type.clone(), self.id)
    }

    #[must_use]
    pub fn revision_ref(&self) -> RevisionRef {
        RevisionRef::new(&self.key(), self.revision_id)
    }

    #[must_use]
    pub fn has_translation(&self, langcode: &str) -> bool {
        self.translations.contains_key(langcode)
    }

    #[must_use]
    pub fn translation(&self, langcode: &str) -> Option<&FieldValues> {
        self.translations.get(langcode)
    }

    /// Values of the source language.
    #[must_use]
    pub fn source_values(&self) -> &FieldValues {
        static EMPTY: std::sync::LazyLock<FieldValues> = std::sync::LazyLock::new(FieldValues::new);
        self.translations.get(&self.default_langcode).unwrap_or(&EMPTY)
    }

    /// Replaces the values of one language.
    pub fn set_translation(&mut self, langcode: impl Into<String>, values: FieldValues) {
        self.translations.insert(langcode.into(), values);
    }

    /// Creates a translation by cloning the source-language values.
    ///
    /// Leaves an existing translation untouched.
    pub fn add_translation(&mut self, langcode: &str) -> &mut FieldValues {
        let source = self.source_values().clone();
        self.translations.entry(langcode.to_string()).or_insert(source)
    }

    /// Languages present on this revision, source language included.
    pub fn translation_languages(&self) -> impl Iterator<Item = &str> {
        self.translations.keys().map(String::as_str)
    }

    /// Re-tags a language-unaware copy: its source values become `langcode` values
    /// and every other language is dropped.
    pub fn retag_language(&mut self, langcode: &str) {
        let source = self.translations.remove(&self.default_langcode).unwrap_or_default();
        self.translations.clear();
        self.translations.insert(langcode.to_string(), source);
        self.default_langcode = langcode.to_string();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::test_utils::items;

    #[googletest::test]
    fn add_translation_clones_source_values() {
        let mut entity = ContentEntity::new("node", "article", 1, 10, "en")
            .with_field("title", items(json!([{"value": "Hello"}])));

        entity.add_translation("fr");

        expect_that!(entity.has_translation("fr"), eq(true));
        expect_that!(entity.translation("fr"), some(eq(entity.source_values())));
    }

    #[googletest::test]
    fn add_translation_keeps_existing_values() {
        let mut entity = ContentEntity::new("node", "article", 1, 10, "en")
            .with_field("title", items(json!([{"value": "Hello"}])))
            .with_translated_field("fr", "title", items(json!([{"value": "Bonjour"}])));

        entity.add_translation("fr");

        let title = entity.translation("fr").unwrap().items("title");
        expect_that!(title.first().and_then(|item| item.get("value")), some(eq(&json!("Bonjour"))));
    }

    #[googletest::test]
    fn empty_field_detection() {
        let values = ContentEntity::new("node", "article", 1, 10, "en")
            .with_field("blank", items(json!([{"value": "", "format": null}])))
            .with_field("filled", items(json!([{"value": "x"}])))
            .with_field("flag", items(json!([{"value": false}])))
            .source_values()
            .clone();

        expect_that!(values.is_empty_field("blank"), eq(true));
        expect_that!(values.is_empty_field("missing"), eq(true));
        expect_that!(values.is_empty_field("filled"), eq(false));
        expect_that!(values.is_empty_field("flag"), eq(false));
    }

    #[googletest::test]
    fn retag_language_moves_source_values() {
        let mut entity = ContentEntity::new("paragraph", "shared", 5, 50, "en")
            .with_field("text", items(json!([{"value": "Shared"}])))
            .with_translated_field("de", "text", items(json!([{"value": "Geteilt"}])));

        entity.retag_language("fr");

        expect_that!(entity.default_langcode.as_str(), eq("fr"));
        expect_that!(entity.translation_languages().collect::<Vec<_>>(), elements_are![eq(&"fr")]);
        expect_that!(
            entity.source_values().items("text").first().and_then(|item| item.get("value")),
            some(eq(&json!("Shared")))
        );
    }

    #[googletest::test]
    fn reads_reference_ids() {
        let item = items(json!([{"target_id": 12, "target_revision_id": "34"}])).remove(0);

        expect_that!(target_id(&item), some(eq(12)));
        expect_that!(target_revision_id(&item), some(eq(34)));
        expect_that!(property_text(&json!(null)).as_str(), eq(""));
        expect_that!(property_text(&json!(3)).as_str(), eq("3"));
    }
}
