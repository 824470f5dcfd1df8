//! Nested translation tree.

use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};

use crate::types::EntityId;

/// Leaf of the translation tree: one piece of text and its translation slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationUnit {
    pub text: String,
    pub translatable: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub format_id: Option<String>,
    /// Labels of the container ancestors below the root, outermost first.
    #[serde(default)]
    pub parent_label_path: Vec<String>,
    #[serde(default)]
    pub translation: Option<String>,
}

impl TranslationUnit {
    /// A translatable unit.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translatable: true,
            max_length: None,
            format_id: None,
            parent_label_path: Vec::new(),
            translation: None,
        }
    }

    /// A unit that only mirrors the live value and is never written from the tree.
    #[must_use]
    pub fn mirrored(text: impl Into<String>) -> Self {
        Self { translatable: false, ..Self::new(text) }
    }

    #[must_use]
    pub const fn with_max_length(mut self, max_length: Option<u32>) -> Self {
        self.max_length = max_length;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format_id: Option<String>) -> Self {
        self.format_id = format_id;
        self
    }

    #[must_use]
    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }
}

/// Entity type and bundle an object node was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub entity_type: String,
    pub entity_bundle: String,
}

/// Labeled, ordered mapping of field name to node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectNode {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub provenance: Option<Provenance>,
    children: Vec<(String, TranslationNode)>,
}

impl ObjectNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_provenance(mut self, entity_type: &str, entity_bundle: &str) -> Self {
        self.provenance = Some(Provenance {
            entity_type: entity_type.to_string(),
            entity_bundle: entity_bundle.to_string(),
        });
        self
    }

    #[must_use]
    pub fn with_child(mut self, key: impl Into<String>, node: TranslationNode) -> Self {
        self.insert(key, node);
        self
    }

    /// Inserts or replaces a child, keeping the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, node: TranslationNode) {
        let key = key.into();
        match self.children.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = node,
            None => self.children.push((key, node)),
        }
    }

    /// Returns the child for `key`, inserting `default` when absent.
    #[allow(clippy::indexing_slicing)]
    pub fn entry(&mut self, key: &str, default: TranslationNode) -> &mut TranslationNode {
        let position = match self.children.iter().position(|(existing, _)| existing == key) {
            Some(position) => position,
            None => {
                self.children.push((key.to_string(), default));
                self.children.len() - 1
            }
        };
        // position points at an existing or freshly pushed child
        &mut self.children[position].1
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TranslationNode> {
        self.children.iter().find(|(existing, _)| existing == key).map(|(_, node)| node)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TranslationNode)> {
        self.children.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(key, _)| key.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Reorders children by a sort key.
    pub fn sort_by_key<K: Ord>(&mut self, mut key: impl FnMut(&str) -> K) {
        self.children.sort_by_key(|(name, _)| key(name));
    }
}

/// Labeled mapping of item delta to node. Deltas may be sparse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNode {
    #[serde(default)]
    pub label: Option<String>,
    pub items: BTreeMap<usize, TranslationNode>,
}

impl ListNode {
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), items: BTreeMap::new() }
    }

    #[must_use]
    pub fn with_item(mut self, delta: usize, node: TranslationNode) -> Self {
        self.items.insert(delta, node);
        self
    }
}

/// An embedded entity, tagged with its identity so writes match by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedReference {
    pub entity_type: String,
    pub entity_bundle: String,
    pub entity_id: EntityId,
    pub child: Box<TranslationNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslationNode {
    Unit(TranslationUnit),
    Object(ObjectNode),
    List(ListNode),
    Reference(EmbeddedReference),
}

impl Default for TranslationNode {
    fn default() -> Self {
        Self::Object(ObjectNode::default())
    }
}

impl TranslationNode {
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Object(object) => object.label.as_deref(),
            Self::List(list) => list.label.as_deref(),
            Self::Reference(reference) => reference.child.label(),
            Self::Unit(_) => None,
        }
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        match self {
            Self::Object(object) => object.label = Some(label.into()),
            Self::List(list) => list.label = Some(label.into()),
            Self::Reference(reference) => reference.child.set_label(label),
            Self::Unit(_) => {}
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&ListNode> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_unit(&self) -> Option<&TranslationUnit> {
        match self {
            Self::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_translatable_leaf(&self) -> bool {
        match self {
            Self::Unit(unit) => unit.translatable,
            Self::Object(object) => object.iter().any(|(_, child)| child.has_translatable_leaf()),
            Self::List(list) => list.items.values().any(Self::has_translatable_leaf),
            Self::Reference(reference) => reference.child.has_translatable_leaf(),
        }
    }

    /// Fills every unit's `parent_label_path` from the labels of its container ancestors.
    ///
    /// The node itself is treated as the root and contributes no label. An unlabeled
    /// container contributes the key it is stored under.
    pub fn assign_label_paths(&mut self) {
        self.assign_labels_below(&mut Vec::new());
    }

    fn assign_labels_below(&mut self, path: &mut Vec<String>) {
        match self {
            Self::Unit(unit) => unit.parent_label_path.clone_from(path),
            Self::Object(object) => {
                for (key, child) in &mut object.children {
                    child.assign_labels_as_child(key, path);
                }
            }
            Self::List(list) => {
                for (delta, child) in &mut list.items {
                    child.assign_labels_as_child(&delta.to_string(), path);
                }
            }
            Self::Reference(reference) => reference.child.assign_labels_below(path),
        }
    }

    fn assign_labels_as_child(&mut self, key: &str, path: &mut Vec<String>) {
        if let Self::Unit(unit) = self {
            unit.parent_label_path.clone_from(path);
            return;
        }
        path.push(self.label().unwrap_or(key).to_string());
        self.assign_labels_below(path);
        path.pop();
    }

    /// Restores what the flat form cannot carry (embedded references, provenance,
    /// labels and unit metadata) from the originally extracted tree.
    ///
    /// Units that were not translatable in `template` stay non-translatable.
    pub fn adopt_metadata(&mut self, template: &Self) {
        if let Self::Reference(reference) = template
            && !matches!(self, Self::Reference(_))
        {
            let mut child = std::mem::take(self);
            child.adopt_metadata(&reference.child);
            *self = Self::Reference(EmbeddedReference {
                entity_type: reference.entity_type.clone(),
                entity_bundle: reference.entity_bundle.clone(),
                entity_id: reference.entity_id,
                child: Box::new(child),
            });
            return;
        }

        match (self, template) {
            (Self::Reference(own), Self::Reference(other)) => own.child.adopt_metadata(&other.child),
            (Self::Object(own), Self::Object(other)) => {
                if own.label.is_none() {
                    own.label.clone_from(&other.label);
                }
                if own.provenance.is_none() {
                    own.provenance.clone_from(&other.provenance);
                }
                for (key, child) in &mut own.children {
                    if let Some(original) = other.get(key) {
                        child.adopt_metadata(original);
                    }
                }
            }
            (Self::List(own), Self::List(other)) => {
                if own.label.is_none() {
                    own.label.clone_from(&other.label);
                }
                for (delta, child) in &mut own.items {
                    if let Some(original) = other.items.get(delta) {
                        child.adopt_metadata(original);
                    }
                }
            }
            (Self::Unit(own), Self::Unit(other)) => {
                own.translatable &= other.translatable;
                if own.max_length.is_none() {
                    own.max_length = other.max_length;
                }
                if own.format_id.is_none() {
                    own.format_id.clone_from(&other.format_id);
                }
                if own.parent_label_path.is_empty() {
                    own.parent_label_path.clone_from(&other.parent_label_path);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    fn paragraph_tree() -> TranslationNode {
        let entity = ObjectNode::labeled("Text paragraph")
            .with_provenance("paragraph", "text")
            .with_child(
                "field_text",
                TranslationNode::List(ListNode::labeled("Text").with_item(
                    0,
                    TranslationNode::Object(
                        ObjectNode::labeled("Delta #0")
                            .with_child("value", TranslationNode::Unit(TranslationUnit::new("Hi"))),
                    ),
                )),
            );
        let item = ObjectNode::labeled("Delta #0").with_child(
            "entity",
            TranslationNode::Reference(EmbeddedReference {
                entity_type: "paragraph".to_string(),
                entity_bundle: "text".to_string(),
                entity_id: 7,
                child: Box::new(TranslationNode::Object(entity)),
            }),
        );
        let mut tree = TranslationNode::Object(ObjectNode::new().with_child(
            "field_paragraphs",
            TranslationNode::List(
                ListNode::labeled("Paragraphs").with_item(0, TranslationNode::Object(item)),
            ),
        ));
        tree.assign_label_paths();
        tree
    }

    fn first_unit(node: &TranslationNode) -> Option<&TranslationUnit> {
        match node {
            TranslationNode::Unit(unit) => Some(unit),
            TranslationNode::Object(object) => object.iter().find_map(|(_, child)| first_unit(child)),
            TranslationNode::List(list) => list.items.values().find_map(first_unit),
            TranslationNode::Reference(reference) => first_unit(&reference.child),
        }
    }

    #[googletest::test]
    fn label_paths_skip_root_and_reference() {
        let tree = paragraph_tree();

        let unit = first_unit(&tree).unwrap();

        expect_that!(
            unit.parent_label_path,
            elements_are![
                eq("Paragraphs"),
                eq("Delta #0"),
                eq("Text paragraph"),
                eq("Text"),
                eq("Delta #0")
            ]
        );
    }

    #[googletest::test]
    fn adopt_metadata_wraps_references_again() {
        let original = paragraph_tree();
        let mut stripped = original.clone();
        strip_references(&mut stripped);
        assert_ne!(stripped, original);

        stripped.adopt_metadata(&original);

        expect_that!(stripped, eq(&original));
    }

    #[googletest::test]
    fn adopt_metadata_keeps_template_lock_on_units() {
        let template = TranslationNode::Unit(TranslationUnit::mirrored("full_html"));
        let mut submitted = TranslationNode::Unit(TranslationUnit::new("full_html"));

        submitted.adopt_metadata(&template);

        expect_that!(submitted.as_unit().map(|unit| unit.translatable), some(eq(false)));
    }

    #[googletest::test]
    fn translatable_leaf_detection() {
        let mirrored_only = TranslationNode::Object(
            ObjectNode::new().with_child("uri", TranslationNode::Unit(TranslationUnit::mirrored("x"))),
        );

        expect_that!(mirrored_only.has_translatable_leaf(), eq(false));
        expect_that!(paragraph_tree().has_translatable_leaf(), eq(true));
    }

    #[googletest::test]
    fn insert_replaces_in_place() {
        let mut object = ObjectNode::new()
            .with_child("a", TranslationNode::Unit(TranslationUnit::new("1")))
            .with_child("b", TranslationNode::Unit(TranslationUnit::new("2")));

        object.insert("a", TranslationNode::Unit(TranslationUnit::new("3")));

        expect_that!(object.keys().collect::<Vec<_>>(), elements_are![eq(&"a"), eq(&"b")]);
        expect_that!(
            object.get("a").and_then(TranslationNode::as_unit).map(|unit| unit.text.as_str()),
            some(eq("3"))
        );
    }

    fn strip_references(node: &mut TranslationNode) {
        match node {
            TranslationNode::Reference(reference) => {
                let mut child = std::mem::take(reference.child.as_mut());
                strip_references(&mut child);
                if let TranslationNode::Object(object) = &mut child {
                    object.provenance = None;
                }
                *node = child;
            }
            TranslationNode::Object(object) => {
                for (_, child) in &mut object.children {
                    strip_references(child);
                }
            }
            TranslationNode::List(list) => list.items.values_mut().for_each(strip_references),
            TranslationNode::Unit(_) => {}
        }
    }
}
