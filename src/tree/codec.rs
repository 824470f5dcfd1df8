//! Flattening between the nested tree and addressable flat units.

use serde::{
    Deserialize,
    Serialize,
};

use super::node::{
    ListNode,
    ObjectNode,
    TranslationNode,
    TranslationUnit,
};
use crate::error::TranslationError;

/// Default delimiter between path segments.
pub const DEFAULT_DELIMITER: &str = "][";

/// Ordered map of flat path to translation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatUnits(Vec<(String, TranslationUnit)>);

impl FlatUnits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit, replacing an existing unit at the same path.
    pub fn insert(&mut self, path: impl Into<String>, unit: TranslationUnit) {
        let path = path.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == path) {
            Some((_, slot)) => *slot = unit,
            None => self.0.push((path, unit)),
        }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&TranslationUnit> {
        self.0.iter().find(|(existing, _)| existing == path).map(|(_, unit)| unit)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TranslationUnit)> {
        self.0.iter().map(|(path, unit)| (path.as_str(), unit))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(path, _)| path.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fills the translation slot of one unit.
    pub fn set_translation(
        &mut self,
        path: &str,
        translation: impl Into<String>,
    ) -> Result<(), TranslationError> {
        let unit = self
            .0
            .iter_mut()
            .find(|(existing, _)| existing == path)
            .map(|(_, unit)| unit)
            .ok_or_else(|| TranslationError::UnknownUnit(path.to_string()))?;

        if !unit.translatable {
            return Err(TranslationError::NotTranslatable { path: path.to_string() });
        }

        unit.translation = Some(translation.into());
        Ok(())
    }

    /// Path and translation of every translated unit.
    pub fn translations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter_map(|(path, unit)| {
            unit.translation.as_deref().filter(|_| unit.translatable).map(|text| (path, text))
        })
    }

    /// Words of source text that need translating.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.iter()
            .filter(|(_, unit)| unit.translatable)
            .map(|(_, unit)| unit.text.split_whitespace().count())
            .sum()
    }

    /// Paths whose translation is longer than the unit's `max_length`.
    #[must_use]
    pub fn over_length(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, unit)| {
                match (unit.max_length, unit.translation.as_deref()) {
                    (Some(max), Some(translation)) => {
                        translation.chars().count() > usize::try_from(max).unwrap_or(usize::MAX)
                    }
                    _ => false,
                }
            })
            .map(|(path, _)| path)
            .collect()
    }
}

impl FromIterator<(String, TranslationUnit)> for FlatUnits {
    fn from_iter<I: IntoIterator<Item = (String, TranslationUnit)>>(iter: I) -> Self {
        let mut units = Self::new();
        for (path, unit) in iter {
            units.insert(path, unit);
        }
        units
    }
}

/// Converts between nested trees and [`FlatUnits`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeCodec {
    delimiter: String,
}

impl Default for TreeCodec {
    fn default() -> Self {
        Self { delimiter: DEFAULT_DELIMITER.to_string() }
    }
}

impl TreeCodec {
    #[must_use]
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self { delimiter: delimiter.into() }
    }

    #[must_use]
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Joins path segments with the delimiter.
    #[must_use]
    pub fn join<S: AsRef<str>>(&self, segments: &[S]) -> String {
        segments.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(&self.delimiter)
    }

    /// Flattens a tree depth-first into leaf units keyed by path.
    ///
    /// Embedded references add no path segment. Non-translatable units with empty
    /// text are skipped.
    #[must_use]
    pub fn flatten(&self, node: &TranslationNode) -> FlatUnits {
        let mut result = FlatUnits::new();
        self.flatten_node(node, None, &mut result);
        result
    }

    fn flatten_node(&self, node: &TranslationNode, prefix: Option<&str>, result: &mut FlatUnits) {
        match node {
            TranslationNode::Unit(unit) => {
                if !unit.translatable && unit.text.is_empty() {
                    return;
                }
                result.insert(prefix.unwrap_or_default(), unit.clone());
            }
            TranslationNode::Object(object) => {
                for (key, child) in object.iter() {
                    let full_key = self.child_key(prefix, key);
                    self.flatten_node(child, Some(&full_key), result);
                }
            }
            TranslationNode::List(list) => {
                for (delta, child) in &list.items {
                    let full_key = self.child_key(prefix, &delta.to_string());
                    self.flatten_node(child, Some(&full_key), result);
                }
            }
            TranslationNode::Reference(reference) => {
                self.flatten_node(&reference.child, prefix, result);
            }
        }
    }

    fn child_key(&self, prefix: Option<&str>, key: &str) -> String {
        prefix.map_or_else(|| key.to_string(), |p| format!("{p}{}{key}", self.delimiter))
    }

    /// Rebuilds a tree from flat units.
    ///
    /// The root is always an object. Canonical decimal segments become list deltas.
    /// Container labels come from each unit's `parent_label_path` when its length
    /// matches the container depth.
    pub fn unflatten(&self, units: &FlatUnits) -> Result<TranslationNode, TranslationError> {
        let mut root = TranslationNode::Object(ObjectNode::new());

        for (path, unit) in units.iter() {
            let segments: Vec<&str> = path.split(self.delimiter.as_str()).collect();
            if segments.iter().any(|segment| segment.is_empty()) {
                return Err(TranslationError::shape(path, "empty path segment"));
            }

            let labels = (unit.parent_label_path.len() + 1 == segments.len())
                .then_some(unit.parent_label_path.as_slice());

            place(&mut root, &segments, labels, unit.clone(), path)?;
        }

        Ok(root)
    }
}

fn place(
    container: &mut TranslationNode,
    segments: &[&str],
    labels: Option<&[String]>,
    unit: TranslationUnit,
    path: &str,
) -> Result<(), TranslationError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Err(TranslationError::shape(path, "empty path"));
    };

    let Some(next) = rest.first() else {
        if has_child(container, segment) {
            return Err(TranslationError::shape(path, "path is both a leaf and a container"));
        }
        child_or_insert(container, segment, TranslationNode::Unit(unit), path)?;
        return Ok(());
    };

    let wants_list = delta_of(next).is_some();
    let empty = if wants_list {
        TranslationNode::List(ListNode::default())
    } else {
        TranslationNode::Object(ObjectNode::default())
    };

    let child = child_or_insert(container, segment, empty, path)?;
    match (&*child, wants_list) {
        (TranslationNode::List(_), true) | (TranslationNode::Object(_), false) => {}
        (TranslationNode::Unit(_), _) => {
            return Err(TranslationError::shape(path, "path is both a leaf and a container"));
        }
        _ => {
            return Err(TranslationError::shape(
                path,
                "segment is used both as a list delta and as a field name",
            ));
        }
    }

    let (label, rest_labels) = match labels.and_then(<[String]>::split_first) {
        Some((label, rest_labels)) => (Some(label), Some(rest_labels)),
        None => (None, None),
    };
    if let Some(label) = label
        && child.label().is_none()
    {
        child.set_label(label.clone());
    }

    place(child, rest, rest_labels, unit, path)
}

fn has_child(container: &TranslationNode, segment: &str) -> bool {
    match container {
        TranslationNode::Object(object) => object.contains_key(segment),
        TranslationNode::List(list) => {
            delta_of(segment).is_some_and(|delta| list.items.contains_key(&delta))
        }
        _ => false,
    }
}

fn child_or_insert<'a>(
    container: &'a mut TranslationNode,
    segment: &str,
    default: TranslationNode,
    path: &str,
) -> Result<&'a mut TranslationNode, TranslationError> {
    match container {
        TranslationNode::Object(object) => Ok(object.entry(segment, default)),
        TranslationNode::List(list) => {
            let delta = delta_of(segment).ok_or_else(|| {
                TranslationError::shape(path, format!("'{segment}' is not a list delta"))
            })?;
            Ok(list.items.entry(delta).or_insert(default))
        }
        _ => Err(TranslationError::shape(path, "cannot descend below a leaf")),
    }
}

/// Parses a canonical decimal delta (`0`, `12`; not `01` or `+1`).
fn delta_of(segment: &str) -> Option<usize> {
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if canonical { segment.parse().ok() } else { None }
}
