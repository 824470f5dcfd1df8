//! Per field-type strategies for extracting units and writing translations back.
//!
//! Every processor works on the same node shape: a list labeled with the field label,
//! holding one object per item delta (`Delta #n`), holding one unit per property.
mod default;
mod link;
mod path;
mod text;

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

pub use default::DefaultFieldProcessor;
pub use link::LinkFieldProcessor;
pub use path::PathFieldProcessor;
pub use text::TextFieldProcessor;

use crate::content::{
    FieldDefinition,
    FieldItem,
    FieldItemList,
    property_text,
};
use crate::error::TranslationError;
use crate::tree::{
    ListNode,
    ObjectNode,
    TranslationNode,
    TranslationUnit,
};

/// Label given to the node of one field item.
#[must_use]
pub fn delta_label(delta: usize) -> String {
    format!("Delta #{delta}")
}

pub trait FieldProcessor: fmt::Debug + Send + Sync {
    /// Whether `property` of this field type may ever be written from a tree.
    fn is_translatable_property(&self, field: &FieldDefinition, property: &str) -> bool;

    /// Builds the unit for one property of one item.
    fn property_unit(
        &self,
        field: &FieldDefinition,
        _item: &FieldItem,
        property: &str,
        value: &Value,
    ) -> TranslationUnit {
        let text = property_text(value);
        if self.is_translatable_property(field, property) && !is_structured(value) {
            TranslationUnit::new(text).with_max_length(field.max_length)
        } else {
            TranslationUnit::mirrored(text)
        }
    }

    /// Extracts the node for a field value, `None` when the field has no items.
    fn extract(
        &self,
        field: &FieldDefinition,
        items: &[FieldItem],
    ) -> Result<Option<TranslationNode>, TranslationError> {
        let mut list = ListNode::labeled(field.label.clone());
        for (delta, item) in items.iter().enumerate() {
            let mut object = ObjectNode::labeled(delta_label(delta));
            for (property, value) in item {
                let unit = self.property_unit(field, item, property, value);
                object.insert(property.clone(), TranslationNode::Unit(unit));
            }
            if !object.is_empty() {
                list.items.insert(delta, TranslationNode::Object(object));
            }
        }

        Ok((!list.items.is_empty()).then_some(TranslationNode::List(list)))
    }

    /// Writes the translations carried by `node` onto a copy of `current`.
    fn apply(
        &self,
        field: &FieldDefinition,
        node: &TranslationNode,
        current: &[FieldItem],
    ) -> Result<FieldItemList, TranslationError> {
        apply_translations(self, field, node, current)
    }
}

fn is_structured(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Partial write shared by the built-in processors.
///
/// Only properties that the processor and the unit both mark translatable, and that
/// carry a translation, are replaced. Everything else keeps its current value.
fn apply_translations<P: FieldProcessor + ?Sized>(
    processor: &P,
    field: &FieldDefinition,
    node: &TranslationNode,
    current: &[FieldItem],
) -> Result<FieldItemList, TranslationError> {
    let TranslationNode::List(list) = node else {
        return Err(TranslationError::shape(&field.name, "expected a list of field items"));
    };

    let mut items = current.to_vec();
    for (delta, item_node) in &list.items {
        let item_path = format!("{}[{delta}]", field.name);
        let TranslationNode::Object(properties) = item_node else {
            return Err(TranslationError::shape(item_path, "expected an object of properties"));
        };

        if *delta == items.len() {
            items.push(FieldItem::new());
        }
        let target = items.get_mut(*delta).ok_or_else(|| {
            TranslationError::shape(&item_path, "delta is beyond the next free item slot")
        })?;

        for (property, property_node) in properties.iter() {
            let property_path = format!("{item_path}.{property}");
            let TranslationNode::Unit(unit) = property_node else {
                return Err(TranslationError::shape(property_path, "expected a translation unit"));
            };
            if !unit.translatable || !processor.is_translatable_property(field, property) {
                continue;
            }
            let Some(translation) = &unit.translation else {
                continue;
            };
            if target.get(property).is_some_and(is_structured) {
                return Err(TranslationError::shape(property_path, "live value is structured"));
            }
            target.insert(property.to_string(), Value::String(translation.clone()));
        }
    }

    Ok(items)
}

/// Maps field-type identifiers to processors.
#[derive(Debug)]
pub struct FieldProcessorRegistry {
    processors: HashMap<String, Box<dyn FieldProcessor>>,
    fallback: Box<dyn FieldProcessor>,
}

impl Default for FieldProcessorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for field_type in TextFieldProcessor::FIELD_TYPES {
            registry.register(field_type, Box::new(TextFieldProcessor));
        }
        registry.register("link", Box::new(LinkFieldProcessor));
        registry.register("path", Box::new(PathFieldProcessor));
        registry
    }
}

impl FieldProcessorRegistry {
    /// Registry with only the fallback processor.
    #[must_use]
    pub fn empty() -> Self {
        Self { processors: HashMap::new(), fallback: Box::new(DefaultFieldProcessor) }
    }

    pub fn register(&mut self, field_type: impl Into<String>, processor: Box<dyn FieldProcessor>) {
        self.processors.insert(field_type.into(), processor);
    }

    #[must_use]
    pub fn processor_for(&self, field_type: &str) -> &dyn FieldProcessor {
        self.processors.get(field_type).map_or(&*self.fallback, |processor| &**processor)
    }
}
