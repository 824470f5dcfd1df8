use serde_json::Value;

use super::FieldProcessor;
use crate::content::{
    FieldDefinition,
    FieldItem,
    property_text,
};
use crate::tree::TranslationUnit;

/// Plain and formatted text fields.
///
/// `value` and `summary` are translatable and carry the item's text format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFieldProcessor;

impl TextFieldProcessor {
    pub const FIELD_TYPES: [&'static str; 5] =
        ["string", "string_long", "text", "text_long", "text_with_summary"];
}

impl FieldProcessor for TextFieldProcessor {
    fn is_translatable_property(&self, _field: &FieldDefinition, property: &str) -> bool {
        matches!(property, "value" | "summary")
    }

    fn property_unit(
        &self,
        field: &FieldDefinition,
        item: &FieldItem,
        property: &str,
        value: &Value,
    ) -> TranslationUnit {
        let text = property_text(value);
        if !self.is_translatable_property(field, property) || !value.is_string() {
            return TranslationUnit::mirrored(text);
        }

        let format_id = item.get("format").and_then(Value::as_str).map(str::to_string);
        TranslationUnit::new(text).with_max_length(field.max_length).with_format(format_id)
    }
}
