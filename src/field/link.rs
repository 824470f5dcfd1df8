use super::FieldProcessor;
use crate::content::FieldDefinition;

/// Link fields: only the link text is translated, the target stays as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkFieldProcessor;

impl FieldProcessor for LinkFieldProcessor {
    fn is_translatable_property(&self, _field: &FieldDefinition, property: &str) -> bool {
        property == "title"
    }
}
