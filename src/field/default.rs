use super::FieldProcessor;
use crate::content::FieldDefinition;

/// Fallback for field types without a dedicated processor.
///
/// The main `value` property is one opaque translatable string; every other property
/// is mirrored.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFieldProcessor;

impl FieldProcessor for DefaultFieldProcessor {
    fn is_translatable_property(&self, _field: &FieldDefinition, property: &str) -> bool {
        property == "value"
    }
}
