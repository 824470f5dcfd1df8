use super::FieldProcessor;
use crate::content::FieldDefinition;

/// URL alias fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathFieldProcessor;

impl FieldProcessor for PathFieldProcessor {
    fn is_translatable_property(&self, _field: &FieldDefinition, property: &str) -> bool {
        property == "alias"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::test_utils::items;
    use crate::tree::TreeCodec;

    #[googletest::test]
    fn alias_is_the_only_translatable_property() {
        let field = FieldDefinition::new("path", "path").label("URL alias");
        let current = items(json!([{"alias": "/about", "pid": 4, "langcode": "en"}]));

        let node = PathFieldProcessor.extract(&field, &current).unwrap().unwrap();
        let flat = TreeCodec::default().flatten(&node);

        let translatable: Vec<&str> =
            flat.iter().filter(|(_, unit)| unit.translatable).map(|(path, _)| path).collect();
        expect_that!(translatable, elements_are![eq(&"0][alias")]);
        expect_that!(flat.len(), eq(3));
    }
}
