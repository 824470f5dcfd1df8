//! Extraction of translation trees from entities and recomposition of translated trees.
mod extractor;
mod policy;
mod preview;
mod recomposer;

use std::sync::Arc;

pub use extractor::{
    Extraction,
    SourceExtractor,
};
pub use policy::{
    ConfiguredWeights,
    DefaultEmbeddability,
    EmbeddabilityPolicy,
    FieldWeightPolicy,
};
pub use preview::{
    PreviewCache,
    PreviewKey,
};
pub use recomposer::{
    Dependent,
    RecomposeOptions,
    RecomposeOutcome,
    SourceRecomposer,
};

use crate::config::{
    FieldMatcher,
    MatcherError,
    TranslationSettings,
};
use crate::content::{
    ContentEntity,
    FieldDefinition,
    SchemaRegistry,
};
use crate::error::TranslationError;
use crate::field::FieldProcessorRegistry;
use crate::storage::EntityStorage;

/// Everything extraction and recomposition consult about the content model.
#[derive(Debug, Clone)]
pub struct TranslationContext {
    pub schema: Arc<SchemaRegistry>,
    pub processors: Arc<FieldProcessorRegistry>,
    pub storage: Arc<dyn EntityStorage>,
    pub weights: Arc<dyn FieldWeightPolicy>,
    pub embeddability: Arc<dyn EmbeddabilityPolicy>,
    pub field_matcher: FieldMatcher,
    pub settings: TranslationSettings,
}

/// A field taking part in translation.
#[derive(Debug, Clone, Copy)]
pub struct EligibleField<'a> {
    pub definition: &'a FieldDefinition,
    /// Referenced entities are walked instead of the field value itself.
    pub embeddable: bool,
}

impl TranslationContext {
    /// Builds a context with the configured weight and embeddability policies and
    /// the built-in field processors.
    pub fn new(
        schema: SchemaRegistry,
        storage: Arc<dyn EntityStorage>,
        settings: TranslationSettings,
    ) -> Result<Self, MatcherError> {
        let schema = Arc::new(schema);
        let field_matcher = FieldMatcher::new(&settings)?;
        Ok(Self {
            weights: Arc::new(ConfiguredWeights::new(settings.field_weights.clone())),
            embeddability: Arc::new(DefaultEmbeddability::new(field_matcher.clone(), schema.clone())),
            processors: Arc::new(FieldProcessorRegistry::default()),
            schema,
            storage,
            field_matcher,
            settings,
        })
    }

    #[must_use]
    pub fn with_processors(mut self, processors: FieldProcessorRegistry) -> Self {
        self.processors = Arc::new(processors);
        self
    }

    #[must_use]
    pub fn with_weights(mut self, weights: Arc<dyn FieldWeightPolicy>) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub fn with_embeddability(mut self, embeddability: Arc<dyn EmbeddabilityPolicy>) -> Self {
        self.embeddability = embeddability;
        self
    }

    /// Fields of the entity's bundle that extraction walks and recomposition writes,
    /// in declaration order.
    pub fn eligible_fields(
        &self,
        entity: &ContentEntity,
    ) -> Result<Vec<EligibleField<'_>>, TranslationError> {
        let entity_type = self.schema.entity_type(&entity.entity_type)?;
        let bundle = self.schema.bundle(&entity.entity_type, &entity.bundle)?;

        let mut fields = Vec::new();
        for definition in &bundle.fields {
            if self.field_matcher.is_excluded(&entity.entity_type, &entity.bundle, &definition.name) {
                continue;
            }
            if self.embeddability.is_embeddable(&entity.entity_type, &entity.bundle, definition) {
                fields.push(EligibleField { definition, embeddable: true });
                continue;
            }
            if self.settings.non_text_field_types.contains(&definition.field_type)
                || !definition.translatable
                || !(bundle.translatable || entity_type.translatable)
            {
                continue;
            }
            fields.push(EligibleField { definition, embeddable: false });
        }
        Ok(fields)
    }
}
