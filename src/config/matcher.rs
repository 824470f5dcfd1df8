//! Field pattern matcher for exclusion and embedding rules.

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::TranslationSettings;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid excluded field pattern '{pattern}': {source}")]
    InvalidExcludedPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid embeddable field pattern '{pattern}': {source}")]
    InvalidEmbeddablePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Matches `entity_type.bundle.field` identifiers against configured glob patterns.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    excluded_set: GlobSet,
    embeddable_set: GlobSet,
}

impl Default for FieldMatcher {
    fn default() -> Self {
        Self { excluded_set: GlobSet::empty(), embeddable_set: GlobSet::empty() }
    }
}

impl FieldMatcher {
    /// Creates a new matcher from settings.
    pub fn new(settings: &TranslationSettings) -> Result<Self, MatcherError> {
        let excluded_set = Self::build_glob_set(&settings.excluded_fields, |pattern, source| {
            MatcherError::InvalidExcludedPattern { pattern, source }
        })?;

        let embeddable_set = Self::build_glob_set(&settings.embeddable_fields, |pattern, source| {
            MatcherError::InvalidEmbeddablePattern { pattern, source }
        })?;

        Ok(Self { excluded_set, embeddable_set })
    }

    fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, MatcherError>
    where
        F: Fn(String, globset::Error) -> MatcherError,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    #[must_use]
    pub fn field_id(entity_type: &str, bundle: &str, field: &str) -> String {
        format!("{entity_type}.{bundle}.{field}")
    }

    /// Returns true if the field matches `excludedFields`.
    #[must_use]
    pub fn is_excluded(&self, entity_type: &str, bundle: &str, field: &str) -> bool {
        self.excluded_set.is_match(Self::field_id(entity_type, bundle, field))
    }

    /// Returns true if the field matches `embeddableFields` and not `excludedFields`.
    #[must_use]
    pub fn is_embeddable(&self, entity_type: &str, bundle: &str, field: &str) -> bool {
        let id = Self::field_id(entity_type, bundle, field);
        self.embeddable_set.is_match(&id) && !self.excluded_set.is_match(&id)
    }
}
