//! Error types of the translation core.

use thiserror::Error;

use crate::storage::StorageError;
use crate::types::{
    EntityId,
    EntityKey,
    RevisionId,
};

#[derive(Error, Debug)]
pub enum TranslationError {
    /// The submitted tree does not fit the field or entity it targets.
    #[error("Tree shape mismatch at '{path}': {reason}")]
    ShapeMismatch { path: String, reason: String },

    /// An embedded reference in the tree points at an entity the source no longer holds.
    #[error("Referenced {entity_type} {entity_id} in field '{field}' could not be resolved")]
    MissingReferencedEntity { field: String, entity_type: String, entity_id: EntityId },

    #[error("Revision {revision_id} cannot be mapped for language '{langcode}': {reason}")]
    InvalidMappingTarget { langcode: String, revision_id: RevisionId, reason: String },

    #[error("Unknown entity type '{0}'")]
    UnknownEntityType(String),

    #[error("Unknown bundle '{bundle}' for entity type '{entity_type}'")]
    UnknownBundle { entity_type: String, bundle: String },

    #[error("Unit '{path}' is not translatable")]
    NotTranslatable { path: String },

    #[error("No translation unit at '{0}'")]
    UnknownUnit(String),

    #[error("Embedded content nests deeper than {limit} levels")]
    DepthLimitExceeded { limit: usize },

    #[error("Lock for {expected} is not held (got lock for {held})")]
    LockNotHeld { expected: EntityKey, held: EntityKey },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TranslationError {
    pub(crate) fn shape(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch { path: path.into(), reason: reason.into() }
    }
}
