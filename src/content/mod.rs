//! Content entities and their schema.
mod entity;
mod schema;

pub use entity::{
    ContentEntity,
    FieldItem,
    FieldItemList,
    FieldValues,
    TARGET_ID,
    TARGET_REVISION_ID,
    property_text,
    target_id,
    target_revision_id,
};
pub use schema::{
    BundleDefinition,
    EntityTypeDefinition,
    FieldDefinition,
    SchemaRegistry,
};
