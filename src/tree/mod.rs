//! Translation trees and their flat form.
pub mod codec;
mod node;

pub use codec::{
    DEFAULT_DELIMITER,
    FlatUnits,
    TreeCodec,
};
pub use node::{
    EmbeddedReference,
    ListNode,
    ObjectNode,
    Provenance,
    TranslationNode,
    TranslationUnit,
};
