//! Active mappings: which revision's translation is shown per language and state.
mod record;
mod service;
mod store;

pub use record::{
    ActiveMappingRecord,
    MappingEntry,
};
pub use service::ActiveMappingService;
pub use store::{
    InMemoryMappingStore,
    MappingStore,
};
