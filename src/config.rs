//! Settings file loading, validation and field pattern matching.
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Field pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use loader::CONFIG_FILE_NAME;
pub use manager::ConfigManager;
pub use matcher::{
    FieldMatcher,
    MatcherError,
};
pub use types::{
    ConfigError,
    LoggingConfig,
    TranslationSettings,
    ValidationError,
};
