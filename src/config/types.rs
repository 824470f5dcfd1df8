use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::tree::DEFAULT_DELIMITER;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "excludedFields[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationSettings {
    /// Delimiter between flat path segments.
    pub path_delimiter: String,

    /// Maximum nesting of embedded entities followed during extraction.
    pub max_depth: usize,

    /// Field types that never carry translatable text.
    pub non_text_field_types: Vec<String>,

    /// Glob patterns over `entity_type.bundle.field` excluded from extraction.
    pub excluded_fields: Vec<String>,

    /// Glob patterns over `entity_type.bundle.field` whose referenced entities are
    /// embedded into the parent's tree.
    ///
    /// Reference fields targeting composite entity types are embedded regardless.
    pub embeddable_fields: Vec<String>,

    /// Ordering weight per `entity_type.bundle.field`; lower weights come first.
    pub field_weights: BTreeMap<String, i32>,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "content_translation=debug").
    pub level: String,

    /// Directory for daily rolling log files. Logs go to stderr when unset.
    pub directory: Option<String>,

    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), directory: None, file_name: "content-translation.log".to_string() }
    }
}

impl TranslationSettings {
    /// # Errors
    /// - Invalid delimiter
    /// - Depth limit below one
    /// - Invalid glob pattern
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.path_delimiter.is_empty() {
            errors.push(ValidationError::new(
                "pathDelimiter",
                "The delimiter cannot be empty. Please specify a delimiter, for example: \"][\"",
            ));
        } else if self.path_delimiter.chars().any(|c| c.is_ascii_digit()) {
            errors.push(ValidationError::new(
                "pathDelimiter",
                format!(
                    "The delimiter '{}' cannot contain digits because digits address list items",
                    self.path_delimiter
                ),
            ));
        }

        if self.max_depth == 0 {
            errors.push(ValidationError::new("maxDepth", "The depth limit must be at least 1"));
        }

        for (index, pattern) in self.excluded_fields.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludedFields[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.embeddable_fields.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("embeddableFields[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.logging.file_name.is_empty() {
            errors.push(ValidationError::new(
                "logging.fileName",
                "The file name cannot be empty. Example: \"content-translation.log\"",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            path_delimiter: DEFAULT_DELIMITER.to_string(),
            max_depth: 10,
            non_text_field_types: [
                "language",
                "boolean",
                "integer",
                "decimal",
                "float",
                "timestamp",
                "created",
                "changed",
                "datetime",
                "list_integer",
                "list_float",
                "entity_reference",
                "image",
                "file",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            excluded_fields: vec![],
            embeddable_fields: vec![],
            field_weights: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}
