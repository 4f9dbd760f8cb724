//! Error types and handling for aichatconf core

use thiserror::Error;

/// Result type alias for aichatconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for aichatconf core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Document parsing and tree-shape errors
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Model inventory errors
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Response bodies that are not the expected JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Client not found: {name}")]
    ClientNotFound { name: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// Errors raised while reading the configuration document
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DocumentError {
    #[error("empty config file")]
    Empty,

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unsupported construct: {construct}")]
    Unsupported { line: usize, construct: String },

    #[error("expected {expected} at '{path}'")]
    UnexpectedShape { path: String, expected: String },
}

/// Model inventory errors
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },
}

impl From<yaml_edit::YamlError> for DocumentError {
    fn from(error: yaml_edit::YamlError) -> Self {
        match error {
            yaml_edit::YamlError::Parse { message, line, .. } => DocumentError::Syntax {
                line: line.unwrap_or(1),
                message,
            },
            other => DocumentError::Syntax {
                line: 1,
                message: other.to_string(),
            },
        }
    }
}
