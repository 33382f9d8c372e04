//! Error types for modelgen

use thiserror::Error;

/// Result type for modelgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for modelgen
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Schema fact error for table {table}: {message}")]
    SchemaFactError { table: String, message: String },

    #[error("Template error in {template}: {message}")]
    TemplateError { template: String, message: String },

    #[error("Binding error in {template}: model has no field {path}")]
    BindingError { template: String, path: String },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Attach the originating table to a provider failure
    pub fn schema_fact(table: impl Into<String>, message: impl ToString) -> Self {
        Error::SchemaFactError {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Re-attribute a provider failure to `table` unless it already names one
    pub fn with_table(self, table: &str) -> Self {
        match self {
            Error::SchemaFactError { .. } => self,
            other => Error::schema_fact(table, other),
        }
    }
}

/// Convert Serde JSON errors to modelgen errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to modelgen errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(format!("Failed to parse config file: {}", error))
    }
}

/// Convert YAML deserialization errors to modelgen errors
impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::ConfigError(format!("Failed to parse config file: {}", error))
    }
}
