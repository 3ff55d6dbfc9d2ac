//! Error types for csvbind.
//!
//! - [`BindError`] - property construction, binding and value conversion errors
//! - [`SourceError`] - CSV source (decoding, tokenizing) errors
//! - [`SchemaError`] - binding schema loading errors
//! - [`Error`] - top-level wrapper used by the binary
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Binding Errors
// =============================================================================

/// Errors raised by properties, converters and bindings.
#[derive(Debug, Error)]
pub enum BindError {
    /// Property name is not an ASCII identifier.
    #[error("'{0}' is not a valid property name: expected [A-Za-z_][A-Za-z0-9_]*")]
    BadIdentifier(String),

    /// A property with the same name already exists in the binding.
    #[error("A property named '{0}' already exists")]
    DuplicateName(String),

    /// Position-based operation outside the binding.
    #[error("Index {index} is out of range for a binding of {len} properties")]
    IndexOutOfRange { index: usize, len: usize },

    /// No property with that name.
    #[error("No property named '{0}'")]
    UnknownProperty(String),

    /// Value access before a record was attached.
    #[error("Property '{0}' is not bound to a record")]
    NotBound(String),

    /// Null on a converter that rejects it, or a value of the wrong type.
    #[error("Invalid cast: {0}")]
    InvalidCast(String),

    /// Text could not be converted to the target type.
    #[error("Cannot convert {preview} to {target}")]
    Conversion { target: &'static str, preview: String },

    /// A value could not be formatted.
    #[error("Format error: {0}")]
    Format(String),

    /// Separator the record tokenizer cannot use.
    #[error("{0:?} cannot be used as a field separator")]
    InvalidSeparator(char),
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while turning CSV bytes into records.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read input.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the input bytes.
    #[error("Failed to decode input: {0}")]
    Encoding(String),

    /// Tokenizer error.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// No header and no rows.
    #[error("CSV input is empty")]
    EmptyInput,

    /// The tokenizer only splits on single-byte delimiters.
    #[error("{0:?} cannot be used as a CSV delimiter")]
    InvalidDelimiter(char),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors while loading a binding schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// IO error.
    #[error("Schema IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Schema JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Property declares neither an index nor aliases.
    #[error("Property '{0}' needs either an index or aliases")]
    MissingTarget(String),

    /// Option combination the property type does not support.
    #[error("Property '{property}': {reason}")]
    Unsupported { property: String, reason: String },

    /// Building the binding failed.
    #[error("Schema error: {0}")]
    Bind(#[from] BindError),
}

// =============================================================================
// Top-level Errors
// =============================================================================

/// Top-level error wrapping every lower-level error.
#[derive(Debug, Error)]
pub enum Error {
    /// Binding error.
    #[error("Binding error: {0}")]
    Bind(#[from] BindError),

    /// Source error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for binding operations.
pub type BindResult<T> = std::result::Result<T, BindError>;

/// Result type for source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type for schema operations.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Result type for top-level operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let bind_err = BindError::DuplicateName("title".into());
        let schema_err: SchemaError = bind_err.into();
        assert!(schema_err.to_string().contains("title"));

        let top: Error = schema_err.into();
        assert!(top.to_string().contains("already exists"));

        let source_err = SourceError::EmptyInput;
        let top: Error = source_err.into();
        assert!(top.to_string().contains("empty"));
    }

    #[test]
    fn test_conversion_error_format() {
        let err = BindError::Conversion {
            target: "i32",
            preview: "\"abc\"".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("i32"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_index_out_of_range_format() {
        let err = BindError::IndexOutOfRange { index: 7, len: 2 };
        let msg = err.to_string();
        assert!(msg.contains('7'));
        assert!(msg.contains('2'));
    }
}
