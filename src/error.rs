//! Error types for typed stores
//!
//! Error codes:
//! - TYPEDSTORE_UNSUPPORTED_TYPE (definition time)
//! - TYPEDSTORE_INVALID_DECLARATION (definition time)
//! - TYPEDSTORE_RECORD_TYPE_EXISTS (definition time)
//! - TYPEDSTORE_INVALID_PAYLOAD (serialize time)
//! - TYPEDSTORE_MALFORMED_PAYLOAD (materialize time)
//! - TYPEDSTORE_DISALLOWED_TYPE (materialize time)
//! - TYPEDSTORE_UNKNOWN_RECORD_TYPE
//! - TYPEDSTORE_UNKNOWN_STORE
//! - TYPEDSTORE_NO_SUCH_ACCESSOR
//! - TYPEDSTORE_UNKNOWN_ATTRIBUTE
//!
//! Casting never fails, so there is no cast error.

use thiserror::Error;

/// Result type for typed store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Typed store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Unsupported field type '{0}'")]
    UnsupportedType(String),

    #[error("Invalid store declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Record type '{0}' already has stores registered")]
    RecordTypeExists(String),

    #[error("Store payload must be a map, {found} received")]
    InvalidPayload { found: &'static str },

    #[error("Malformed store payload ({codec}): {reason}")]
    MalformedPayload { codec: &'static str, reason: String },

    #[error("Type tag '{0}' is not in the codec allow-list")]
    DisallowedType(String),

    #[error("Unknown record type '{0}'")]
    UnknownRecordType(String),

    #[error("Record type '{record_type}' has no store '{store}'")]
    UnknownStore { record_type: String, store: String },

    #[error("Undefined accessor '{name}' for '{record_type}'")]
    NoSuchAccessor { record_type: String, name: String },

    #[error("Unknown attribute '{name}' for '{record_type}'")]
    UnknownAttribute { record_type: String, name: String },
}

impl StoreError {
    pub(crate) fn malformed(codec: &'static str, reason: impl Into<String>) -> Self {
        StoreError::MalformedPayload {
            codec,
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::UnsupportedType(_) => "TYPEDSTORE_UNSUPPORTED_TYPE",
            StoreError::InvalidDeclaration(_) => "TYPEDSTORE_INVALID_DECLARATION",
            StoreError::RecordTypeExists(_) => "TYPEDSTORE_RECORD_TYPE_EXISTS",
            StoreError::InvalidPayload { .. } => "TYPEDSTORE_INVALID_PAYLOAD",
            StoreError::MalformedPayload { .. } => "TYPEDSTORE_MALFORMED_PAYLOAD",
            StoreError::DisallowedType(_) => "TYPEDSTORE_DISALLOWED_TYPE",
            StoreError::UnknownRecordType(_) => "TYPEDSTORE_UNKNOWN_RECORD_TYPE",
            StoreError::UnknownStore { .. } => "TYPEDSTORE_UNKNOWN_STORE",
            StoreError::NoSuchAccessor { .. } => "TYPEDSTORE_NO_SUCH_ACCESSOR",
            StoreError::UnknownAttribute { .. } => "TYPEDSTORE_UNKNOWN_ATTRIBUTE",
        }
    }

    /// Whether the error is raised while declaring stores rather than at runtime
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            StoreError::UnsupportedType(_)
                | StoreError::InvalidDeclaration(_)
                | StoreError::RecordTypeExists(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            StoreError::UnsupportedType("money".into()).code(),
            "TYPEDSTORE_UNSUPPORTED_TYPE"
        );
        assert_eq!(
            StoreError::InvalidPayload { found: "integer" }.code(),
            "TYPEDSTORE_INVALID_PAYLOAD"
        );
    }

    #[test]
    fn test_definition_errors() {
        assert!(StoreError::UnsupportedType("money".into()).is_definition_error());
        assert!(!StoreError::InvalidPayload { found: "string" }.is_definition_error());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::InvalidPayload { found: "integer" };
        let display = format!("{}", err);
        assert!(display.contains("map"));
        assert!(display.contains("integer"));
    }
}
