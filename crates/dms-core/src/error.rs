//! Error types for the document indexing core.

use thiserror::Error;

/// Result type alias using the crate-wide Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for metadata template, indexing and search operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No metadata templates are bound to the document type.
    #[error("No metadata templates configured for document type {docrule_id}")]
    NoTemplatesConfigured { docrule_id: String },

    /// Metadata template lookup by id failed.
    #[error("Metadata template not found: {0}")]
    TemplateNotFound(String),

    /// A template declares a field type the resolver does not know.
    #[error("Unsupported field type '{type_name}' in template {mdt_id} at position {position}")]
    UnsupportedFieldType {
        mdt_id: String,
        position: u32,
        type_name: String,
    },

    /// A submitted value could not be coerced to the field's type.
    #[error("Invalid value '{value}' for field '{field}': expected {expected}")]
    InvalidFieldValue {
        field: String,
        value: String,
        expected: String,
    },

    /// A search was requested without any criteria.
    #[error("No search criteria supplied")]
    NoSearchCriteria,

    /// Date string did not match any accepted format.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Conditions the caller should render as a warning rather than a fault.
    pub fn is_user_warning(&self) -> bool {
        matches!(
            self,
            Error::NoTemplatesConfigured { .. } | Error::NoSearchCriteria
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_no_templates() {
        let err = Error::NoTemplatesConfigured {
            docrule_id: "7".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No metadata templates configured for document type 7"
        );
    }

    #[test]
    fn test_error_display_unsupported_field_type() {
        let err = Error::UnsupportedFieldType {
            mdt_id: "mdt1".to_string(),
            position: 3,
            type_name: "boolean".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported field type 'boolean' in template mdt1 at position 3"
        );
    }

    #[test]
    fn test_error_display_invalid_field_value() {
        let err = Error::InvalidFieldValue {
            field: "Friends ID".to_string(),
            value: "abc".to_string(),
            expected: "integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'abc' for field 'Friends ID': expected integer"
        );
    }

    #[test]
    fn test_warnings_are_classified() {
        assert!(Error::NoSearchCriteria.is_user_warning());
        assert!(Error::NoTemplatesConfigured {
            docrule_id: "2".to_string()
        }
        .is_user_warning());
        assert!(!Error::InvalidDate("32/13/2012".to_string()).is_user_warning());
        assert!(!Error::TemplateNotFound("mdt9".to_string()).is_user_warning());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "fixture missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("fixture missing"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
