//! Error types for the migration core.
//!
//! `DecodeError` is raised by the payload decoder and carries only a byte
//! offset; everything that reaches the driver is a [`MigrateError`] with the
//! form and field context attached.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Boxed error used for collaborator failures we don't own.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A legacy extra payload that could not be decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} (at byte {offset})")]
pub struct DecodeError {
    pub offset: usize,
    pub message: String,
}

impl DecodeError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum MigrateError {
    #[error("Could not decode extra payload of field {cid} ({form_key}) on form {form_id}: {cause}")]
    #[diagnostic(
        code(webform_core::decode),
        help("The legacy `extra` column is not a serialized mapping; the whole form is skipped")
    )]
    Decode {
        form_id: i64,
        cid: i64,
        form_key: String,
        #[source]
        cause: DecodeError,
    },

    #[error("Submission {sid} references form {form_id}, which has no fields")]
    #[diagnostic(code(webform_core::missing_data))]
    MissingData { form_id: i64, sid: i64 },

    #[error("Nothing found: {what}")]
    #[diagnostic(
        code(webform_core::not_found),
        help("Make sure the legacy database contains webforms and the form identifier is correct")
    )]
    NotFound { what: String },

    #[error("Unreadable legacy data in {what}: {cause}")]
    #[diagnostic(
        code(webform_core::invalid_data),
        help("The row could not be read from the legacy database; only this form is skipped")
    )]
    InvalidData {
        what: String,
        #[source]
        cause: BoxError,
    },

    #[error("Could not reach the {collaborator}: {cause}")]
    #[diagnostic(
        code(webform_core::connectivity),
        help("Check the {collaborator} path in the configuration file")
    )]
    Connectivity {
        collaborator: &'static str,
        #[source]
        cause: BoxError,
    },

    #[error("Invalid target form {form_id}: {reason}")]
    #[diagnostic(code(webform_core::validation))]
    Validation { form_id: String, reason: String },

    #[error("Failed to persist {entity}: {cause}")]
    #[diagnostic(code(webform_core::persistence))]
    Persistence {
        entity: &'static str,
        id: String,
        #[source]
        cause: BoxError,
    },

    #[error("Configuration error in {config_path}")]
    #[diagnostic(
        code(webform_core::configuration_error),
        help("Check the configuration file at {config_path}")
    )]
    Config {
        config_path: String,
        #[source]
        cause: ConfigError,
    },
}

impl MigrateError {
    /// Create a connectivity error for the named collaborator.
    pub fn connectivity(collaborator: &'static str, cause: impl Into<BoxError>) -> Self {
        Self::Connectivity {
            collaborator,
            cause: cause.into(),
        }
    }

    /// Create an error for legacy rows that exist but cannot be read.
    pub fn invalid_data(what: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::InvalidData {
            what: what.into(),
            cause: cause.into(),
        }
    }

    /// Create a persistence error for one entity.
    pub fn persistence(entity: &'static str, id: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Persistence {
            entity,
            id: id.into(),
            cause: cause.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(form_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            form_id: form_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Connectivity failures stop the whole run; everything else is per form.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::new(12, "unexpected tag 'x'");
        assert_eq!(err.to_string(), "unexpected tag 'x' (at byte 12)");
    }

    #[test]
    fn test_connectivity_is_flagged() {
        let err = MigrateError::connectivity("legacy database", "connection refused");
        assert!(err.is_connectivity());
        assert_eq!(
            err.to_string(),
            "Could not reach the legacy database: connection refused"
        );

        let err = MigrateError::validation("webform_1", "title cannot be empty");
        assert!(!err.is_connectivity());

        let err = MigrateError::invalid_data("submissions of form 3", "invalid utf-8");
        assert!(!err.is_connectivity());
    }

    #[test]
    fn test_decode_error_keeps_the_cause() {
        let err = MigrateError::Decode {
            form_id: 4,
            cid: 2,
            form_key: "topic".into(),
            cause: DecodeError::new(17, "unexpected end of payload"),
        };
        assert_eq!(
            err.to_string(),
            "Could not decode extra payload of field 2 (topic) on form 4: unexpected end of payload (at byte 17)"
        );
    }
}
