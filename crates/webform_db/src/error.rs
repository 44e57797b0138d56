//! Error types for the database layer.

use miette::Diagnostic;
use thiserror::Error;
use webform_core::MigrateError;

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Database error types.
#[derive(Debug, Error, Diagnostic)]
pub enum DbError {
    /// SQLite/sqlx error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Invalid data
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Create a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Whether the database itself could not be reached, as opposed to a
    /// single statement failing.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Self::Sqlx(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Configuration(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Map a failed legacy read of `what`. Only an unreachable database
    /// stops the run; unreadable rows fail the form being read.
    pub fn into_source_error(self, what: impl Into<String>) -> MigrateError {
        if self.is_connection_failure() {
            MigrateError::connectivity("legacy database", self)
        } else {
            MigrateError::invalid_data(what, self)
        }
    }

    /// Map a failed target write for one entity.
    pub fn into_store_error(self, entity: &'static str, id: impl Into<String>) -> MigrateError {
        if self.is_connection_failure() {
            MigrateError::connectivity("target database", self)
        } else {
            MigrateError::persistence(entity, id, self)
        }
    }
}
