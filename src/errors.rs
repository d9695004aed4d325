//! Unified error type for the portal.
//!
//! Every service function returns [`Result`]; the web layer maps each variant
//! to an HTTP status in `web::error`.

use std::collections::BTreeMap;
use thiserror::Error;

/// Field name -> human readable message, as produced by form validation.
pub type FieldErrors = BTreeMap<String, String>;

/// Errors produced by configuration, storage, and business logic.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Input failed validation; `fields` carries one message per offending field
    #[error("Validation failed: {}", summarize(.fields))]
    Validation {
        /// Per-field messages
        fields: FieldErrors,
    },

    /// A row addressed by id or key does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity name (e.g. "news")
        entity: &'static str,
        /// The id or key that was looked up
        key: String,
    },

    /// Missing, expired, or invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Reason shown to the client
        message: String,
    },

    /// The signed-in admin lacks the permission for this action
    #[error("Forbidden: role '{role}' may not {action}")]
    Forbidden {
        /// Role of the caller
        role: String,
        /// Attempted action
        action: String,
    },

    /// A uniqueness constraint would be violated
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// Registration attempted while no admission window is open
    #[error("Admission registration is closed: {message}")]
    RegistrationClosed {
        /// Why registration is closed
        message: String,
    },

    /// Object storage failure
    #[error("Storage error: {message}")]
    Storage {
        /// What went wrong
        message: String,
    },

    /// Password hashing or verification could not run
    #[error("Password hashing failed: {message}")]
    PasswordHash {
        /// What went wrong
        message: String,
    },

    /// Database error from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds a [`Error::Validation`] with a single field message.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(name.to_string(), message.into());
        Self::Validation { fields }
    }

    /// Builds a [`Error::NotFound`] for a numeric id.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound {
            entity,
            key: id.to_string(),
        }
    }
}

fn summarize(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(name, message)| format!("{name}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
