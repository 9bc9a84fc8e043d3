//! Application error types.
//!
//! Every failure the service reports maps to one of these variants. They are
//! serializable so the HTTP layer can hand a structured error to clients.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors returned by the service and storage layers.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Database operation failed. Opaque to callers; no automatic retry.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Requested resource (pull request, user, team) is absent.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// A resource with this id already exists.
    #[error("Already exists: {resource} {id}")]
    AlreadyExists { resource: String, id: String },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Operation not permitted in the aggregate's current state.
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Replacement search exhausted the candidate pool.
    #[error("no active replacement candidate in team")]
    NoEligibleCandidate,

    /// The target reviewer does not occupy a slot on the pull request.
    #[error("reviewer {user_id} is not assigned to pull request {pr_id}")]
    ReviewerNotAssigned { pr_id: String, user_id: String },
}

impl AppError {
    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create an already exists error.
    pub fn already_exists(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::database(format!("JSON error: {}", err))
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::database("connection failed");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"Database\""));
        assert!(json.contains("connection failed"));
    }

    #[test]
    fn test_not_found_with_id() {
        let err = AppError::not_found_with_id("PullRequest", "pr-1");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"resource\":\"PullRequest\""));
        assert!(json.contains("\"id\":\"pr-1\""));
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let err = AppError::database("error");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("operation"));
    }

    #[test]
    fn test_display_impl() {
        let err = AppError::invalid_state("cannot modify reviewers of a merged PR");
        assert_eq!(
            format!("{}", err),
            "Invalid state: cannot modify reviewers of a merged PR"
        );
    }

    #[test]
    fn test_reviewer_not_assigned_display() {
        let err = AppError::ReviewerNotAssigned {
            pr_id: "pr-1".into(),
            user_id: "u2".into(),
        };
        assert_eq!(
            format!("{}", err),
            "reviewer u2 is not assigned to pull request pr-1"
        );
    }
}
