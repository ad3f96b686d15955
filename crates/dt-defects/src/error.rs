//! ---
//! dt_section: "02-defect-domain"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Error types for defect validation and the defect service."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use dt_security::{ActorId, Operation};
use serde::Serialize;
use strum::Display;
use thiserror::Error;

use crate::defect::DefectId;
use crate::vocab::VocabularyField;

/// Mandatory free-text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TextField {
    Name,
    Description,
    CommentBody,
}

/// A submitted value failed its field constraint. Nothing was applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Value is not a member of the field's vocabulary.
    #[error("invalid {field} value '{value}'")]
    InvalidToken {
        field: VocabularyField,
        value: String,
    },
    /// Vocabulary field was submitted with no value.
    #[error("{field} requires a value")]
    MissingValue { field: VocabularyField },
    /// Mandatory text field is empty or whitespace.
    #[error("{field} must not be empty")]
    EmptyField { field: TextField },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field_name(&self) -> String {
        match self {
            ValidationError::InvalidToken { field, .. } => field.to_string(),
            ValidationError::MissingValue { field } => field.to_string(),
            ValidationError::EmptyField { field } => field.to_string(),
        }
    }
}

/// Non-empty check shared by creation, update, and comments.
pub(crate) fn require_text(field: TextField, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

/// Failure reported by a [`crate::store::DefectStore`] backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("defect store error: {0}")]
pub struct StoreError(pub String);

/// Errors returned by [`crate::service::DefectService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The actor does not hold the role the operation requires.
    #[error("actor '{actor}' is not permitted to {operation}")]
    Unauthorized {
        actor: ActorId,
        operation: Operation,
    },
    /// Referenced defect does not exist.
    #[error("defect not found: {0}")]
    NotFound(DefectId),
    /// Submitted values failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Persistence backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_field_and_value() {
        let err = ValidationError::InvalidToken {
            field: VocabularyField::Status,
            value: "closed".into(),
        };
        assert_eq!(err.to_string(), "invalid status value 'closed'");
        assert_eq!(err.field_name(), "status");

        let err = ValidationError::EmptyField {
            field: TextField::CommentBody,
        };
        assert_eq!(err.to_string(), "comment_body must not be empty");
    }

    #[test]
    fn whitespace_counts_as_empty() {
        assert!(require_text(TextField::Name, "  \t").is_err());
        assert!(require_text(TextField::Name, " crash ").is_ok());
    }

    #[test]
    fn unauthorized_message_uses_operation_name() {
        let err = ServiceError::Unauthorized {
            actor: "u-dev".into(),
            operation: Operation::DeleteDefect,
        };
        assert_eq!(err.to_string(), "actor 'u-dev' is not permitted to delete_defect");
    }
}
