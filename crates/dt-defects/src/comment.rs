//! ---
//! dt_section: "02-defect-domain"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Defect comments."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use dt_security::ActorId;
use serde::{Deserialize, Serialize};

use crate::defect::DefectId;
use crate::error::{require_text, TextField, ValidationError};

/// Comment attached to a defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub defect_id: DefectId,
    pub author: ActorId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Build a comment with a fresh identifier. The body must not be empty.
    pub fn new(
        defect_id: impl Into<DefectId>,
        author: impl Into<ActorId>,
        body: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let body = body.into();
        require_text(TextField::CommentBody, &body)?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            defect_id: defect_id.into(),
            author: author.into(),
            body,
            created_at: now,
        })
    }
}
