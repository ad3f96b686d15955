//! ---
//! dt_section: "02-defect-domain"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Defect record and creation path."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use dt_security::ActorId;
use serde::{Deserialize, Serialize};

use crate::error::{require_text, TextField, ValidationError};
use crate::vocab::{DefectType, Priority, Severity, Status, Vocabulary};

/// Identifier for a defect.
pub type DefectId = String;

/// Identifier for a project.
pub type ProjectId = String;

/// Stored defect record. Classification fields are always vocabulary members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defect {
    pub id: DefectId,
    pub project_id: ProjectId,
    pub name: String,
    pub description: String,
    /// Storage identifier of an attached screenshot.
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(rename = "type")]
    pub defect_type: DefectType,
    pub severity: Severity,
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub assigned_to: Option<ActorId>,
    pub reported_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submitted fields for a new defect, as raw tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefectDraft {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(rename = "type")]
    pub defect_type: String,
    pub severity: String,
    pub priority: String,
    /// Defaults to `open` when omitted.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<ActorId>,
}

impl DefectDraft {
    /// Draft with the mandatory fields set.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        defect_type: impl Into<String>,
        severity: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            defect_type: defect_type.into(),
            severity: severity.into(),
            priority: priority.into(),
            ..Self::default()
        }
    }
}

impl Defect {
    /// Validate `draft` as a whole and build the record. Either every field is
    /// valid and a record is returned, or nothing is produced.
    pub fn create(
        id: impl Into<DefectId>,
        project_id: impl Into<ProjectId>,
        reported_by: impl Into<ActorId>,
        draft: &DefectDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        require_text(TextField::Name, &draft.name)?;
        require_text(TextField::Description, &draft.description)?;
        let defect_type = DefectType::parse_token(&draft.defect_type)?;
        let severity = Severity::parse_token(&draft.severity)?;
        let priority = Priority::parse_token(&draft.priority)?;
        let status = match draft.status.as_deref() {
            Some(token) => Status::parse_token(token)?,
            None => Status::default(),
        };

        Ok(Self {
            id: id.into(),
            project_id: project_id.into(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            screenshot: draft.screenshot.clone(),
            defect_type,
            severity,
            priority,
            status,
            assigned_to: draft.assigned_to.clone(),
            reported_by: reported_by.into(),
            created_at: now,
            updated_at: now,
        })
    }
}
