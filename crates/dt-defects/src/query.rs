//! ---
//! dt_section: "02-defect-domain"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Defect list filters and chart summaries."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use dt_security::ActorId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::defect::{Defect, ProjectId};
use crate::error::ValidationError;
use crate::vocab::{DefectType, Priority, Severity, Status, Vocabulary};

/// Raw filter tokens as submitted by a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterQuery {
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(rename = "type", default)]
    pub defect_type: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<ActorId>,
}

/// Typed defect filter; unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefectFilter {
    pub project_id: Option<ProjectId>,
    pub defect_type: Option<DefectType>,
    pub severity: Option<Severity>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub assigned_to: Option<ActorId>,
}

impl DefectFilter {
    /// Filter accepting every defect.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse raw tokens with the same vocabularies used for writes.
    pub fn parse(query: &FilterQuery) -> Result<Self, ValidationError> {
        Ok(Self {
            project_id: query.project_id.clone(),
            defect_type: query
                .defect_type
                .as_deref()
                .map(DefectType::parse_token)
                .transpose()?,
            severity: query
                .severity
                .as_deref()
                .map(Severity::parse_token)
                .transpose()?,
            priority: query
                .priority
                .as_deref()
                .map(Priority::parse_token)
                .transpose()?,
            status: query
                .status
                .as_deref()
                .map(Status::parse_token)
                .transpose()?,
            assigned_to: query.assigned_to.clone(),
        })
    }

    pub fn with_project(mut self, project_id: impl Into<ProjectId>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_assignee(mut self, actor: impl Into<ActorId>) -> Self {
        self.assigned_to = Some(actor.into());
        self
    }

    pub fn matches(&self, defect: &Defect) -> bool {
        self.project_id
            .as_ref()
            .map_or(true, |p| *p == defect.project_id)
            && self.defect_type.map_or(true, |t| t == defect.defect_type)
            && self.severity.map_or(true, |s| s == defect.severity)
            && self.priority.map_or(true, |p| p == defect.priority)
            && self.status.map_or(true, |s| s == defect.status)
            && self
                .assigned_to
                .as_ref()
                .map_or(true, |a| defect.assigned_to.as_ref() == Some(a))
    }
}

/// Defect counts per status and per severity, in vocabulary display order.
/// Every vocabulary member has a bucket, including empty ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefectSummary {
    pub total: usize,
    pub by_status: IndexMap<Status, usize>,
    pub by_severity: IndexMap<Severity, usize>,
}

impl Default for DefectSummary {
    fn default() -> Self {
        Self {
            total: 0,
            by_status: Status::iter().map(|s| (s, 0)).collect(),
            by_severity: Severity::iter().map(|s| (s, 0)).collect(),
        }
    }
}

impl DefectSummary {
    pub fn from_defects<'a>(defects: impl IntoIterator<Item = &'a Defect>) -> Self {
        let mut summary = Self::default();
        for defect in defects {
            summary.total += 1;
            *summary.by_status.entry(defect.status).or_default() += 1;
            *summary.by_severity.entry(defect.severity).or_default() += 1;
        }
        summary
    }
}
