//! ---
//! dt_section: "02-defect-domain"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Sparse defect change sets and the partial-update merge."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
//! A [`DefectChanges`] is what a caller submits: raw tokens, every field
//! optional. It is validated as a whole into [`ValidatedChanges`] and only then
//! merged onto the existing record in one step, so a single bad field means
//! nothing changes.
use dt_security::ActorId;
use serde::{Deserialize, Serialize};

use crate::defect::Defect;
use crate::error::{require_text, TextField, ValidationError};
use crate::vocab::{DefectType, Priority, Severity, Status, Vocabulary};

/// Submitted change set. Absent fields are no-ops.
///
/// Every field distinguishes "absent" from an explicit `null`. A `null`
/// clears `screenshot` and `assigned_to`; on any other field it is a missing
/// value and fails validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefectChanges {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub name: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub screenshot: Option<Option<String>>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub defect_type: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub severity: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub priority: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub status: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub assigned_to: Option<Option<ActorId>>,
}

impl DefectChanges {
    /// Start building a change set.
    pub fn builder() -> DefectChangesBuilder {
        DefectChangesBuilder::default()
    }

    /// Whether no field is present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate every present field. The first failure, in field order, is
    /// returned and the whole change set is rejected.
    pub fn validate(&self) -> Result<ValidatedChanges, ValidationError> {
        Ok(ValidatedChanges {
            name: present_text(TextField::Name, &self.name)?,
            description: present_text(TextField::Description, &self.description)?,
            screenshot: self.screenshot.clone(),
            defect_type: present_token::<DefectType>(&self.defect_type)?,
            severity: present_token::<Severity>(&self.severity)?,
            priority: present_token::<Priority>(&self.priority)?,
            status: present_token::<Status>(&self.status)?,
            assigned_to: self.assigned_to.clone(),
        })
    }
}

fn present_text(
    field: TextField,
    value: &Option<Option<String>>,
) -> Result<Option<String>, ValidationError> {
    match value {
        None => Ok(None),
        Some(None) => Err(ValidationError::EmptyField { field }),
        Some(Some(text)) => {
            require_text(field, text)?;
            Ok(Some(text.clone()))
        }
    }
}

fn present_token<V: Vocabulary>(token: &Option<Option<String>>) -> Result<Option<V>, ValidationError> {
    match token {
        None => Ok(None),
        Some(None) => Err(ValidationError::MissingValue { field: V::FIELD }),
        Some(Some(token)) => V::parse_token(token).map(Some),
    }
}

/// Fluent construction of a [`DefectChanges`].
#[derive(Debug, Clone, Default)]
pub struct DefectChangesBuilder {
    changes: DefectChanges,
}

impl DefectChangesBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.changes.name = Some(Some(name.into()));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.changes.description = Some(Some(description.into()));
        self
    }

    pub fn screenshot(mut self, screenshot: impl Into<String>) -> Self {
        self.changes.screenshot = Some(Some(screenshot.into()));
        self
    }

    pub fn clear_screenshot(mut self) -> Self {
        self.changes.screenshot = Some(None);
        self
    }

    pub fn defect_type(mut self, token: impl Into<String>) -> Self {
        self.changes.defect_type = Some(Some(token.into()));
        self
    }

    pub fn severity(mut self, token: impl Into<String>) -> Self {
        self.changes.severity = Some(Some(token.into()));
        self
    }

    pub fn priority(mut self, token: impl Into<String>) -> Self {
        self.changes.priority = Some(Some(token.into()));
        self
    }

    pub fn status(mut self, token: impl Into<String>) -> Self {
        self.changes.status = Some(Some(token.into()));
        self
    }

    pub fn assign_to(mut self, actor: impl Into<ActorId>) -> Self {
        self.changes.assigned_to = Some(Some(actor.into()));
        self
    }

    pub fn unassign(mut self) -> Self {
        self.changes.assigned_to = Some(None);
        self
    }

    pub fn build(self) -> DefectChanges {
        self.changes
    }
}

/// Change set whose present fields have all passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub screenshot: Option<Option<String>>,
    pub defect_type: Option<DefectType>,
    pub severity: Option<Severity>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub assigned_to: Option<Option<ActorId>>,
}

impl ValidatedChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the present fields, in record order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("description", self.description.is_some()),
            ("screenshot", self.screenshot.is_some()),
            ("type", self.defect_type.is_some()),
            ("severity", self.severity.is_some()),
            ("priority", self.priority.is_some()),
            ("status", self.status.is_some()),
            ("assigned_to", self.assigned_to.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, present)| present.then_some(field))
        .collect()
    }

    /// Overlay present fields onto `existing`. Timestamps are left to the caller.
    pub fn apply_to(&self, existing: &Defect) -> Defect {
        let mut merged = existing.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(screenshot) = &self.screenshot {
            merged.screenshot = screenshot.clone();
        }
        if let Some(defect_type) = self.defect_type {
            merged.defect_type = defect_type;
        }
        if let Some(severity) = self.severity {
            merged.severity = severity;
        }
        if let Some(priority) = self.priority {
            merged.priority = priority;
        }
        if let Some(status) = self.status {
            merged.status = status;
        }
        if let Some(assigned_to) = &self.assigned_to {
            merged.assigned_to = assigned_to.clone();
        }
        merged
    }
}

/// Validate `changes` wholesale and merge them onto `existing`.
///
/// On error `existing` is untouched and the error names the offending field
/// and value. Status accepts any vocabulary member regardless of the current
/// status.
pub fn apply_partial_update(
    existing: &Defect,
    changes: &DefectChanges,
) -> Result<Defect, ValidationError> {
    Ok(changes.validate()?.apply_to(existing))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::defect::DefectDraft;
    use crate::vocab::VocabularyField;

    fn existing() -> Defect {
        let draft = DefectDraft {
            screenshot: Some("blob-17".into()),
            assigned_to: Some("u-dev".into()),
            ..DefectDraft::new(
                "Totals wrong",
                "Invoice totals ignore discounts",
                "functional",
                "medium",
                "low",
            )
        };
        Defect::create("d-1", "p-1", "u-qa", &draft, Utc::now()).unwrap()
    }

    #[test]
    fn empty_change_set_round_trips() {
        let before = existing();
        let after = apply_partial_update(&before, &DefectChanges::default()).unwrap();
        assert_eq!(after, before);
        assert!(DefectChanges::default().is_empty());
    }

    #[test]
    fn invalid_field_aborts_whole_update() {
        let before = existing();
        let snapshot = before.clone();
        let changes = DefectChanges::builder()
            .name("Totals wrong after discount")
            .status("closed")
            .build();
        let err = apply_partial_update(&before, &changes).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidToken {
                field: VocabularyField::Status,
                value: "closed".into()
            }
        );
        assert_eq!(before, snapshot);
    }

    #[test]
    fn omitted_fields_are_carried_forward() {
        let before = existing();
        assert_eq!(before.status, Status::Open);
        let after =
            apply_partial_update(&before, &DefectChanges::builder().severity("blocker").build())
                .unwrap();
        assert_eq!(after.severity, Severity::Blocker);
        assert_eq!(
            Defect {
                severity: before.severity,
                ..after
            },
            before
        );
    }

    #[test]
    fn any_status_may_follow_any_status() {
        let mut current = existing();
        for from in Status::iter() {
            current.status = from;
            for to in Status::iter() {
                let changes = DefectChanges::builder().status(to.token()).build();
                let next = apply_partial_update(&current, &changes).unwrap();
                assert_eq!(next.status, to, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn open_to_verified_is_allowed() {
        let before = existing();
        let after =
            apply_partial_update(&before, &DefectChanges::builder().status("verified").build())
                .unwrap();
        assert_eq!(after.status, Status::Verified);
    }

    #[test]
    fn empty_mandatory_text_is_rejected() {
        let before = existing();
        for changes in [
            DefectChanges::builder().name("").build(),
            DefectChanges::builder().description("   ").severity("minor").build(),
        ] {
            let err = apply_partial_update(&before, &changes).unwrap_err();
            assert!(matches!(err, ValidationError::EmptyField { .. }), "{err}");
        }
    }

    #[test]
    fn explicit_null_clears_optional_fields() {
        let before = existing();
        let changes: DefectChanges =
            serde_json::from_str(r#"{"assigned_to": null, "screenshot": null}"#).unwrap();
        assert_eq!(changes, DefectChanges::builder().unassign().clear_screenshot().build());
        let after = apply_partial_update(&before, &changes).unwrap();
        assert!(after.assigned_to.is_none());
        assert!(after.screenshot.is_none());

        let absent: DefectChanges = serde_json::from_str("{}").unwrap();
        assert!(absent.is_empty());
        assert_eq!(apply_partial_update(&before, &absent).unwrap(), before);
    }

    #[test]
    fn explicit_null_on_required_fields_aborts_update() {
        let before = existing();
        let changes: DefectChanges =
            serde_json::from_str(r#"{"status": null, "severity": "blocker"}"#).unwrap();
        assert!(!changes.is_empty());
        assert_eq!(
            apply_partial_update(&before, &changes).unwrap_err(),
            ValidationError::MissingValue {
                field: VocabularyField::Status
            }
        );

        let changes: DefectChanges = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert!(!changes.is_empty());
        assert_eq!(
            apply_partial_update(&before, &changes).unwrap_err(),
            ValidationError::EmptyField {
                field: TextField::Name
            }
        );

        for json in [
            r#"{"description": null}"#,
            r#"{"type": null}"#,
            r#"{"priority": null, "name": "Renamed"}"#,
        ] {
            let changes: DefectChanges = serde_json::from_str(json).unwrap();
            assert!(apply_partial_update(&before, &changes).is_err(), "{json}");
        }
    }

    #[test]
    fn reassignment_and_type_change() {
        let before = existing();
        let changes: DefectChanges = serde_json::from_str(
            r#"{"assigned_to": "u-other", "type": "unit test failure", "priority": "high"}"#,
        )
        .unwrap();
        let validated = changes.validate().unwrap();
        assert_eq!(validated.changed_fields(), vec!["type", "priority", "assigned_to"]);
        let after = validated.apply_to(&before);
        assert_eq!(after.assigned_to.as_deref(), Some("u-other"));
        assert_eq!(after.defect_type, DefectType::UnitTestFailure);
        assert_eq!(after.priority, Priority::High);
        assert_eq!(after.status, before.status);
    }

    #[test]
    fn serialized_change_set_omits_absent_fields() {
        let changes = DefectChanges::builder().status("hold").unassign().build();
        let value = serde_json::to_value(&changes).unwrap();
        assert_eq!(value, serde_json::json!({"status": "hold", "assigned_to": null}));
    }
}
