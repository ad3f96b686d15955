//! ---
//! dt_section: "02-defect-domain"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Defect domain model, validation, and service."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
//! Defect classification vocabularies, record creation, partial updates with
//! all-or-nothing validation, list filters and summaries, and a service that
//! gates every operation behind the access policy.

pub mod comment;
pub mod defect;
pub mod error;
pub mod query;
pub mod service;
pub mod store;
pub mod update;
pub mod vocab;

pub use comment::Comment;
pub use defect::{Defect, DefectDraft, DefectId, ProjectId};
pub use error::{ServiceError, StoreError, TextField, ValidationError};
pub use query::{DefectFilter, DefectSummary, FilterQuery};
pub use service::DefectService;
pub use store::{DefectStore, InMemoryDefectStore};
pub use update::{apply_partial_update, DefectChanges, DefectChangesBuilder, ValidatedChanges};
pub use vocab::{
    validate_enum_member, DefectType, Priority, Severity, Status, Vocabulary, VocabularyField,
};
