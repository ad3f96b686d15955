//! ---
//! dt_section: "02-defect-domain"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Closed vocabularies for defect classification fields."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
//! Each classification field has its own closed vocabulary. Tokens match
//! exactly: no case folding, trimming, or synonyms. Variant order is display
//! order only; severity and priority are categorical.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::ValidationError;

/// Shared behaviour of the four defect vocabularies.
pub trait Vocabulary:
    Copy + std::str::FromStr + IntoEnumIterator + Into<&'static str> + 'static
{
    /// Field this vocabulary constrains.
    const FIELD: VocabularyField;

    /// Exact token lookup.
    fn from_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }

    /// Literal token of this member.
    fn token(self) -> &'static str {
        self.into()
    }

    /// All tokens in display order.
    fn tokens() -> Vec<&'static str> {
        Self::iter().map(Self::token).collect()
    }

    /// Parse a submitted token, naming the field and value on failure.
    fn parse_token(token: &str) -> Result<Self, ValidationError> {
        Self::from_token(token).ok_or_else(|| ValidationError::InvalidToken {
            field: Self::FIELD,
            value: token.to_owned(),
        })
    }
}

/// Defect classification fields backed by a vocabulary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VocabularyField {
    Type,
    Severity,
    Priority,
    Status,
}

impl VocabularyField {
    /// Whether `value` is exactly one of this field's tokens.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            VocabularyField::Type => DefectType::from_token(value).is_some(),
            VocabularyField::Severity => Severity::from_token(value).is_some(),
            VocabularyField::Priority => Priority::from_token(value).is_some(),
            VocabularyField::Status => Status::from_token(value).is_some(),
        }
    }

    /// Tokens of this field's vocabulary, in display order.
    pub fn tokens(self) -> Vec<&'static str> {
        match self {
            VocabularyField::Type => DefectType::tokens(),
            VocabularyField::Severity => Severity::tokens(),
            VocabularyField::Priority => Priority::tokens(),
            VocabularyField::Status => Status::tokens(),
        }
    }
}

/// True iff `value` is a member of `field`'s vocabulary.
pub fn validate_enum_member(field: VocabularyField, value: &str) -> bool {
    field.accepts(value)
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DefectType {
    Functional,
    #[serde(rename = "ui and usability")]
    #[strum(serialize = "ui and usability")]
    UiAndUsability,
    Content,
    #[serde(rename = "improvement request")]
    #[strum(serialize = "improvement request")]
    ImprovementRequest,
    #[serde(rename = "unit test failure")]
    #[strum(serialize = "unit test failure")]
    UnitTestFailure,
}

impl Vocabulary for DefectType {
    const FIELD: VocabularyField = VocabularyField::Type;
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Minor,
    Medium,
    Major,
    Critical,
    Blocker,
}

impl Vocabulary for Severity {
    const FIELD: VocabularyField = VocabularyField::Severity;
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Vocabulary for Priority {
    const FIELD: VocabularyField = VocabularyField::Priority;
}

/// Defect status. Any member may replace any other; no transition graph is
/// enforced.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    #[default]
    Open,
    #[serde(rename = "in progress")]
    #[strum(serialize = "in progress")]
    InProgress,
    Fixed,
    Verified,
    Reopened,
    Deferred,
    Hold,
}

impl Vocabulary for Status {
    const FIELD: VocabularyField = VocabularyField::Status;
}
