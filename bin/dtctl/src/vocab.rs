//! ---
//! dt_section: "05-networking-external-interfaces"
//! dt_subsection: "binary"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Control CLI for administrators of the defect tracker."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use dt_defects::{validate_enum_member, VocabularyField};
use dt_logging::{log_system_event, LogContext, SystemEventOutcome};
use dt_security::Role;
use indexmap::IndexMap;
use strum::IntoEnumIterator;

#[derive(Debug, Args)]
pub struct VocabArgs {
    /// Print only this vocabulary, one token per line.
    #[arg(long, value_enum)]
    field: Option<FieldArg>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Vocabulary to check against.
    #[arg(long, value_enum)]
    field: FieldArg,
    /// Token to check; matching is exact and case-sensitive.
    #[arg(long)]
    value: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FieldArg {
    Type,
    Severity,
    Priority,
    Status,
    Role,
}

impl FieldArg {
    fn name(self) -> &'static str {
        match self {
            FieldArg::Type => "type",
            FieldArg::Severity => "severity",
            FieldArg::Priority => "priority",
            FieldArg::Status => "status",
            FieldArg::Role => "role",
        }
    }

    fn vocabulary(self) -> Option<VocabularyField> {
        match self {
            FieldArg::Type => Some(VocabularyField::Type),
            FieldArg::Severity => Some(VocabularyField::Severity),
            FieldArg::Priority => Some(VocabularyField::Priority),
            FieldArg::Status => Some(VocabularyField::Status),
            FieldArg::Role => None,
        }
    }

    fn tokens(self) -> Vec<&'static str> {
        match self.vocabulary() {
            Some(field) => field.tokens(),
            None => Role::iter().map(Role::as_str).collect(),
        }
    }

    fn accepts(self, value: &str) -> bool {
        match self.vocabulary() {
            Some(field) => validate_enum_member(field, value),
            None => Role::from_token(value).is_some(),
        }
    }
}

pub fn run_vocab(args: VocabArgs) -> Result<()> {
    match args.field {
        Some(field) => {
            for token in field.tokens() {
                println!("{token}");
            }
        }
        None => {
            let all: IndexMap<&str, Vec<&str>> = FieldArg::value_variants()
                .iter()
                .map(|field| (field.name(), field.tokens()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
    }
    Ok(())
}

pub fn run_validate(args: ValidateArgs) -> Result<()> {
    if args.field.accepts(&args.value) {
        println!("valid");
        return Ok(());
    }
    println!("invalid");
    log_system_event(
        Some(&LogContext::new().with_operation("validate")),
        "vocabulary.rejected",
        &format!("'{}' is not a valid {}", args.value, args.field.name()),
        SystemEventOutcome::Rejected,
    );
    bail!(
        "'{}' is not a valid {}; expected one of: {}",
        args.value,
        args.field.name(),
        args.field.tokens().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_vocabulary_is_ordered_by_seniority() {
        assert_eq!(FieldArg::Role.tokens(), vec!["developer", "tester", "manager"]);
        assert!(FieldArg::Role.accepts("tester"));
        assert!(!FieldArg::Role.accepts("Tester"));
    }

    #[test]
    fn defect_fields_delegate_to_vocabularies() {
        assert!(FieldArg::Status.accepts("in progress"));
        assert!(!FieldArg::Status.accepts("In Progress"));
        assert!(FieldArg::Type.tokens().contains(&"ui and usability"));
    }
}
