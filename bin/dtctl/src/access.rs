//! ---
//! dt_section: "05-networking-external-interfaces"
//! dt_subsection: "binary"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Control CLI for administrators of the defect tracker."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args, ValueEnum};
use dt_common::config::AppConfig;
use dt_logging::{log_system_event, LogContext, SystemEventOutcome};
use dt_security::{AccessPolicy, ActorDirectory, Operation, Role};

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("requirement").required(true).args(["require", "operation"])))]
pub struct CheckArgs {
    /// JSON array of actors (`id`, `display_name`, `role`).
    #[arg(long, value_name = "FILE")]
    actors: PathBuf,
    /// Actor to check.
    #[arg(long, value_name = "ID")]
    actor: String,
    /// Minimum role the actor must hold.
    #[arg(long, value_enum)]
    require: Option<RoleArg>,
    /// Check against the configured requirement of an operation instead.
    #[arg(long, value_enum)]
    operation: Option<OperationArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Developer,
    Tester,
    Manager,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Developer => Role::Developer,
            RoleArg::Tester => Role::Tester,
            RoleArg::Manager => Role::Manager,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OperationArg {
    ViewDefects,
    CommentOnDefect,
    UpdateDefect,
    CreateDefect,
    DeleteDefect,
    ManageActors,
}

impl From<OperationArg> for Operation {
    fn from(value: OperationArg) -> Self {
        match value {
            OperationArg::ViewDefects => Operation::ViewDefects,
            OperationArg::CommentOnDefect => Operation::CommentOnDefect,
            OperationArg::UpdateDefect => Operation::UpdateDefect,
            OperationArg::CreateDefect => Operation::CreateDefect,
            OperationArg::DeleteDefect => Operation::DeleteDefect,
            OperationArg::ManageActors => Operation::ManageActors,
        }
    }
}

/// Print `allowed` or `denied` for the actor against the requested role.
pub fn run(args: CheckArgs, config: &AppConfig) -> Result<()> {
    let policy =
        AccessPolicy::from_config(&config.access).context("invalid access configuration")?;
    let directory = ActorDirectory::load_json(&args.actors)?;

    let (required, operation) = match (args.require, args.operation) {
        (Some(role), _) => (Role::from(role), None),
        (None, Some(op)) => {
            let op = Operation::from(op);
            (policy.required_role(op), Some(op))
        }
        (None, None) => bail!("either --require or --operation must be given"),
    };

    let allowed = policy
        .hierarchy()
        .has_permission(&directory, &args.actor, required);

    let mut ctx = LogContext::new().with_actor(&args.actor);
    if let Some(op) = operation {
        ctx = ctx.with_operation(op.as_str());
    }
    log_system_event(
        Some(&ctx),
        "access.check",
        &format!("requires {required}"),
        if allowed {
            SystemEventOutcome::Success
        } else {
            SystemEventOutcome::Rejected
        },
    );

    println!("{}", if allowed { "allowed" } else { "denied" });
    Ok(())
}
