//! ---
//! dt_section: "05-networking-external-interfaces"
//! dt_subsection: "binary"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Control CLI for administrators of the defect tracker."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use dt_common::config::AppConfig;
use dt_defects::{
    apply_partial_update, Defect, DefectChanges, DefectFilter, DefectService, DefectSummary,
    FilterQuery, InMemoryDefectStore,
};
use dt_logging::{log_system_event, LogContext, SystemEventOutcome};
use dt_security::{AccessPolicy, ActorDirectory, AuditLog};
use serde::de::DeserializeOwned;

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Existing defect record (JSON).
    #[arg(long, value_name = "FILE")]
    record: PathBuf,
    /// Change set to apply (JSON object with any subset of the editable fields).
    #[arg(long, value_name = "FILE")]
    changes: PathBuf,
    /// JSON array of actors used to authorise the update.
    #[arg(long, value_name = "FILE", requires = "actor")]
    actors: Option<PathBuf>,
    /// Actor performing the update; requires --actors.
    #[arg(long, value_name = "ID", requires = "actors")]
    actor: Option<String>,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// JSON array of defect records.
    #[arg(long, value_name = "FILE")]
    records: PathBuf,
    #[arg(long)]
    project: Option<String>,
    #[arg(long = "type", value_name = "TYPE")]
    defect_type: Option<String>,
    #[arg(long)]
    severity: Option<String>,
    #[arg(long)]
    priority: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    assignee: Option<String>,
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("unable to read {what} file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {what} file {}", path.display()))
}

/// Merge a change set onto a record and print the result.
///
/// Without an actor the change set is only validated and merged; with one the
/// update runs through the access-checked service.
pub fn run_update(args: UpdateArgs, config: &AppConfig) -> Result<()> {
    let record: Defect = read_json(&args.record, "defect record")?;
    let changes: DefectChanges = read_json(&args.changes, "change set")?;

    let updated = match (&args.actors, &args.actor) {
        (Some(actors), Some(actor)) => {
            let policy = AccessPolicy::from_config(&config.access)
                .context("invalid access configuration")?;
            let directory = ActorDirectory::load_json(actors)?;
            let mut service = DefectService::new(
                policy,
                InMemoryDefectStore::with_defects([record.clone()]),
                directory,
            );
            if config.audit.enabled {
                service = service.with_audit(Arc::new(AuditLog::open(&config.audit.path)?));
            }
            service.update_defect(actor, &record.id, &changes)?
        }
        _ => {
            let ctx = LogContext::new()
                .with_project(&record.project_id)
                .with_defect(&record.id)
                .with_operation("update_defect");
            match apply_partial_update(&record, &changes) {
                Ok(updated) => updated,
                Err(err) => {
                    log_system_event(
                        Some(&ctx),
                        "defect.update",
                        &err.to_string(),
                        SystemEventOutcome::Rejected,
                    );
                    return Err(err.into());
                }
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&updated)?);
    Ok(())
}

/// Print status and severity counts for the records matching the filters.
pub fn run_summary(args: SummaryArgs) -> Result<()> {
    let records: Vec<Defect> = read_json(&args.records, "defect records")?;
    let query = FilterQuery {
        project_id: args.project,
        defect_type: args.defect_type,
        severity: args.severity,
        priority: args.priority,
        status: args.status,
        assigned_to: args.assignee,
    };
    let filter = DefectFilter::parse(&query)?;
    let summary = DefectSummary::from_defects(records.iter().filter(|d| filter.matches(d)));
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
