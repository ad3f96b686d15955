//! ---
//! dt_section: "02-defect-domain"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Authorising defect service over a pluggable store."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
//! Every operation runs the same pipeline: authorization check, then
//! validation, then the store write. A refusal or a validation failure
//! returns before anything reaches the store.
use std::sync::Arc;

use chrono::Utc;
use dt_logging::{dt_debug, dt_error, dt_info, log_system_event, LogContext, SystemEventOutcome};
use dt_security::{AccessMetrics, AccessPolicy, AuditAction, AuditLog, Operation, RoleResolver};

use crate::comment::Comment;
use crate::defect::{Defect, DefectDraft};
use crate::error::{ServiceError, ValidationError};
use crate::query::{DefectFilter, DefectSummary};
use crate::store::DefectStore;
use crate::update::DefectChanges;

/// Result alias for service calls.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Defect operations gated by an [`AccessPolicy`].
pub struct DefectService<S, R> {
    policy: AccessPolicy,
    store: S,
    resolver: R,
    metrics: Option<AccessMetrics>,
    audit: Option<Arc<AuditLog>>,
}

impl<S, R> DefectService<S, R>
where
    S: DefectStore,
    R: RoleResolver,
{
    pub fn new(policy: AccessPolicy, store: S, resolver: R) -> Self {
        Self {
            policy,
            store,
            resolver,
            metrics: None,
            audit: None,
        }
    }

    /// Count permission checks and validation failures.
    pub fn with_metrics(mut self, metrics: AccessMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Record mutations and refusals in an audit log.
    pub fn with_audit(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Report a new defect in `project_id` on behalf of `actor`.
    pub fn create_defect(
        &self,
        actor: &str,
        project_id: &str,
        draft: &DefectDraft,
    ) -> Result<Defect> {
        let ctx = LogContext::new()
            .with_actor(actor)
            .with_project(project_id)
            .with_operation(Operation::CreateDefect.as_str());
        self.authorize(&ctx, actor, Operation::CreateDefect, project_id)?;

        let id = uuid::Uuid::new_v4().to_string();
        let defect = Defect::create(id, project_id, actor, draft, Utc::now())
            .map_err(|err| self.rejected(&ctx, err))?;
        self.store.put(defect.clone())?;

        self.record(
            actor,
            AuditAction::DefectCreated,
            &defect.id,
            serde_json::json!({
                "project_id": defect.project_id,
                "type": defect.defect_type,
                "severity": defect.severity,
                "priority": defect.priority,
                "status": defect.status,
            }),
        );
        let ctx = ctx.with_defect(&defect.id);
        log_system_event(
            Some(&ctx),
            "defect.create",
            "defect reported",
            SystemEventOutcome::Success,
        );
        Ok(defect)
    }

    /// Fetch one defect.
    pub fn get_defect(&self, actor: &str, defect_id: &str) -> Result<Defect> {
        let ctx = LogContext::new()
            .with_actor(actor)
            .with_defect(defect_id)
            .with_operation(Operation::ViewDefects.as_str());
        self.authorize(&ctx, actor, Operation::ViewDefects, defect_id)?;
        self.existing(defect_id)
    }

    /// Apply a partial update. An empty change set is a no-op that returns
    /// the stored record unchanged.
    pub fn update_defect(
        &self,
        actor: &str,
        defect_id: &str,
        changes: &DefectChanges,
    ) -> Result<Defect> {
        let ctx = LogContext::new()
            .with_actor(actor)
            .with_defect(defect_id)
            .with_operation(Operation::UpdateDefect.as_str());
        self.authorize(&ctx, actor, Operation::UpdateDefect, defect_id)?;

        let existing = self.existing(defect_id)?;
        let validated = changes
            .validate()
            .map_err(|err| self.rejected(&ctx, err))?;
        if validated.is_empty() {
            dt_debug!(context = ctx, "empty change set, nothing to apply");
            return Ok(existing);
        }

        // Merge against the record as stored at write time, not the copy read
        // above, so concurrent updates to other fields are kept.
        let merged = self
            .store
            .update(defect_id, &mut |current| {
                let mut merged = validated.apply_to(current);
                merged.updated_at = Utc::now();
                merged
            })?
            .ok_or_else(|| ServiceError::NotFound(defect_id.to_owned()))?;

        let fields = validated.changed_fields();
        self.record(
            actor,
            AuditAction::DefectUpdated,
            defect_id,
            serde_json::json!({ "fields": fields, "changes": changes }),
        );
        dt_info!(context = ctx, "defect updated ({})", fields.join(", "));
        Ok(merged)
    }

    /// Remove a defect together with its comments.
    pub fn delete_defect(&self, actor: &str, defect_id: &str) -> Result<Defect> {
        let ctx = LogContext::new()
            .with_actor(actor)
            .with_defect(defect_id)
            .with_operation(Operation::DeleteDefect.as_str());
        self.authorize(&ctx, actor, Operation::DeleteDefect, defect_id)?;

        let removed = self
            .store
            .remove(defect_id)?
            .ok_or_else(|| ServiceError::NotFound(defect_id.to_owned()))?;
        self.record(
            actor,
            AuditAction::DefectDeleted,
            defect_id,
            serde_json::json!({ "name": removed.name }),
        );
        log_system_event(
            Some(&ctx),
            "defect.delete",
            "defect removed",
            SystemEventOutcome::Success,
        );
        Ok(removed)
    }

    pub fn add_comment(&self, actor: &str, defect_id: &str, body: &str) -> Result<Comment> {
        let ctx = LogContext::new()
            .with_actor(actor)
            .with_defect(defect_id)
            .with_operation(Operation::CommentOnDefect.as_str());
        self.authorize(&ctx, actor, Operation::CommentOnDefect, defect_id)?;

        self.existing(defect_id)?;
        let comment = Comment::new(defect_id, actor, body, Utc::now())
            .map_err(|err| self.rejected(&ctx, err))?;
        if !self.store.add_comment(comment.clone())? {
            return Err(ServiceError::NotFound(defect_id.to_owned()));
        }
        self.record(
            actor,
            AuditAction::CommentAdded,
            defect_id,
            serde_json::json!({ "comment_id": comment.id }),
        );
        Ok(comment)
    }

    pub fn comments(&self, actor: &str, defect_id: &str) -> Result<Vec<Comment>> {
        let ctx = LogContext::new()
            .with_actor(actor)
            .with_defect(defect_id)
            .with_operation(Operation::ViewDefects.as_str());
        self.authorize(&ctx, actor, Operation::ViewDefects, defect_id)?;
        self.existing(defect_id)?;
        Ok(self.store.comments(defect_id)?)
    }

    pub fn list_defects(&self, actor: &str, filter: &DefectFilter) -> Result<Vec<Defect>> {
        let ctx = LogContext::new()
            .with_actor(actor)
            .with_operation(Operation::ViewDefects.as_str());
        self.authorize(&ctx, actor, Operation::ViewDefects, "*")?;
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|defect| filter.matches(defect))
            .collect())
    }

    /// Status and severity counts for the defects matching `filter`.
    pub fn summarize(&self, actor: &str, filter: &DefectFilter) -> Result<DefectSummary> {
        let defects = self.list_defects(actor, filter)?;
        Ok(DefectSummary::from_defects(&defects))
    }

    fn authorize(
        &self,
        ctx: &LogContext,
        actor: &str,
        operation: Operation,
        target: &str,
    ) -> Result<()> {
        let allowed = self.policy.permits(&self.resolver, actor, operation);
        if let Some(metrics) = &self.metrics {
            metrics.record_check(operation, allowed);
        }
        if allowed {
            return Ok(());
        }

        let required = self.policy.required_role(operation);
        log_system_event(
            Some(ctx),
            "access.denied",
            &format!("operation requires role {required}"),
            SystemEventOutcome::Rejected,
        );
        self.record(
            actor,
            AuditAction::AccessDenied,
            target,
            serde_json::json!({ "operation": operation, "required": required }),
        );
        Err(ServiceError::Unauthorized {
            actor: actor.to_owned(),
            operation,
        })
    }

    fn existing(&self, defect_id: &str) -> Result<Defect> {
        self.store
            .get(defect_id)?
            .ok_or_else(|| ServiceError::NotFound(defect_id.to_owned()))
    }

    fn rejected(&self, ctx: &LogContext, err: ValidationError) -> ServiceError {
        if let Some(metrics) = &self.metrics {
            metrics.inc_validation_failure();
        }
        log_system_event(
            Some(ctx),
            "defect.validation",
            &err.to_string(),
            SystemEventOutcome::Rejected,
        );
        err.into()
    }

    fn record(&self, actor: &str, action: AuditAction, target: &str, metadata: serde_json::Value) {
        if let Some(audit) = &self.audit {
            if let Err(err) = audit.append(actor, action, target, metadata) {
                dt_error!(
                    context = LogContext::new().with_actor(actor),
                    "unable to append audit entry to {}: {:#}",
                    audit.path().display(),
                    err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use dt_security::{Actor, ActorDirectory, Role};
    use prometheus::Registry;
    use tempfile::tempdir;

    use super::*;
    use crate::store::InMemoryDefectStore;
    use crate::vocab::{Severity, Status};

    fn service() -> DefectService<InMemoryDefectStore, ActorDirectory> {
        let directory = ActorDirectory::from_actors([
            Actor::new("u-dev", "Dana").with_role(Role::Developer),
            Actor::new("u-qa", "Quinn").with_role(Role::Tester),
            Actor::new("u-lead", "Morgan").with_role(Role::Manager),
            Actor::new("u-guest", "Guest"),
        ]);
        DefectService::new(
            AccessPolicy::standard(),
            InMemoryDefectStore::new(),
            directory,
        )
    }

    fn draft() -> DefectDraft {
        DefectDraft::new(
            "Crash on save",
            "Saving a draft with emoji crashes",
            "functional",
            "critical",
            "high",
        )
    }

    #[test]
    fn testers_report_and_developers_update() {
        let service = service();
        let defect = service.create_defect("u-qa", "p-1", &draft()).unwrap();
        assert_eq!(defect.reported_by, "u-qa");
        assert_eq!(defect.status, Status::Open);

        let changes = DefectChanges::builder()
            .status("in progress")
            .assign_to("u-dev")
            .build();
        let updated = service.update_defect("u-dev", &defect.id, &changes).unwrap();
        assert_eq!(updated.status, Status::InProgress);
        assert_eq!(updated.assigned_to.as_deref(), Some("u-dev"));
        assert!(updated.updated_at >= defect.updated_at);
        assert_eq!(service.get_defect("u-dev", &defect.id).unwrap(), updated);
    }

    #[test]
    fn developers_cannot_report() {
        let service = service();
        let err = service.create_defect("u-dev", "p-1", &draft()).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Unauthorized {
                operation: Operation::CreateDefect,
                ..
            }
        ));
        assert!(service.store().list().unwrap().is_empty());
    }

    #[test]
    fn actors_without_role_see_nothing() {
        let service = service();
        service.create_defect("u-qa", "p-1", &draft()).unwrap();
        for actor in ["u-guest", "u-missing"] {
            assert!(matches!(
                service.list_defects(actor, &DefectFilter::all()),
                Err(ServiceError::Unauthorized { .. })
            ));
        }
    }

    #[test]
    fn rejected_update_leaves_store_untouched() {
        let service = service();
        let defect = service.create_defect("u-qa", "p-1", &draft()).unwrap();
        let changes = DefectChanges::builder()
            .severity("blocker")
            .priority("urgent")
            .build();
        let err = service
            .update_defect("u-dev", &defect.id, &changes)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.store().get(&defect.id).unwrap().unwrap(), defect);
    }

    #[test]
    fn authorization_precedes_validation() {
        let service = service();
        let defect = service.create_defect("u-qa", "p-1", &draft()).unwrap();
        let changes = DefectChanges::builder().status("bogus").build();
        assert!(matches!(
            service.update_defect("u-guest", &defect.id, &changes),
            Err(ServiceError::Unauthorized { .. })
        ));
    }

    #[test]
    fn empty_change_set_does_not_touch_timestamps() {
        let service = service();
        let defect = service.create_defect("u-qa", "p-1", &draft()).unwrap();
        let same = service
            .update_defect("u-dev", &defect.id, &DefectChanges::default())
            .unwrap();
        assert_eq!(same, defect);
    }

    #[test]
    fn missing_defects_are_reported() {
        let service = service();
        assert!(matches!(
            service.update_defect("u-dev", "d-404", &DefectChanges::default()),
            Err(ServiceError::NotFound(id)) if id == "d-404"
        ));
        assert!(matches!(
            service.add_comment("u-dev", "d-404", "hello"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn only_managers_delete() {
        let service = service();
        let defect = service.create_defect("u-qa", "p-1", &draft()).unwrap();
        service.add_comment("u-dev", &defect.id, "on it").unwrap();
        assert!(service.delete_defect("u-qa", &defect.id).is_err());
        let removed = service.delete_defect("u-lead", &defect.id).unwrap();
        assert_eq!(removed.id, defect.id);
        assert!(matches!(
            service.comments("u-lead", &defect.id),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn summary_counts_visible_defects() {
        let service = service();
        let first = service.create_defect("u-qa", "p-1", &draft()).unwrap();
        service.create_defect("u-qa", "p-2", &draft()).unwrap();
        service
            .update_defect(
                "u-dev",
                &first.id,
                &DefectChanges::builder().status("fixed").build(),
            )
            .unwrap();

        let summary = service.summarize("u-dev", &DefectFilter::all()).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_status[&Status::Fixed], 1);
        assert_eq!(summary.by_status[&Status::Open], 1);
        assert_eq!(summary.by_severity[&Severity::Critical], 2);

        let p2 = service
            .summarize("u-dev", &DefectFilter::all().with_project("p-2"))
            .unwrap();
        assert_eq!(p2.total, 1);
    }

    #[test]
    fn metrics_and_audit_follow_outcomes() {
        let dir = tempdir().unwrap();
        let audit = Arc::new(AuditLog::open(dir.path().join("audit.log")).unwrap());
        let registry = Arc::new(Registry::new());
        let metrics = AccessMetrics::new(registry).unwrap();
        let service = service()
            .with_metrics(metrics.clone())
            .with_audit(audit.clone());

        let defect = service.create_defect("u-qa", "p-1", &draft()).unwrap();
        let _ = service.create_defect("u-dev", "p-1", &draft());
        let _ = service.update_defect(
            "u-dev",
            &defect.id,
            &DefectChanges::builder().status("Closed").build(),
        );
        service
            .update_defect(
                "u-dev",
                &defect.id,
                &DefectChanges::builder().status("fixed").build(),
            )
            .unwrap();

        assert_eq!(metrics.denials(Operation::CreateDefect), 1);
        assert_eq!(metrics.validation_failures(), 1);

        let actions: Vec<_> = audit
            .entries()
            .unwrap()
            .into_iter()
            .map(|entry| entry.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::DefectCreated,
                AuditAction::AccessDenied,
                AuditAction::DefectUpdated
            ]
        );
        assert!(audit.verify().unwrap());
    }
}
