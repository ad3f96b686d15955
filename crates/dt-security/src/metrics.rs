//! ---
//! dt_section: "06-security-access-control"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Role hierarchy, access policy, and actor identity."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

use crate::rbac::Operation;

/// Access-control metrics exported via Prometheus.
#[derive(Clone)]
pub struct AccessMetrics {
    registry: Arc<Registry>,
    permission_checks_total: IntCounterVec,
    permission_denials_total: IntCounterVec,
    validation_failures_total: IntCounter,
}

impl AccessMetrics {
    /// Register metrics with the provided registry.
    pub fn new(registry: Arc<Registry>) -> anyhow::Result<Self> {
        let permission_checks_total = IntCounterVec::new(
            Opts::new("permission_checks_total", "Total permission checks"),
            &["operation"],
        )?;
        let permission_denials_total = IntCounterVec::new(
            Opts::new(
                "permission_denials_total",
                "Operations refused by the access policy",
            ),
            &["operation"],
        )?;
        let validation_failures_total = IntCounter::new(
            "validation_failures_total",
            "Defect writes rejected by vocabulary or field validation",
        )?;

        registry.register(Box::new(permission_checks_total.clone()))?;
        registry.register(Box::new(permission_denials_total.clone()))?;
        registry.register(Box::new(validation_failures_total.clone()))?;

        Ok(Self {
            registry,
            permission_checks_total,
            permission_denials_total,
            validation_failures_total,
        })
    }

    /// Access the underlying registry.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Count a permission check and, when refused, a denial.
    pub fn record_check(&self, operation: Operation, allowed: bool) {
        let label = [operation.as_str()];
        self.permission_checks_total.with_label_values(&label).inc();
        if !allowed {
            self.permission_denials_total.with_label_values(&label).inc();
        }
    }

    /// Increment validation failures.
    pub fn inc_validation_failure(&self) {
        self.validation_failures_total.inc();
    }

    /// Current denial count for one operation.
    pub fn denials(&self, operation: Operation) -> u64 {
        self.permission_denials_total
            .with_label_values(&[operation.as_str()])
            .get()
    }

    /// Current validation failure count.
    pub fn validation_failures(&self) -> u64 {
        self.validation_failures_total.get()
    }
}
