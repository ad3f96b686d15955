//! ---
//! dt_section: "03-persistence-logging"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Structured logging adapters and sinks."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
#![warn(missing_docs)]

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

#[doc(hidden)]
pub use tracing as __tracing;

/// Initialize a baseline stderr subscriber suitable for CLI tools and tests.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Actor on whose behalf the operation runs.
    pub actor: Option<&'a str>,
    /// Project the affected defect belongs to.
    pub project: Option<&'a str>,
    /// Defect identifier.
    pub defect: Option<&'a str>,
    /// Tracker operation name (e.g. `update_defect`).
    pub operation: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an actor identifier.
    pub fn with_actor(mut self, actor: &'a str) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attach a project identifier.
    pub fn with_project(mut self, project: &'a str) -> Self {
        self.project = Some(project);
        self
    }

    /// Attach a defect identifier.
    pub fn with_defect(mut self, defect: &'a str) -> Self {
        self.defect = Some(defect);
        self
    }

    /// Attach an operation name.
    pub fn with_operation(mut self, operation: &'a str) -> Self {
        self.operation = Some(operation);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation was refused (authorization or validation).
    Rejected,
    /// The operation failed.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Rejected => "rejected",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized system event with its outcome.
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let default_ctx = LogContext::default();
    let ctx = context.unwrap_or(&default_ctx);
    // `tracing::event!` needs a constant level per call site.
    macro_rules! emit {
        ($level:expr) => {
            tracing::event!(
                $level,
                event,
                outcome = outcome.as_str(),
                actor = ctx.actor.unwrap_or(""),
                project = ctx.project.unwrap_or(""),
                defect = ctx.defect.unwrap_or(""),
                operation = ctx.operation.unwrap_or(""),
                message = %message
            )
        };
    }
    match outcome {
        SystemEventOutcome::Success => emit!(Level::INFO),
        SystemEventOutcome::Rejected => emit!(Level::WARN),
        SystemEventOutcome::Fault => emit!(Level::ERROR),
    }
}
