//! ---
//! dt_section: "01-core-functionality"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Shared configuration and bootstrap utilities."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
//! Shared primitives for the defect tracker workspace: configuration loading
//! and tracing subscriber bootstrap.

pub mod config;
pub mod logging;

pub use config::{
    AccessConfig, AppConfig, AuditConfig, LoadedAppConfig, LoggingConfig, RequirementConfig,
};
pub use logging::{init_tracing, LogFormat};
