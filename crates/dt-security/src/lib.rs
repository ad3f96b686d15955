//! ---
//! dt_section: "06-security-access-control"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Role hierarchy, access policy, and actor identity."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
//! Privilege is a total order over three nested roles. Every check resolves the
//! actor's current role token and compares privilege levels; anything that does
//! not resolve to a known role has no privilege at all.
#![warn(missing_docs)]

pub mod audit;
pub mod identity;
pub mod metrics;
pub mod rbac;
pub mod role;

pub use audit::{AuditAction, AuditEntry, AuditLog};
pub use identity::{Actor, ActorDirectory, ActorId, DirectoryError, RoleResolver};
pub use metrics::AccessMetrics;
pub use rbac::{AccessPolicy, Operation, PolicyError};
pub use role::{Role, RoleHierarchy};
