//! ---
//! dt_section: "06-security-access-control"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Role hierarchy, access policy, and actor identity."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use dt_common::config::AccessConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoStaticStr};
use thiserror::Error;

use crate::identity::RoleResolver;
use crate::role::{Role, RoleHierarchy};

/// Operations gated by the access policy.
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
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    /// List, read, and summarise defects.
    ViewDefects,
    /// Add a comment to an existing defect.
    CommentOnDefect,
    /// Apply a partial update to a defect.
    UpdateDefect,
    /// Report a new defect.
    CreateDefect,
    /// Remove a defect and its comments.
    DeleteDefect,
    /// Assign or revoke actor roles.
    ManageActors,
}

impl Operation {
    fn slot(self) -> usize {
        match self {
            Operation::ViewDefects => 0,
            Operation::CommentOnDefect => 1,
            Operation::UpdateDefect => 2,
            Operation::CreateDefect => 3,
            Operation::DeleteDefect => 4,
            Operation::ManageActors => 5,
        }
    }

    /// Snake-case name used in logs and audit entries.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Errors raised while building a hierarchy or policy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// Token does not name a known role.
    #[error("role not found: {0}")]
    UnknownRole(String),
    /// A role was given more than one privilege level.
    #[error("privilege level for role {0} declared more than once")]
    DuplicateRole(Role),
    /// A role has no privilege level.
    #[error("no privilege level declared for role {0}")]
    MissingLevel(Role),
    /// A senior role does not outrank the role below it.
    #[error("role {senior} must have a higher privilege level than {junior}")]
    NotMonotonic {
        /// Less senior role.
        junior: Role,
        /// More senior role whose level is not greater.
        senior: Role,
    },
}

/// Role hierarchy plus the minimum role each operation requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    hierarchy: RoleHierarchy,
    requirements: [Role; Operation::COUNT],
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl AccessPolicy {
    /// Standard hierarchy with the default operation requirements.
    pub fn standard() -> Self {
        let mut requirements = [Role::Developer; Operation::COUNT];
        requirements[Operation::CreateDefect.slot()] = Role::Tester;
        requirements[Operation::DeleteDefect.slot()] = Role::Manager;
        requirements[Operation::ManageActors.slot()] = Role::Manager;
        Self {
            hierarchy: RoleHierarchy::standard(),
            requirements,
        }
    }

    /// Build a policy from the `[access]` configuration section.
    pub fn from_config(config: &AccessConfig) -> Result<Self, PolicyError> {
        let hierarchy = RoleHierarchy::from_tokens(&config.levels)?;
        let parse = |token: &str| {
            Role::from_token(token).ok_or_else(|| PolicyError::UnknownRole(token.to_owned()))
        };
        let req = &config.requirements;
        let mut requirements = [Role::Developer; Operation::COUNT];
        requirements[Operation::ViewDefects.slot()] = parse(&req.view_defects)?;
        requirements[Operation::CommentOnDefect.slot()] = parse(&req.comment_on_defect)?;
        requirements[Operation::UpdateDefect.slot()] = parse(&req.update_defect)?;
        requirements[Operation::CreateDefect.slot()] = parse(&req.create_defect)?;
        requirements[Operation::DeleteDefect.slot()] = parse(&req.delete_defect)?;
        requirements[Operation::ManageActors.slot()] = parse(&req.manage_actors)?;
        Ok(Self {
            hierarchy,
            requirements,
        })
    }

    /// Override the requirement for one operation.
    pub fn with_requirement(mut self, operation: Operation, role: Role) -> Self {
        self.requirements[operation.slot()] = role;
        self
    }

    /// Underlying role hierarchy.
    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// Minimum role required for `operation`.
    pub fn required_role(&self, operation: Operation) -> Role {
        self.requirements[operation.slot()]
    }

    /// Whether the actor currently holds the role required for `operation`.
    pub fn permits<R>(&self, resolver: &R, actor_id: &str, operation: Operation) -> bool
    where
        R: RoleResolver + ?Sized,
    {
        self.hierarchy
            .has_permission(resolver, actor_id, self.required_role(operation))
    }
}
