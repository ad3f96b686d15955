//! ---
//! dt_section: "06-security-access-control"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Role hierarchy, access policy, and actor identity."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::audit::{AuditAction, AuditLog};
use crate::rbac::{AccessPolicy, Operation};
use crate::role::Role;

/// Identifier for an actor.
pub type ActorId = String;

/// Read-only lookup of an actor's current role token.
///
/// Implementations return the raw stored token (which may be unrecognised) or
/// `None` when the actor is unknown or has no role.
pub trait RoleResolver {
    /// Current role token for `actor_id`.
    fn role_token(&self, actor_id: &str) -> Option<String>;
}

impl<F> RoleResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn role_token(&self, actor_id: &str) -> Option<String> {
        self(actor_id)
    }
}

/// Representation of an actor within the directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    /// Stable identifier.
    pub id: ActorId,
    /// Display name for rendering.
    #[serde(default)]
    pub display_name: String,
    /// Contact address.
    #[serde(default)]
    pub email: Option<String>,
    /// Raw role token as stored; may be absent or unrecognised.
    #[serde(default)]
    pub role: Option<String>,
}

impl Actor {
    /// Short helper for constructing an actor without a role.
    pub fn new(id: impl Into<ActorId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: None,
            role: None,
        }
    }

    /// Attach a known role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role.as_str().to_owned());
        self
    }

    /// Attach a raw role token, recognised or not.
    pub fn with_role_token(mut self, token: impl Into<String>) -> Self {
        self.role = Some(token.into());
        self
    }

    /// Typed role, if the stored token is recognised.
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::from_token)
    }
}

/// Errors returned by directory administration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// Target actor does not exist.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),
    /// The acting actor lacks the privilege for the operation.
    #[error("actor '{actor}' is not permitted to {operation}")]
    Unauthorized {
        /// Actor that attempted the operation.
        actor: ActorId,
        /// Operation that was refused.
        operation: Operation,
    },
}

/// In-memory actor directory; every lookup reads current state.
#[derive(Debug, Default, Clone)]
pub struct ActorDirectory {
    actors: Arc<RwLock<HashMap<ActorId, Actor>>>,
}

impl ActorDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory seeded with `actors`.
    pub fn from_actors(actors: impl IntoIterator<Item = Actor>) -> Self {
        let directory = Self::new();
        for actor in actors {
            directory.upsert(actor);
        }
        directory
    }

    /// Load a JSON array of actors from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("unable to read actor file {}", path.display()))?;
        let actors: Vec<Actor> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse actor file {}", path.display()))?;
        Ok(Self::from_actors(actors))
    }

    /// Create or replace an actor.
    pub fn upsert(&self, actor: Actor) {
        self.actors.write().insert(actor.id.clone(), actor);
    }

    /// Retrieve an actor by id.
    pub fn get(&self, actor_id: &str) -> Option<Actor> {
        self.actors.read().get(actor_id).cloned()
    }

    /// Remove an actor, returning whether it existed.
    pub fn remove(&self, actor_id: &str) -> bool {
        self.actors.write().remove(actor_id).is_some()
    }

    /// All actors sorted by id.
    pub fn list(&self) -> Vec<Actor> {
        let mut actors: Vec<Actor> = self.actors.read().values().cloned().collect();
        actors.sort_by(|a, b| a.id.cmp(&b.id));
        actors
    }

    /// Assign (or with `None`, revoke) `target`'s role on behalf of `by`.
    ///
    /// Gated by [`Operation::ManageActors`]. Successful changes are appended to
    /// `audit` when one is supplied.
    pub fn assign_role(
        &self,
        policy: &AccessPolicy,
        by: &str,
        target: &str,
        role: Option<Role>,
        audit: Option<&AuditLog>,
    ) -> Result<(), DirectoryError> {
        if !policy.permits(self, by, Operation::ManageActors) {
            warn!(actor = %by, target = %target, "role change refused");
            return Err(DirectoryError::Unauthorized {
                actor: by.to_owned(),
                operation: Operation::ManageActors,
            });
        }

        let previous = {
            let mut actors = self.actors.write();
            let actor = actors
                .get_mut(target)
                .ok_or_else(|| DirectoryError::ActorNotFound(target.to_owned()))?;
            std::mem::replace(&mut actor.role, role.map(|r| r.as_str().to_owned()))
        };

        info!(actor = %by, target = %target, role = ?role, "role changed");
        if let Some(log) = audit {
            let metadata = serde_json::json!({
                "previous": previous,
                "role": role.map(Role::as_str),
            });
            if let Err(err) = log.append(by, AuditAction::RoleChanged, target, metadata) {
                warn!(error = %err, "unable to record role change");
            }
        }
        Ok(())
    }
}

impl RoleResolver for ActorDirectory {
    fn role_token(&self, actor_id: &str) -> Option<String> {
        self.actors
            .read()
            .get(actor_id)
            .and_then(|actor| actor.role.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleHierarchy;

    fn directory() -> ActorDirectory {
        ActorDirectory::from_actors([
            Actor::new("u-dev", "Dana").with_role(Role::Developer),
            Actor::new("u-qa", "Quinn").with_role(Role::Tester),
            Actor::new("u-lead", "Morgan").with_role(Role::Manager),
            Actor::new("u-odd", "Odd").with_role_token("superuser"),
            Actor::new("u-none", "Nobody"),
        ])
    }

    #[test]
    fn directory_resolves_current_role() {
        let directory = directory();
        let hierarchy = RoleHierarchy::standard();
        assert!(hierarchy.has_permission(&directory, "u-qa", Role::Developer));
        assert!(!hierarchy.has_permission(&directory, "u-odd", Role::Developer));
        assert!(!hierarchy.has_permission(&directory, "u-none", Role::Developer));

        directory.upsert(Actor::new("u-none", "Nobody").with_role(Role::Manager));
        assert!(hierarchy.has_permission(&directory, "u-none", Role::Manager));

        assert!(directory.remove("u-none"));
        assert!(!hierarchy.has_permission(&directory, "u-none", Role::Developer));
    }

    #[test]
    fn only_managers_assign_roles() {
        let directory = directory();
        let policy = AccessPolicy::standard();

        let err = directory
            .assign_role(&policy, "u-qa", "u-dev", Some(Role::Manager), None)
            .unwrap_err();
        assert_eq!(
            err,
            DirectoryError::Unauthorized {
                actor: "u-qa".into(),
                operation: Operation::ManageActors
            }
        );
        assert_eq!(directory.get("u-dev").unwrap().role(), Some(Role::Developer));

        directory
            .assign_role(&policy, "u-lead", "u-dev", Some(Role::Tester), None)
            .unwrap();
        assert_eq!(directory.get("u-dev").unwrap().role(), Some(Role::Tester));

        directory
            .assign_role(&policy, "u-lead", "u-dev", None, None)
            .unwrap();
        assert!(directory.get("u-dev").unwrap().role.is_none());

        assert_eq!(
            directory.assign_role(&policy, "u-lead", "ghost", Some(Role::Tester), None),
            Err(DirectoryError::ActorNotFound("ghost".into()))
        );
    }

    #[test]
    fn actors_deserialize_with_optional_fields() {
        let actors: Vec<Actor> =
            serde_json::from_str(r#"[{"id":"a"},{"id":"b","role":"tester","email":"b@x.io"}]"#)
                .unwrap();
        assert_eq!(actors[0].role(), None);
        assert_eq!(actors[1].role(), Some(Role::Tester));
    }
}
