//! ---
//! dt_section: "06-security-access-control"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Role hierarchy, access policy, and actor identity."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::identity::RoleResolver;
use crate::rbac::PolicyError;

/// Roles an actor can hold, declared from least to most senior.
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
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Works on assigned defects.
    Developer,
    /// Reports and verifies defects.
    Tester,
    /// Manages projects, actors, and defect lifecycle.
    Manager,
}

impl Role {
    /// Exact, case-sensitive token lookup. Unknown tokens yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }

    /// Literal token for this role.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    fn slot(self) -> usize {
        match self {
            Role::Developer => 0,
            Role::Tester => 1,
            Role::Manager => 2,
        }
    }
}

/// Immutable role -> privilege level table.
///
/// Levels are strictly increasing in declaration order of [`Role`]; only the
/// relative order is meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHierarchy {
    levels: [u32; Role::COUNT],
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::standard()
    }
}

impl RoleHierarchy {
    /// Default spacing: developer 10, tester 20, manager 30.
    pub fn standard() -> Self {
        Self {
            levels: [10, 20, 30],
        }
    }

    /// Build a hierarchy from explicit levels. Every role must be present
    /// exactly once and levels must strictly increase with seniority.
    pub fn from_levels<I>(levels: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (Role, u32)>,
    {
        let mut slots = [None; Role::COUNT];
        for (role, level) in levels {
            if slots[role.slot()].replace(level).is_some() {
                return Err(PolicyError::DuplicateRole(role));
            }
        }

        let mut resolved = [0u32; Role::COUNT];
        let mut previous: Option<(Role, u32)> = None;
        for role in Role::iter() {
            let level = slots[role.slot()].ok_or(PolicyError::MissingLevel(role))?;
            if let Some((junior, junior_level)) = previous {
                if level <= junior_level {
                    return Err(PolicyError::NotMonotonic {
                        junior,
                        senior: role,
                    });
                }
            }
            resolved[role.slot()] = level;
            previous = Some((role, level));
        }
        Ok(Self { levels: resolved })
    }

    /// Build a hierarchy from raw role tokens, as found in configuration.
    pub fn from_tokens<'a, I>(levels: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (&'a String, &'a u32)>,
    {
        let typed = levels
            .into_iter()
            .map(|(token, level)| {
                Role::from_token(token)
                    .map(|role| (role, *level))
                    .ok_or_else(|| PolicyError::UnknownRole(token.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_levels(typed)
    }

    /// Privilege level of a role.
    pub fn level(&self, role: Role) -> u32 {
        self.levels[role.slot()]
    }

    /// Whether `held` carries at least the privilege of `required`.
    pub fn satisfies(&self, held: Role, required: Role) -> bool {
        self.level(held) >= self.level(required)
    }

    /// Resolve the actor's current role and compare it against `required`.
    ///
    /// A missing actor, a missing role, or an unrecognised role token all
    /// answer `false`; this never fails.
    pub fn has_permission<R>(&self, resolver: &R, actor_id: &str, required: Role) -> bool
    where
        R: RoleResolver + ?Sized,
    {
        resolver
            .role_token(actor_id)
            .as_deref()
            .and_then(Role::from_token)
            .is_some_and(|held| self.satisfies(held, required))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn resolver(entries: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = entries
            .iter()
            .map(|(id, role)| (id.to_string(), role.to_string()))
            .collect();
        move |id: &str| map.get(id).cloned()
    }

    #[test]
    fn comparison_follows_levels_for_every_pair() {
        let hierarchy = RoleHierarchy::standard();
        for held in Role::iter() {
            for required in Role::iter() {
                assert_eq!(
                    hierarchy.satisfies(held, required),
                    hierarchy.level(held) >= hierarchy.level(required),
                    "{held} vs {required}"
                );
            }
        }
    }

    #[test]
    fn documented_pairs() {
        let hierarchy = RoleHierarchy::standard();
        let lookup = resolver(&[("dev", "developer"), ("qa", "tester"), ("boss", "manager")]);
        assert!(!hierarchy.has_permission(&lookup, "dev", Role::Tester));
        assert!(hierarchy.has_permission(&lookup, "qa", Role::Developer));
        assert!(hierarchy.has_permission(&lookup, "boss", Role::Manager));
        assert!(hierarchy.has_permission(&lookup, "dev", Role::Developer));
    }

    #[test]
    fn unresolvable_actors_have_no_privilege() {
        let hierarchy = RoleHierarchy::standard();
        let lookup = resolver(&[("shouty", "Manager"), ("blank", ""), ("admin", "admin")]);
        for actor in ["shouty", "blank", "admin", "ghost"] {
            for required in Role::iter() {
                assert!(!hierarchy.has_permission(&lookup, actor, required));
            }
        }
        let no_role = |_: &str| None::<String>;
        assert!(!hierarchy.has_permission(&no_role, "anyone", Role::Developer));
    }

    #[test]
    fn custom_levels_only_need_to_be_monotonic() {
        let hierarchy =
            RoleHierarchy::from_levels([(Role::Manager, 1000), (Role::Developer, 1), (Role::Tester, 7)])
                .unwrap();
        assert!(hierarchy.satisfies(Role::Manager, Role::Tester));
        assert!(!hierarchy.satisfies(Role::Tester, Role::Manager));
    }

    #[test]
    fn incomplete_or_inverted_levels_are_rejected() {
        assert!(matches!(
            RoleHierarchy::from_levels([(Role::Developer, 1), (Role::Tester, 2)]),
            Err(PolicyError::MissingLevel(Role::Manager))
        ));
        assert!(matches!(
            RoleHierarchy::from_levels([(Role::Developer, 5), (Role::Tester, 5), (Role::Manager, 9)]),
            Err(PolicyError::NotMonotonic {
                junior: Role::Developer,
                senior: Role::Tester
            })
        ));
    }

    #[test]
    fn repeated_role_is_rejected() {
        assert_eq!(
            RoleHierarchy::from_levels([
                (Role::Developer, 1),
                (Role::Tester, 2),
                (Role::Manager, 3),
                (Role::Developer, 0),
            ]),
            Err(PolicyError::DuplicateRole(Role::Developer))
        );
    }

    #[test]
    fn tokens_are_exact() {
        assert_eq!(Role::from_token("tester"), Some(Role::Tester));
        assert_eq!(Role::from_token("Tester"), None);
        assert_eq!(Role::from_token(" tester"), None);
        assert_eq!(Role::Manager.as_str(), "manager");
        assert_eq!(Role::Developer.to_string(), "developer");
    }
}
