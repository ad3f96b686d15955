//! ---
//! dt_section: "15-testing-qa-runbook"
//! dt_subsection: "integration-tests"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Integration tests for roles, policy, and the actor directory."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use std::sync::Arc;
use std::thread;

use dt_common::config::AccessConfig;
use dt_security::{
    AccessPolicy, Actor, ActorDirectory, AuditAction, AuditLog, DirectoryError, Operation,
    PolicyError, Role, RoleHierarchy,
};
use indexmap::IndexMap;
use strum::IntoEnumIterator;
use tempfile::tempdir;

fn directory() -> ActorDirectory {
    ActorDirectory::from_actors([
        Actor::new("u-dev", "Dev").with_role(Role::Developer),
        Actor::new("u-qa", "QA").with_role(Role::Tester),
        Actor::new("u-lead", "Lead").with_role(Role::Manager),
        Actor::new("u-typo", "Typo").with_role_token("manger"),
        Actor::new("u-none", "None"),
    ])
}

#[test]
fn permission_follows_level_order_for_every_pair() {
    let hierarchy = RoleHierarchy::standard();
    let directory = directory();
    for held in Role::iter() {
        let actor = match held {
            Role::Developer => "u-dev",
            Role::Tester => "u-qa",
            Role::Manager => "u-lead",
        };
        for required in Role::iter() {
            assert_eq!(
                hierarchy.has_permission(&directory, actor, required),
                hierarchy.level(held) >= hierarchy.level(required),
                "{held} vs {required}"
            );
        }
    }
}

#[test]
fn unresolvable_actors_hold_no_privilege() {
    let hierarchy = RoleHierarchy::standard();
    let directory = directory();
    for actor in ["u-typo", "u-none", "u-missing", ""] {
        for required in Role::iter() {
            assert!(!hierarchy.has_permission(&directory, actor, required));
        }
    }
}

#[test]
fn role_changes_apply_to_the_next_check() {
    let policy = AccessPolicy::standard();
    let directory = directory();
    let view = directory.clone();
    assert!(!policy.permits(&view, "u-dev", Operation::CreateDefect));

    directory
        .assign_role(&policy, "u-lead", "u-dev", Some(Role::Tester), None)
        .unwrap();
    assert!(policy.permits(&view, "u-dev", Operation::CreateDefect));

    directory
        .assign_role(&policy, "u-lead", "u-dev", None, None)
        .unwrap();
    assert!(!policy.permits(&view, "u-dev", Operation::ViewDefects));
}

#[test]
fn only_managers_reassign_roles() {
    let dir = tempdir().unwrap();
    let audit = AuditLog::open(dir.path().join("audit.log")).unwrap();
    let policy = AccessPolicy::standard();
    let directory = directory();

    let err = directory
        .assign_role(&policy, "u-qa", "u-dev", Some(Role::Manager), Some(&audit))
        .unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::Unauthorized {
            operation: Operation::ManageActors,
            ..
        }
    ));
    assert_eq!(directory.get("u-dev").unwrap().role(), Some(Role::Developer));
    assert!(audit.entries().unwrap().is_empty());

    directory
        .assign_role(&policy, "u-lead", "u-dev", Some(Role::Manager), Some(&audit))
        .unwrap();
    let entries = audit.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::RoleChanged);
    assert_eq!(entries[0].target, "u-dev");
    assert_eq!(entries[0].metadata["previous"], "developer");
    assert_eq!(entries[0].metadata["role"], "manager");
    assert!(audit.verify().unwrap());

    assert!(matches!(
        directory.assign_role(&policy, "u-lead", "u-ghost", Some(Role::Tester), None),
        Err(DirectoryError::ActorNotFound(_))
    ));
}

#[test]
fn configured_levels_keep_relative_order() {
    let mut config = AccessConfig::default();
    config.levels = IndexMap::from([
        ("manager".to_owned(), 900),
        ("developer".to_owned(), 1),
        ("tester".to_owned(), 2),
    ]);
    let policy = AccessPolicy::from_config(&config).unwrap();
    assert!(policy.hierarchy().satisfies(Role::Manager, Role::Tester));
    assert!(!policy.hierarchy().satisfies(Role::Developer, Role::Tester));

    config.levels.insert("tester".to_owned(), 1000);
    assert!(matches!(
        AccessPolicy::from_config(&config),
        Err(PolicyError::NotMonotonic {
            junior: Role::Tester,
            senior: Role::Manager
        })
    ));

    config.levels.shift_remove("tester");
    assert!(matches!(
        AccessPolicy::from_config(&config),
        Err(PolicyError::MissingLevel(Role::Tester))
    ));
}

#[test]
fn concurrent_checks_see_consistent_roles() {
    let policy = Arc::new(AccessPolicy::standard());
    let directory = directory();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let policy = Arc::clone(&policy);
            let directory = directory.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    assert!(policy.permits(&directory, "u-lead", Operation::DeleteDefect));
                    assert!(!policy.permits(&directory, "u-qa", Operation::DeleteDefect));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
