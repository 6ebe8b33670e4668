//! Integration tests for the password service: first-time set,
//! authenticated update, history-backed reuse detection, and the
//! retention window.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

use identra_auth::{
    AuthConfig, PasswordHistoryCleanup, PasswordHistoryService, PasswordService,
    SetPasswordInput, UpdatePasswordInput, password,
};
use identra_core::error::IdentraError;
use identra_core::models::role::Role;
use identra_core::models::user::CreateUser;
use identra_core::principal::Principal;
use identra_core::repository::{PasswordHistoryRepository, UserRepository};
use identra_db::repository::{SurrealPasswordHistoryRepository, SurrealUserRepository};

type Db = surrealdb::engine::local::Db;
type UserRepo = SurrealUserRepository<Db>;
type HistoryRepo = SurrealPasswordHistoryRepository<Db>;

async fn setup() -> (UserRepo, HistoryRepo, PasswordService<UserRepo, HistoryRepo>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    identra_db::run_migrations(&db).await.unwrap();

    let user_repo = SurrealUserRepository::new(db.clone());
    let history_repo = SurrealPasswordHistoryRepository::new(db);
    let service = PasswordService::new(
        user_repo.clone(),
        history_repo.clone(),
        AuthConfig::default(),
    );
    (user_repo, history_repo, service)
}

async fn create_user(repo: &UserRepo, name: &str, roles: Vec<Role>) -> Uuid {
    repo.create(CreateUser {
        username: name.into(),
        first_name: name.into(),
        last_name: "Test".into(),
        email: format!("{name}@example.com"),
        phone_number: None,
        roles,
    })
    .await
    .unwrap()
    .id
}

fn set_input(password: &str) -> SetPasswordInput {
    SetPasswordInput {
        password: password.into(),
        password_confirmed: password.into(),
    }
}

fn self_principal(id: Uuid) -> Principal {
    Principal::new(id, vec![Role::User])
}

// -----------------------------------------------------------------------
// set_password
// -----------------------------------------------------------------------

#[tokio::test]
async fn set_password_happy_path() {
    let (user_repo, history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    service
        .set_password(id, set_input("correct-horse-battery"))
        .await
        .unwrap();

    let user = user_repo.get_by_id(id).await.unwrap();
    let hash = user.password_hash.expect("hash should be set");
    assert!(hash.starts_with("$argon2id$"));
    assert!(password::verify_password("correct-horse-battery", &hash, None).unwrap());

    // Exactly one history row, holding the new hash.
    let history = history_repo.list_for_user(id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].password_hash, hash);
}

#[tokio::test]
async fn set_password_mismatch_mutates_nothing() {
    let (user_repo, history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    let err = service
        .set_password(
            id,
            SetPasswordInput {
                password: "correct-horse-battery".into(),
                password_confirmed: "different-password".into(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IdentraError::Validation { .. }));
    let user = user_repo.get_by_id(id).await.unwrap();
    assert_eq!(user.password_hash, None);
    assert!(history_repo.list_for_user(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn set_password_unknown_user_is_not_found() {
    let (_user_repo, _history_repo, service) = setup().await;

    let err = service
        .set_password(Uuid::new_v4(), set_input("correct-horse-battery"))
        .await
        .unwrap_err();

    assert!(matches!(err, IdentraError::NotFound { .. }));
}

#[tokio::test]
async fn set_password_is_one_time_use() {
    let (user_repo, history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    service
        .set_password(id, set_input("correct-horse-battery"))
        .await
        .unwrap();

    let err = service
        .set_password(id, set_input("another-password"))
        .await
        .unwrap_err();

    match err {
        IdentraError::Validation { message } => {
            assert!(message.contains("already been set"), "got: {message}");
        }
        other => panic!("expected Validation, got {other:?}"),
    }

    // Still exactly one history row.
    assert_eq!(history_repo.list_for_user(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn set_password_enforces_minimum_length() {
    let (user_repo, history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    let err = service.set_password(id, set_input("short")).await.unwrap_err();

    assert!(matches!(err, IdentraError::Validation { .. }));
    assert!(history_repo.list_for_user(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn set_password_rejects_empty_input() {
    let (user_repo, _history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    let err = service
        .set_password(
            id,
            SetPasswordInput {
                password: "".into(),
                password_confirmed: "".into(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IdentraError::Validation { .. }));
}

// -----------------------------------------------------------------------
// update_password
// -----------------------------------------------------------------------

#[tokio::test]
async fn update_password_happy_path() {
    let (user_repo, history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    service
        .set_password(id, set_input("correct-horse-battery"))
        .await
        .unwrap();

    let principal = self_principal(id);
    service
        .update_password(
            Some(&principal),
            id,
            UpdatePasswordInput {
                current_password: "correct-horse-battery".into(),
                new_password: "entirely-new-secret".into(),
            },
        )
        .await
        .unwrap();

    let user = user_repo.get_by_id(id).await.unwrap();
    let hash = user.password_hash.unwrap();
    assert!(password::verify_password("entirely-new-secret", &hash, None).unwrap());

    // One history row per successful mutation: set + update = 2.
    assert_eq!(history_repo.list_for_user(id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_password_requires_permission() {
    let (user_repo, history_repo, service) = setup().await;
    let target = create_user(&user_repo, "admin-a", vec![Role::Admin]).await;
    let actor = create_user(&user_repo, "admin-b", vec![Role::Admin]).await;

    service
        .set_password(target, set_input("correct-horse-battery"))
        .await
        .unwrap();

    // Admin acting on a peer admin: equal rank, denied.
    let principal = Principal::new(actor, vec![Role::Admin]);
    let err = service
        .update_password(
            Some(&principal),
            target,
            UpdatePasswordInput {
                current_password: "correct-horse-battery".into(),
                new_password: "entirely-new-secret".into(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IdentraError::AuthorizationDenied { .. }));

    // The target's credential and history are untouched.
    let user = user_repo.get_by_id(target).await.unwrap();
    assert!(
        password::verify_password(
            "correct-horse-battery",
            user.password_hash.as_deref().unwrap(),
            None
        )
        .unwrap()
    );
    assert_eq!(history_repo.list_for_user(target).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_password_nonexistent_self_target_reports_invalid_credentials() {
    let (_user_repo, _history_repo, service) = setup().await;

    // Self-access passes the permission check even though the target
    // does not exist; the lookup failure must not reveal that.
    let id = Uuid::new_v4();
    let principal = self_principal(id);
    let err = service
        .update_password(
            Some(&principal),
            id,
            UpdatePasswordInput {
                current_password: "whatever-password".into(),
                new_password: "entirely-new-secret".into(),
            },
        )
        .await
        .unwrap_err();

    match err {
        IdentraError::AuthenticationFailed { reason } => {
            assert!(reason.contains("invalid credentials"), "got: {reason}");
        }
        other => panic!("expected AuthenticationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn update_password_without_credential_reports_invalid_credentials() {
    let (user_repo, _history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    let principal = self_principal(id);
    let err = service
        .update_password(
            Some(&principal),
            id,
            UpdatePasswordInput {
                current_password: "whatever-password".into(),
                new_password: "entirely-new-secret".into(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IdentraError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn update_password_wrong_current_fails() {
    let (user_repo, history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    service
        .set_password(id, set_input("correct-horse-battery"))
        .await
        .unwrap();

    let principal = self_principal(id);
    let err = service
        .update_password(
            Some(&principal),
            id,
            UpdatePasswordInput {
                current_password: "wrong-password".into(),
                new_password: "entirely-new-secret".into(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IdentraError::AuthenticationFailed { .. }));
    assert_eq!(history_repo.list_for_user(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_password_rejects_reusing_current_password() {
    let (user_repo, _history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    service
        .set_password(id, set_input("correct-horse-battery"))
        .await
        .unwrap();

    // The current password is in history from the moment it was set.
    let principal = self_principal(id);
    let err = service
        .update_password(
            Some(&principal),
            id,
            UpdatePasswordInput {
                current_password: "correct-horse-battery".into(),
                new_password: "correct-horse-battery".into(),
            },
        )
        .await
        .unwrap_err();

    match err {
        IdentraError::Validation { message } => {
            assert!(message.contains("reuse"), "got: {message}");
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn update_password_rejects_reusing_older_password() {
    let (user_repo, _history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    service
        .set_password(id, set_input("password-one-111"))
        .await
        .unwrap();

    let principal = self_principal(id);
    service
        .update_password(
            Some(&principal),
            id,
            UpdatePasswordInput {
                current_password: "password-one-111".into(),
                new_password: "password-two-222".into(),
            },
        )
        .await
        .unwrap();

    // Rotating back to the first password is still a reuse.
    let err = service
        .update_password(
            Some(&principal),
            id,
            UpdatePasswordInput {
                current_password: "password-two-222".into(),
                new_password: "password-one-111".into(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IdentraError::Validation { .. }));
}

// -----------------------------------------------------------------------
// Retention window
// -----------------------------------------------------------------------

#[tokio::test]
async fn history_is_trimmed_to_the_retention_window() {
    let (user_repo, history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    service
        .set_password(id, set_input("password-0-000"))
        .await
        .unwrap();

    let principal = self_principal(id);
    for i in 1..7u32 {
        service
            .update_password(
                Some(&principal),
                id,
                UpdatePasswordInput {
                    current_password: format!("password-{}-000", i - 1),
                    new_password: format!("password-{i}-000"),
                },
            )
            .await
            .unwrap();
    }

    // Seven writes, five survivors — the five most recent.
    let history = history_repo.list_for_user(id).await.unwrap();
    assert_eq!(history.len(), 5);
    for (idx, expected) in (2..7u32).rev().enumerate() {
        assert!(
            password::verify_password(
                &format!("password-{expected}-000"),
                &history[idx].password_hash,
                None
            )
            .unwrap(),
            "row {idx} should hold password {expected}"
        );
    }
}

#[tokio::test]
async fn evicted_password_becomes_reusable() {
    let (user_repo, _history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    service
        .set_password(id, set_input("password-0-000"))
        .await
        .unwrap();

    let principal = self_principal(id);
    for i in 1..7u32 {
        service
            .update_password(
                Some(&principal),
                id,
                UpdatePasswordInput {
                    current_password: format!("password-{}-000", i - 1),
                    new_password: format!("password-{i}-000"),
                },
            )
            .await
            .unwrap();
    }

    // password-0 and password-1 have been pruned from the window, so
    // rotating back to password-0 is no longer a reuse.
    service
        .update_password(
            Some(&principal),
            id,
            UpdatePasswordInput {
                current_password: "password-6-000".into(),
                new_password: "password-0-000".into(),
            },
        )
        .await
        .unwrap();
}

// -----------------------------------------------------------------------
// History service
// -----------------------------------------------------------------------

#[tokio::test]
async fn reuse_detection_is_false_on_empty_history() {
    let (_user_repo, history_repo, _service) = setup().await;
    let history = PasswordHistoryService::new(history_repo, None, 5);

    let used = history
        .was_used_before(Uuid::new_v4(), "never-seen-before")
        .await
        .unwrap();
    assert!(!used);
}

#[tokio::test]
async fn reuse_detection_matches_any_stored_hash() {
    let (_user_repo, history_repo, _service) = setup().await;
    let history = PasswordHistoryService::new(history_repo, None, 5);
    let user_id = Uuid::new_v4();

    for pw in ["password-one-111", "password-two-222"] {
        let hash = password::hash_password(pw, None).unwrap();
        history.record(user_id, &hash).await.unwrap();
    }

    assert!(history.was_used_before(user_id, "password-one-111").await.unwrap());
    assert!(history.was_used_before(user_id, "password-two-222").await.unwrap());
    assert!(!history.was_used_before(user_id, "password-three-333").await.unwrap());
}

#[tokio::test]
async fn history_service_validates_arguments() {
    let (_user_repo, history_repo, _service) = setup().await;
    let history = PasswordHistoryService::new(history_repo.clone(), None, 5);
    let user_id = Uuid::new_v4();

    let err = history.record(user_id, "  ").await.unwrap_err();
    assert!(matches!(err, IdentraError::Validation { .. }));
    assert!(history_repo.list_for_user(user_id).await.unwrap().is_empty());

    let err = history.was_used_before(user_id, "").await.unwrap_err();
    assert!(matches!(err, IdentraError::Validation { .. }));
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    let (user_repo, history_repo, service) = setup().await;
    let id = create_user(&user_repo, "alice", vec![Role::User]).await;

    service
        .set_password(id, set_input("password-0-000"))
        .await
        .unwrap();

    let principal = self_principal(id);
    for i in 1..8u32 {
        service
            .update_password(
                Some(&principal),
                id,
                UpdatePasswordInput {
                    current_password: format!("password-{}-000", i - 1),
                    new_password: format!("password-{i}-000"),
                },
            )
            .await
            .unwrap();
    }

    let cleanup = PasswordHistoryCleanup::new(history_repo.clone(), 5);

    // Already within the window after the service-triggered pruning.
    assert_eq!(cleanup.remove_old_passwords(id).await.unwrap(), 0);
    assert_eq!(cleanup.remove_old_passwords(id).await.unwrap(), 0);
    assert_eq!(history_repo.list_for_user(id).await.unwrap().len(), 5);
}
