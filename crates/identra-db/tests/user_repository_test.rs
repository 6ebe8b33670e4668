//! Integration tests for the User repository using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

use identra_core::models::role::Role;
use identra_core::models::user::{AccountStatus, CreateUser, UpdateUser};
use identra_core::repository::{Pagination, UserRepository};
use identra_db::repository::SurrealUserRepository;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    identra_db::run_migrations(&db).await.unwrap();
    db
}

fn alice() -> CreateUser {
    CreateUser {
        username: "alice".into(),
        first_name: "Alice".into(),
        last_name: "Anderson".into(),
        email: "alice@example.com".into(),
        phone_number: Some("+1-555-0100".into()),
        roles: vec![Role::User],
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(alice()).await.unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.status, AccountStatus::Inactive);
    assert_eq!(user.roles, vec![Role::User]);

    // Accounts are provisioned without a credential.
    assert_eq!(user.password_hash, None);

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.username, "alice");
}

#[tokio::test]
async fn get_user_by_username() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(alice()).await.unwrap();

    let fetched = repo.get_by_username("alice").await.unwrap();
    assert_eq!(fetched.id, user.id);

    assert!(repo.get_by_username("nobody").await.is_err());
}

#[tokio::test]
async fn set_password_hash() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(alice()).await.unwrap();

    let updated = repo
        .set_password_hash(user.id, "$argon2id$fake-hash")
        .await
        .unwrap();
    assert_eq!(updated.password_hash.as_deref(), Some("$argon2id$fake-hash"));

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.password_hash.as_deref(), Some("$argon2id$fake-hash"));
}

#[tokio::test]
async fn update_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(alice()).await.unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                first_name: Some("Alicia".into()),
                status: Some(AccountStatus::Active),
                roles: Some(vec![Role::User, Role::Admin]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.first_name, "Alicia");
    assert_eq!(updated.status, AccountStatus::Active);
    assert_eq!(updated.roles, vec![Role::User, Role::Admin]);
    assert_eq!(updated.email, "alice@example.com"); // unchanged
}

#[tokio::test]
async fn hard_delete_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(alice()).await.unwrap();
    repo.delete(user.id).await.unwrap();

    assert!(repo.get_by_id(user.id).await.is_err(), "row should be gone");
}

#[tokio::test]
async fn list_users_with_pagination() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    for i in 0..5 {
        repo.create(CreateUser {
            username: format!("user-{i}"),
            first_name: "Test".into(),
            last_name: "User".into(),
            email: format!("user-{i}@example.com"),
            phone_number: None,
            roles: vec![],
        })
        .await
        .unwrap();
    }

    let page1 = repo
        .list(Pagination {
            offset: 0,
            limit: 3,
        })
        .await
        .unwrap();

    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.total, 5);

    let page2 = repo
        .list(Pagination {
            offset: 3,
            limit: 3,
        })
        .await
        .unwrap();

    assert_eq!(page2.items.len(), 2);
}

#[tokio::test]
async fn duplicate_username_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(alice()).await.unwrap();

    let result = repo
        .create(CreateUser {
            email: "other@example.com".into(),
            ..alice()
        })
        .await;

    assert!(result.is_err(), "duplicate username should be rejected");
}

#[tokio::test]
async fn duplicate_email_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(alice()).await.unwrap();

    let result = repo
        .create(CreateUser {
            username: "alice2".into(),
            ..alice()
        })
        .await;

    assert!(result.is_err(), "duplicate email should be rejected");
}
