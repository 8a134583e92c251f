//! Integration tests for the `PostgreSQL` authorization store.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - `ADMIN_DATABASE_URL` pointing at it, with migrations applied (`fd-cli migrate`)
//!
//! Run with: cargo test -p firmdesk-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;

use firmdesk_admin::db::{AdminUserRepository, AuthorizationStore, RepositoryError};
use firmdesk_admin::models::{AdminRole, AdminUser, NewAdminUser};
use firmdesk_admin::services::{AccessState, FixOutcome, Reconciler};
use firmdesk_integration_tests::{ordinary, privileged};

async fn pool() -> PgPool {
    let url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap();
    PgPool::connect(&url).await.unwrap()
}

/// Remove rows created by a test.
async fn cleanup(pool: &PgPool, identity_id: uuid::Uuid) {
    sqlx::query("DELETE FROM admin.admin_users WHERE identity_id = $1")
        .bind(identity_id)
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with admin migrations applied"]
async fn test_duplicate_identity_is_conflict() {
    let pool = pool().await;
    let repo = AdminUserRepository::new(&pool);
    let admin = privileged("pg-dup@example.com");
    let new_record = NewAdminUser::from_identity(&admin, AdminRole::Admin);

    let created = repo.insert(&new_record).await.unwrap();
    assert_eq!(created.identity_id, admin.id);

    let err = repo.insert(&new_record).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    cleanup(&pool, admin.id.as_uuid()).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with admin migrations applied"]
async fn test_list_for_identity_scopes_rows() {
    let pool = pool().await;
    let repo = AdminUserRepository::new(&pool);
    let first = ordinary("pg-scope-1@example.com");
    let second = ordinary("pg-scope-2@example.com");

    repo.insert(&NewAdminUser::from_identity(&first, AdminRole::Viewer))
        .await
        .unwrap();
    repo.insert(&NewAdminUser::from_identity(&second, AdminRole::Admin))
        .await
        .unwrap();

    let rows = repo.list_for_identity(first.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = rows.first().unwrap();
    assert_eq!(row.role, AdminRole::Viewer);
    assert_eq!(row.email.as_ref(), Some(&first.email));

    let all = repo.list().await.unwrap();
    assert!(all.iter().any(|r| r.is_owned_by(second.id)));

    cleanup(&pool, first.id.as_uuid()).await;
    cleanup(&pool, second.id.as_uuid()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "Requires PostgreSQL with admin migrations applied"]
async fn test_concurrent_fix_against_unique_constraint() {
    let pool = pool().await;
    let admin = privileged("pg-race@example.com");

    let first = Reconciler::new(AdminUserRepository::new(&pool));
    let second = Reconciler::new(AdminUserRepository::new(&pool));
    let (a, b) = tokio::join!(
        first.fix_admin_status(&admin),
        second.fix_admin_status(&admin)
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| o.was_created()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|o| matches!(o, FixOutcome::AlreadyListed(Some(_))))
    );

    let result = first.check(Some(&admin)).await.unwrap();
    assert_eq!(result.state(), AccessState::ConsistentAdmin);

    cleanup(&pool, admin.id.as_uuid()).await;
}

/// Insert two fresh `super_admin` records.
async fn two_super_admins(repo: &AdminUserRepository<'_>, tag: &str) -> (AdminUser, AdminUser) {
    let first = ordinary(&format!("pg-{tag}-1@example.com"));
    let second = ordinary(&format!("pg-{tag}-2@example.com"));
    let a = repo
        .insert(&NewAdminUser::from_identity(&first, AdminRole::SuperAdmin))
        .await
        .unwrap();
    let b = repo
        .insert(&NewAdminUser::from_identity(&second, AdminRole::SuperAdmin))
        .await
        .unwrap();
    (a, b)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "Requires PostgreSQL with admin migrations applied"]
async fn test_concurrent_removals_keep_one_super_admin() {
    let pool = pool().await;
    let repo = AdminUserRepository::new(&pool);
    let existing = repo.count_by_role(AdminRole::SuperAdmin).await.unwrap();
    let (a, b) = two_super_admins(&repo, "remove").await;

    let first = AdminUserRepository::new(&pool);
    let second = AdminUserRepository::new(&pool);
    let (removed_b, removed_a) = tokio::join!(first.delete(b.id), second.delete(a.id));

    assert!(repo.count_by_role(AdminRole::SuperAdmin).await.unwrap() >= 1);
    if existing == 0 {
        let results = [removed_a, removed_b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(RepositoryError::Conflict(_))))
        );
        assert_eq!(repo.count_by_role(AdminRole::SuperAdmin).await.unwrap(), 1);
    }

    cleanup(&pool, a.identity_id.as_uuid()).await;
    cleanup(&pool, b.identity_id.as_uuid()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "Requires PostgreSQL with admin migrations applied"]
async fn test_concurrent_demotions_keep_one_super_admin() {
    let pool = pool().await;
    let repo = AdminUserRepository::new(&pool);
    let existing = repo.count_by_role(AdminRole::SuperAdmin).await.unwrap();
    let (a, b) = two_super_admins(&repo, "demote").await;

    let first = AdminUserRepository::new(&pool);
    let second = AdminUserRepository::new(&pool);
    let (demoted_a, demoted_b) = tokio::join!(
        first.update_role(a.id, AdminRole::Admin),
        second.update_role(b.id, AdminRole::Viewer)
    );

    if existing == 0 {
        assert_eq!(
            [demoted_a.is_ok(), demoted_b.is_ok()]
                .iter()
                .filter(|ok| **ok)
                .count(),
            1
        );
        let roles = [
            repo.get_by_id(a.id).await.unwrap().unwrap().role,
            repo.get_by_id(b.id).await.unwrap().unwrap().role,
        ];
        assert_eq!(
            roles.iter().filter(|r| **r == AdminRole::SuperAdmin).count(),
            1
        );
    }
    assert!(repo.count_by_role(AdminRole::SuperAdmin).await.unwrap() >= 1);

    cleanup(&pool, a.identity_id.as_uuid()).await;
    cleanup(&pool, b.identity_id.as_uuid()).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with admin migrations applied"]
async fn test_missing_record_is_not_found() {
    let pool = pool().await;
    let repo = AdminUserRepository::new(&pool);
    let missing = firmdesk_core::AdminUserId::new(i32::MAX);

    assert!(matches!(
        repo.delete(missing).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        repo.update_role(missing, AdminRole::Viewer).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(repo.get_by_id(missing).await.unwrap().is_none());
}
