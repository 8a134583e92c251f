//! Authorization record repository for `admin.admin_users`.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate builds
//! without a live database or an offline query cache.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use firmdesk_core::{AdminUserId, Email, IdentityId};

use super::{AuthorizationStore, RepositoryError};
use crate::models::{AdminRole, AdminUser, NewAdminUser};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` admin user queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: i32,
    identity_id: Uuid,
    role: AdminRole,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: AdminUserId::new(row.id),
            identity_id: row.identity_id.into(),
            role: row.role,
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const DUPLICATE_IDENTITY: &str = "identity already has an admin record";
const LAST_SUPER_ADMIN: &str = "cannot remove the last super admin";

fn map_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::from_sqlx(err, DUPLICATE_IDENTITY)
}

/// Lock every `super_admin` row for the rest of the transaction.
///
/// Concurrent role changes and deletions serialize here. A row deleted or
/// demoted by the transaction that held the lock first is not returned.
async fn lock_super_admins(
    tx: &mut Transaction<'_, Postgres>,
) -> Result<Vec<AdminUserId>, RepositoryError> {
    sqlx::query_scalar::<_, AdminUserId>(
        r"
        SELECT id FROM admin.admin_users
        WHERE role = 'super_admin'
        ORDER BY id
        FOR UPDATE
        ",
    )
    .fetch_all(&mut **tx)
    .await
    .map_err(map_err)
}

/// Lock one record and return its current role.
async fn lock_role(
    tx: &mut Transaction<'_, Postgres>,
    id: AdminUserId,
) -> Result<AdminRole, RepositoryError> {
    sqlx::query_scalar::<_, AdminRole>(
        "SELECT role FROM admin.admin_users WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_err)?
    .ok_or(RepositoryError::NotFound)
}

/// Whether taking `target` out of the `super_admin` role leaves none behind.
///
/// `super_admins` must be the ids locked by [`lock_super_admins`].
fn removes_last_super_admin(
    target: AdminUserId,
    role: AdminRole,
    super_admins: &[AdminUserId],
) -> bool {
    role == AdminRole::SuperAdmin && !super_admins.iter().any(|id| *id != target)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for authorization record operations.
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all authorization records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, identity_id, role, first_name, last_name, email,
                   created_at, updated_at
            FROM admin.admin_users
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await
        .map_err(map_err)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a record by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, identity_id, role, first_name, last_name, email,
                   created_at, updated_at
            FROM admin.admin_users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(map_err)?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get the records owned by an identity.
    ///
    /// The unique constraint keeps this to at most one row, but the result
    /// is a list so callers never depend on that.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_identity(
        &self,
        identity_id: IdentityId,
    ) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(
            r"
            SELECT id, identity_id, role, first_name, last_name, email,
                   created_at, updated_at
            FROM admin.admin_users
            WHERE identity_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(identity_id)
        .fetch_all(self.pool)
        .await
        .map_err(map_err)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Create a new authorization record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the identity already has a record.
    /// Returns `RepositoryError::PermissionDenied` if the connected role may not write.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, record: &NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            INSERT INTO admin.admin_users (identity_id, role, first_name, last_name, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, identity_id, role, first_name, last_name, email,
                      created_at, updated_at
            ",
        )
        .bind(record.identity_id)
        .bind(record.role)
        .bind(record.first_name.as_deref())
        .bind(record.last_name.as_deref())
        .bind(record.email.as_ref().map(Email::as_str))
        .fetch_one(self.pool)
        .await
        .map_err(map_err)?;

        row.try_into()
    }

    /// Update a record's role.
    ///
    /// Demoting a `super_admin` locks every `super_admin` row first, so two
    /// concurrent demotions cannot leave the table without one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record doesn't exist.
    /// Returns `RepositoryError::Conflict` if the change would demote the last `super_admin`.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_role(
        &self,
        id: AdminUserId,
        role: AdminRole,
    ) -> Result<AdminUser, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let super_admins = lock_super_admins(&mut tx).await?;
        let current = lock_role(&mut tx, id).await?;
        if role != AdminRole::SuperAdmin && removes_last_super_admin(id, current, &super_admins) {
            return Err(RepositoryError::Conflict(LAST_SUPER_ADMIN.to_owned()));
        }

        let row = sqlx::query_as::<_, AdminUserRow>(
            r"
            UPDATE admin.admin_users
            SET role = $1
            WHERE id = $2
            RETURNING id, identity_id, role, first_name, last_name, email,
                      created_at, updated_at
            ",
        )
        .bind(role)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_err)?;

        tx.commit().await.map_err(map_err)?;

        row.try_into()
    }

    /// Delete a record by its ID.
    ///
    /// Locks every `super_admin` row first; the last `super_admin` is never deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record doesn't exist.
    /// Returns `RepositoryError::Conflict` if the record is the last `super_admin`.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let super_admins = lock_super_admins(&mut tx).await?;
        let current = lock_role(&mut tx, id).await?;
        if removes_last_super_admin(id, current, &super_admins) {
            return Err(RepositoryError::Conflict(LAST_SUPER_ADMIN.to_owned()));
        }

        sqlx::query("DELETE FROM admin.admin_users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;

        tx.commit().await.map_err(map_err)?;

        Ok(())
    }

    /// Count records by role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_role(&self, role: AdminRole) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admin.admin_users WHERE role = $1")
                .bind(role)
                .fetch_one(self.pool)
                .await
                .map_err(map_err)?;

        Ok(count)
    }
}

impl AuthorizationStore for AdminUserRepository<'_> {
    async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        self.list_all().await
    }

    async fn list_for_identity(
        &self,
        identity_id: IdentityId,
    ) -> Result<Vec<AdminUser>, RepositoryError> {
        self.get_by_identity(identity_id).await
    }

    async fn insert(&self, record: &NewAdminUser) -> Result<AdminUser, RepositoryError> {
        self.create(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_with_peer_can_go() {
        let target = AdminUserId::new(1);
        let peer = AdminUserId::new(2);
        assert!(!removes_last_super_admin(
            target,
            AdminRole::SuperAdmin,
            &[target, peer]
        ));
    }

    #[test]
    fn test_peer_removed_concurrently_leaves_target_last() {
        // The other super admin was deleted by the transaction that locked first
        let target = AdminUserId::new(1);
        assert!(removes_last_super_admin(
            target,
            AdminRole::SuperAdmin,
            &[target]
        ));
    }

    #[test]
    fn test_non_super_admin_is_never_last() {
        let target = AdminUserId::new(3);
        assert!(!removes_last_super_admin(target, AdminRole::Admin, &[]));
        assert!(!removes_last_super_admin(
            target,
            AdminRole::Viewer,
            &[AdminUserId::new(1)]
        ));
    }
}
