//! Database operations for the admin `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `admin.admin_users` - Authorization records (one per recognized admin identity)
//! - `admin.session` - Session storage for `tower-sessions`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p firmdesk-cli -- migrate
//! ```

pub mod admin_users;
pub mod memory;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use firmdesk_core::IdentityId;

use crate::models::{AdminUser, NewAdminUser};

pub use admin_users::AdminUserRepository;
pub use memory::InMemoryAuthorizationStore;

/// SQLSTATE raised when the connected role lacks a privilege
/// (including row-level-security rejections).
const INSUFFICIENT_PRIVILEGE: &str = "42501";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., an identity already has a record).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store refused the operation for lack of privilege.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Classify a sqlx error, recognizing unique and privilege violations.
    pub(crate) fn from_sqlx(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(conflict.to_owned());
            }
            if db_err.code().as_deref() == Some(INSUFFICIENT_PRIVILEGE) {
                return Self::PermissionDenied(db_err.message().to_owned());
            }
        }
        if matches!(
            err,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
        ) {
            return Self::Unavailable(err.to_string());
        }
        Self::Database(err)
    }
}

/// Storage for authorization records.
///
/// The reconciler only needs to list and insert. Uniqueness per identity is
/// a property of the backing store; inserting a second record for the same
/// identity must fail with [`RepositoryError::Conflict`].
pub trait AuthorizationStore: Send + Sync {
    /// All records, newest first.
    fn list(&self) -> impl Future<Output = Result<Vec<AdminUser>, RepositoryError>> + Send;

    /// Records owned by `identity_id`.
    fn list_for_identity(
        &self,
        identity_id: IdentityId,
    ) -> impl Future<Output = Result<Vec<AdminUser>, RepositoryError>> + Send;

    /// Insert a new record.
    fn insert(
        &self,
        record: &NewAdminUser,
    ) -> impl Future<Output = Result<AdminUser, RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    /// Server-side error carrying a fixed SQLSTATE.
    #[derive(Debug, Error)]
    #[error("{message}")]
    struct PgFailure {
        code: &'static str,
        unique: bool,
        message: &'static str,
    }

    impl DatabaseError for PgFailure {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    fn pg_error(code: &'static str, message: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgFailure {
            code,
            unique: code == "23505",
            message,
        }))
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let err = RepositoryError::from_sqlx(
            pg_error(
                "23505",
                "duplicate key value violates unique constraint \"admin_users_identity_id_key\"",
            ),
            "identity already has an admin record",
        );

        assert!(
            matches!(err, RepositoryError::Conflict(ref m) if m == "identity already has an admin record")
        );
    }

    #[test]
    fn test_insufficient_privilege_is_permission_denied() {
        let err = RepositoryError::from_sqlx(
            pg_error(
                "42501",
                "permission denied for table admin_users",
            ),
            "unused",
        );

        assert!(
            matches!(err, RepositoryError::PermissionDenied(ref m) if m == "permission denied for table admin_users")
        );
    }

    #[test]
    fn test_other_sqlstate_stays_database() {
        let err = RepositoryError::from_sqlx(
            pg_error("23502", "null value in column"),
            "unused",
        );

        assert!(matches!(err, RepositoryError::Database(_)));
    }

    #[test]
    fn test_pool_errors_are_unavailable() {
        let err = RepositoryError::from_sqlx(sqlx::Error::PoolTimedOut, "unused");
        assert!(matches!(err, RepositoryError::Unavailable(_)));
    }

    #[test]
    fn test_other_errors_stay_database() {
        let err = RepositoryError::from_sqlx(sqlx::Error::RowNotFound, "unused");
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
