//! Admin access commands.
//!
//! # Usage
//!
//! ```bash
//! # List authorization records
//! fd-cli admin list
//!
//! # Classify an identity; add --fix to insert a missing record
//! fd-cli admin check --identity-id <uuid> -e ops@example.com --privileged
//!
//! # Promote or demote a record (the last super admin is kept)
//! fd-cli admin set-role --id 4 -r super_admin
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for admin database

use firmdesk_admin::db::{AdminUserRepository, RepositoryError};
use firmdesk_admin::models::Identity;
use firmdesk_admin::services::{AccessAction, ReconcileError, Reconciler};
use firmdesk_core::{AdminRole, AdminUserId, Email, EmailError, IdentityId};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Access check failed.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// Invalid identity id.
    #[error("Invalid identity id: {0}")]
    InvalidIdentityId(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Arguments for `admin check`.
#[derive(Debug)]
pub struct CheckArgs {
    pub identity_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub privileged: bool,
    pub fix: bool,
}

impl CheckArgs {
    fn identity(&self) -> Result<Identity, AdminError> {
        let id: IdentityId = self
            .identity_id
            .parse()
            .map_err(|_| AdminError::InvalidIdentityId(self.identity_id.clone()))?;

        Ok(Identity {
            id,
            email: Email::parse(&self.email)?,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_privileged: self.privileged,
        })
    }
}

fn parse_role(role: &str) -> Result<AdminRole, AdminError> {
    role.parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))
}

/// List every authorization record.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), AdminError> {
    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("ADMIN_DATABASE_URL"))?;
    let pool = super::connect(&database_url).await?;

    let reconciler = Reconciler::new(AdminUserRepository::new(&pool));
    let records = reconciler.fetch_authorization_records().await?;

    tracing::info!("{} admin record(s)", records.len());
    for record in &records {
        tracing::info!(
            "  #{} {} {} {}",
            record.id,
            record.identity_id,
            record.role,
            record
                .email
                .as_ref()
                .map_or("(no email)", firmdesk_core::Email::as_str)
        );
    }

    Ok(())
}

/// Run one access check for the described identity.
///
/// With `fix` set and the check reporting a security inconsistency, the
/// missing record is inserted once.
///
/// # Errors
///
/// Returns an error on invalid arguments or store failures.
pub async fn check(args: CheckArgs) -> Result<(), AdminError> {
    let identity = args.identity()?;

    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("ADMIN_DATABASE_URL"))?;
    let pool = super::connect(&database_url).await?;

    let reconciler = Reconciler::new(AdminUserRepository::new(&pool));
    let result = reconciler.check(Some(&identity)).await?;
    let state = result.state();

    tracing::info!("Identity: {} ({})", identity.display_name(), identity.id);
    tracing::info!(
        "  privileged: {}, listed: {}",
        result.is_privileged,
        result.is_listed
    );
    tracing::info!("  state: {:?} - {}", state, state.description());

    match result.available_action() {
        Some(AccessAction::FixAdminStatus) if args.fix => {
            let outcome = reconciler.fix_admin_status(&identity).await?;
            if outcome.was_created() {
                tracing::info!("Admin record created");
            } else {
                tracing::info!("Admin record was already present");
            }
        }
        Some(AccessAction::FixAdminStatus) => {
            tracing::warn!("Re-run with --fix to insert the missing admin record");
        }
        None => {}
    }

    Ok(())
}

/// Change the role of an authorization record.
///
/// # Errors
///
/// Returns an error on an unknown role, a missing record, or when the change
/// would demote the last `super_admin`.
pub async fn set_role(id: i32, role: &str) -> Result<(), AdminError> {
    let role = parse_role(role)?;

    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("ADMIN_DATABASE_URL"))?;
    let pool = super::connect(&database_url).await?;

    let updated = AdminUserRepository::new(&pool)
        .update_role(AdminUserId::new(id), role)
        .await?;

    tracing::info!(
        "Admin record #{} ({}) is now {}",
        updated.id,
        updated.identity_id,
        updated.role
    );

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("super_admin").unwrap(), AdminRole::SuperAdmin);
        assert_eq!(parse_role("viewer").unwrap(), AdminRole::Viewer);
        assert!(matches!(
            parse_role("root"),
            Err(AdminError::InvalidRole(ref r)) if r == "root"
        ));
    }

    #[test]
    fn test_check_args_identity() {
        let args = CheckArgs {
            identity_id: "6f1c1f2e-9a51-4c1b-8d1e-0d7a3c2b1a00".to_owned(),
            email: " Ops@Firm.Example ".to_owned(),
            first_name: None,
            last_name: None,
            privileged: true,
            fix: false,
        };

        let identity = args.identity().unwrap();
        assert!(identity.is_privileged);
        assert_eq!(identity.email.as_str(), "ops@firm.example");
    }

    #[test]
    fn test_check_args_rejects_bad_identity_id() {
        let args = CheckArgs {
            identity_id: "not-a-uuid".to_owned(),
            email: "a@x.com".to_owned(),
            first_name: None,
            last_name: None,
            privileged: false,
            fix: false,
        };

        assert!(matches!(
            args.identity(),
            Err(AdminError::InvalidIdentityId(_))
        ));
    }
}
