//! Admin access reconciliation.
//!
//! The auth provider may claim a session is an administrator while the
//! `admin_users` table disagrees, or the other way around. [`evaluate`]
//! classifies the relationship; [`Reconciler::fix_admin_status`] repairs the
//! one state that has a defined correction (claim present, record missing).
//!
//! | privileged | listed | [`AccessState`]            | action           |
//! |------------|--------|----------------------------|------------------|
//! | no         | no     | `OrdinaryUser`             | none             |
//! | no         | yes    | `StaleRecord`              | none (flag only) |
//! | yes        | yes    | `ConsistentAdmin`          | none             |
//! | yes        | no     | `SecurityInconsistency`    | fix admin status |

mod error;

pub use error::ReconcileError;

use serde::Serialize;
use tracing::instrument;

use firmdesk_core::{Email, IdentityId};

use crate::db::{AuthorizationStore, RepositoryError};
use crate::models::{AdminRole, AdminUser, Identity, NewAdminUser};

/// Outcome of comparing an identity against the authorization records.
///
/// Built fresh for every check and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub identity_id: Option<IdentityId>,
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_privileged: bool,
    pub is_listed: bool,
}

/// The four reachable combinations of claim and record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    /// No claim, no record.
    OrdinaryUser,
    /// Record exists but the claim was revoked. Informational only.
    StaleRecord,
    /// Claim and record agree.
    ConsistentAdmin,
    /// Claim without a backing record.
    SecurityInconsistency,
}

impl AccessState {
    /// Human-readable explanation for the UI.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::OrdinaryUser => "Signed-in user without admin access.",
            Self::StaleRecord => {
                "An admin record exists for this account, but the account no longer carries admin privileges."
            }
            Self::ConsistentAdmin => "Admin access is consistent.",
            Self::SecurityInconsistency => {
                "This account has admin privileges but no matching admin record."
            }
        }
    }
}

/// Corrective operations the reconciler can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    /// Insert the missing authorization record.
    FixAdminStatus,
}

impl ReconciliationResult {
    /// Result for a request without a session.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            identity_id: None,
            email: None,
            first_name: None,
            last_name: None,
            is_privileged: false,
            is_listed: false,
        }
    }

    /// Classify the claim/record combination.
    #[must_use]
    pub const fn state(&self) -> AccessState {
        match (self.is_privileged, self.is_listed) {
            (false, false) => AccessState::OrdinaryUser,
            (false, true) => AccessState::StaleRecord,
            (true, true) => AccessState::ConsistentAdmin,
            (true, false) => AccessState::SecurityInconsistency,
        }
    }

    /// The corrective action available in this state, if any.
    #[must_use]
    pub const fn available_action(&self) -> Option<AccessAction> {
        match self.state() {
            AccessState::SecurityInconsistency => Some(AccessAction::FixAdminStatus),
            AccessState::OrdinaryUser | AccessState::StaleRecord | AccessState::ConsistentAdmin => {
                None
            }
        }
    }
}

/// Compare `identity` against `records`.
///
/// Pure: the same inputs always give the same result.
#[must_use]
pub fn evaluate(identity: Option<&Identity>, records: &[AdminUser]) -> ReconciliationResult {
    let Some(identity) = identity else {
        return ReconciliationResult::anonymous();
    };

    ReconciliationResult {
        identity_id: Some(identity.id),
        email: Some(identity.email.clone()),
        first_name: identity.first_name.clone(),
        last_name: identity.last_name.clone(),
        is_privileged: identity.is_privileged,
        is_listed: records.iter().any(|r| r.is_owned_by(identity.id)),
    }
}

/// Result of a successful [`Reconciler::fix_admin_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// This call inserted the record.
    Created(AdminUser),
    /// Another call got there first. The existing record is included when
    /// the follow-up read succeeded.
    AlreadyListed(Option<AdminUser>),
}

impl FixOutcome {
    /// The identity's record, when known.
    #[must_use]
    pub const fn record(&self) -> Option<&AdminUser> {
        match self {
            Self::Created(record) | Self::AlreadyListed(Some(record)) => Some(record),
            Self::AlreadyListed(None) => None,
        }
    }

    /// Whether this call performed the insert.
    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Runs reconciliation cycles against an [`AuthorizationStore`].
#[derive(Debug, Clone)]
pub struct Reconciler<S> {
    store: S,
}

impl<S: AuthorizationStore> Reconciler<S> {
    /// Create a reconciler over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Load every authorization record.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Fetch` on any store failure. Not retried.
    #[instrument(skip(self))]
    pub async fn fetch_authorization_records(&self) -> Result<Vec<AdminUser>, ReconcileError> {
        self.store.list().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list admin users");
            ReconcileError::fetch(&e)
        })
    }

    /// Load the authorization records owned by one identity.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Fetch` on any store failure. Not retried.
    #[instrument(skip(self))]
    pub async fn fetch_authorization_records_for(
        &self,
        identity_id: IdentityId,
    ) -> Result<Vec<AdminUser>, ReconcileError> {
        self.store.list_for_identity(identity_id).await.map_err(|e| {
            tracing::error!(error = %e, %identity_id, "Failed to list admin users for identity");
            ReconcileError::fetch(&e)
        })
    }

    /// One reconciliation cycle: fetch, then [`evaluate`].
    ///
    /// An absent identity short-circuits without touching the store.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Fetch` if the records cannot be loaded.
    #[instrument(skip_all, fields(identity_id = ?identity.map(|i| i.id)))]
    pub async fn check(
        &self,
        identity: Option<&Identity>,
    ) -> Result<ReconciliationResult, ReconcileError> {
        let Some(current) = identity else {
            return Ok(ReconciliationResult::anonymous());
        };

        let records = self.fetch_authorization_records_for(current.id).await?;
        let result = evaluate(identity, &records);

        match result.state() {
            AccessState::SecurityInconsistency => tracing::warn!(
                identity_id = %current.id,
                email = %current.email,
                "Privileged identity has no admin record"
            ),
            AccessState::StaleRecord => tracing::warn!(
                identity_id = %current.id,
                email = %current.email,
                "Admin record exists for identity without privilege claim"
            ),
            AccessState::OrdinaryUser | AccessState::ConsistentAdmin => {}
        }

        Ok(result)
    }

    /// Insert the missing authorization record for `identity`.
    ///
    /// The caller must only invoke this in
    /// [`AccessState::SecurityInconsistency`]; the state is not re-checked.
    /// Exactly one insert is attempted. A uniqueness conflict means a
    /// concurrent fix already succeeded and is reported as
    /// [`FixOutcome::AlreadyListed`].
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Permission` if the store rejects the write
    /// for lack of privilege, and `ReconcileError::Persistence` for any other
    /// insert failure.
    #[instrument(skip_all, fields(identity_id = %identity.id))]
    pub async fn fix_admin_status(&self, identity: &Identity) -> Result<FixOutcome, ReconcileError> {
        let new_record = NewAdminUser::from_identity(identity, AdminRole::default());

        match self.store.insert(&new_record).await {
            Ok(record) => {
                tracing::info!(
                    admin_user_id = %record.id,
                    email = %identity.email,
                    "Created missing admin record"
                );
                Ok(FixOutcome::Created(record))
            }
            Err(RepositoryError::Conflict(reason)) => {
                tracing::info!(%reason, "Admin record already present, treating fix as done");
                let existing = match self.store.list_for_identity(identity.id).await {
                    Ok(records) => records.into_iter().next(),
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not load existing admin record");
                        None
                    }
                };
                Ok(FixOutcome::AlreadyListed(existing))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create admin record");
                Err(ReconcileError::persist(e))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::InMemoryAuthorizationStore;

    fn identity(is_privileged: bool) -> Identity {
        Identity {
            id: IdentityId::new_random(),
            email: Email::parse("a@x.com").unwrap(),
            first_name: Some("Ada".to_owned()),
            last_name: Some("Lovelace".to_owned()),
            is_privileged,
        }
    }

    fn record_for(identity: &Identity) -> AdminUser {
        let now = chrono::Utc::now();
        AdminUser {
            id: firmdesk_core::AdminUserId::new(1),
            identity_id: identity.id,
            role: AdminRole::Admin,
            first_name: None,
            last_name: None,
            email: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_evaluate_without_identity() {
        let other = identity(true);
        let result = evaluate(None, &[record_for(&other)]);

        assert_eq!(result, ReconciliationResult::anonymous());
        assert_eq!(result.state(), AccessState::OrdinaryUser);
        assert_eq!(result.available_action(), None);
    }

    #[test]
    fn test_evaluate_state_table() {
        for is_privileged in [false, true] {
            for is_listed in [false, true] {
                let current = identity(is_privileged);
                let records = if is_listed {
                    vec![record_for(&current)]
                } else {
                    vec![record_for(&identity(true))]
                };

                let result = evaluate(Some(&current), &records);

                assert_eq!(result.is_privileged, is_privileged);
                assert_eq!(result.is_listed, is_listed);
                assert_eq!(
                    result.available_action().is_some(),
                    is_privileged && !is_listed,
                    "privileged={is_privileged} listed={is_listed}"
                );
            }
        }
    }

    #[test]
    fn test_evaluate_copies_identity_fields() {
        let current = identity(false);
        let result = evaluate(Some(&current), &[]);

        assert_eq!(result.identity_id, Some(current.id));
        assert_eq!(result.email.as_ref().map(Email::as_str), Some("a@x.com"));
        assert_eq!(result.first_name.as_deref(), Some("Ada"));
        assert_eq!(result.last_name.as_deref(), Some("Lovelace"));
    }

    #[tokio::test]
    async fn test_check_anonymous_skips_store() {
        let store = InMemoryAuthorizationStore::new();
        let reconciler = Reconciler::new(store.clone());

        let result = reconciler.check(None).await.unwrap();

        assert_eq!(result.state(), AccessState::OrdinaryUser);
        assert_eq!(store.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_fix_then_check_is_consistent() {
        let reconciler = Reconciler::new(InMemoryAuthorizationStore::new());
        let current = identity(true);

        let before = reconciler.check(Some(&current)).await.unwrap();
        assert_eq!(before.state(), AccessState::SecurityInconsistency);

        let outcome = reconciler.fix_admin_status(&current).await.unwrap();
        assert!(outcome.was_created());
        let record = outcome.record().unwrap();
        assert_eq!(record.identity_id, current.id);
        assert_eq!(record.role, AdminRole::Admin);
        assert_eq!(record.email, Some(current.email.clone()));

        let after = reconciler.check(Some(&current)).await.unwrap();
        assert_eq!(after.state(), AccessState::ConsistentAdmin);
    }

    #[tokio::test]
    async fn test_second_fix_is_benign() {
        let store = InMemoryAuthorizationStore::new();
        let reconciler = Reconciler::new(store.clone());
        let current = identity(true);

        let first = reconciler.fix_admin_status(&current).await.unwrap();
        let second = reconciler.fix_admin_status(&current).await.unwrap();

        assert!(first.was_created());
        assert!(!second.was_created());
        assert_eq!(second.record(), first.record());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_fix_permission_denied_is_terminal() {
        let store = InMemoryAuthorizationStore::new();
        store.set_writes_denied(true);
        let reconciler = Reconciler::new(store.clone());

        let err = reconciler
            .fix_admin_status(&identity(true))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Permission(_)));
        assert_eq!(store.insert_calls(), 1);
    }

    #[tokio::test]
    async fn test_fix_store_down_is_persistence_error() {
        let store = InMemoryAuthorizationStore::new();
        store.set_unavailable(true);
        let reconciler = Reconciler::new(store.clone());

        let err = reconciler
            .fix_admin_status(&identity(true))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Persistence(_)));
        assert_eq!(store.insert_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_retried() {
        let store = InMemoryAuthorizationStore::new();
        store.set_unavailable(true);
        let reconciler = Reconciler::new(store.clone());

        let err = reconciler.fetch_authorization_records().await.unwrap_err();

        assert!(matches!(err, ReconcileError::Fetch(_)));
        assert!(err.is_retryable());
        assert_eq!(store.list_calls(), 1);
    }
}
