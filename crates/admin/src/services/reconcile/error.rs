//! Access reconciliation error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Failures surfaced by the reconciler.
///
/// Messages are shown to the user verbatim. Nothing here is retried
/// automatically; the user decides whether to try again.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Listing authorization records failed.
    #[error("failed to load admin users: {0}")]
    Fetch(String),

    /// Inserting the authorization record failed unexpectedly.
    #[error("failed to save admin record: {0}")]
    Persistence(String),

    /// The store refused the insert for lack of write privilege.
    #[error("not permitted to create admin record: {0}")]
    Permission(String),
}

impl ReconcileError {
    /// Wrap a failed list call.
    pub(crate) fn fetch(err: &RepositoryError) -> Self {
        Self::Fetch(err.to_string())
    }

    /// Wrap a failed insert. Conflicts never reach here.
    pub(crate) fn persist(err: RepositoryError) -> Self {
        match err {
            RepositoryError::PermissionDenied(message) => Self::Permission(message),
            other => Self::Persistence(other.to_string()),
        }
    }

    /// Whether the user may reasonably try the same action again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Permission(_))
    }
}
