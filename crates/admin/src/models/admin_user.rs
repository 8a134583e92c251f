//! Authorization record domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use firmdesk_core::{AdminUserId, Email, IdentityId};

use super::Identity;

// Re-export AdminRole from core for convenience
pub use firmdesk_core::AdminRole;

/// A row of `admin.admin_users`: the assertion that an identity is a
/// recognized administrator.
///
/// Display fields are denormalized from the identity when the record is
/// created and are not kept in sync afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    /// Record ID.
    pub id: AdminUserId,
    /// Identity this record authorizes.
    pub identity_id: IdentityId,
    /// Permission level.
    pub role: AdminRole,
    /// Given name at creation time.
    pub first_name: Option<String>,
    /// Family name at creation time.
    pub last_name: Option<String>,
    /// Email at creation time.
    pub email: Option<Email>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl AdminUser {
    /// Whether this record belongs to `identity_id`.
    #[must_use]
    pub fn is_owned_by(&self, identity_id: IdentityId) -> bool {
        self.identity_id == identity_id
    }
}

/// Insert payload for a new authorization record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdminUser {
    pub identity_id: IdentityId,
    pub role: AdminRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
}

impl NewAdminUser {
    /// Build a record for `identity`, copying its display fields.
    #[must_use]
    pub fn from_identity(identity: &Identity, role: AdminRole) -> Self {
        Self {
            identity_id: identity.id,
            role,
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            email: Some(identity.email.clone()),
        }
    }
}
