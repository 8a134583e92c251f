//! In-memory authorization store.
//!
//! Behaves like the `PostgreSQL` table where the access check can observe
//! it: one record per identity, newest first, and conflict errors on
//! duplicate inserts. Outages and write denials can be switched on to drive
//! the error paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use firmdesk_core::{AdminUserId, IdentityId};

use super::{AuthorizationStore, RepositoryError};
use crate::models::{AdminUser, NewAdminUser};

/// Cloneable handle to a shared in-memory record set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthorizationStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: RwLock<Records>,
    unavailable: AtomicBool,
    writes_denied: AtomicBool,
    list_calls: AtomicUsize,
    insert_calls: AtomicUsize,
}

#[derive(Debug, Default)]
struct Records {
    rows: Vec<AdminUser>,
    next_id: i32,
}

impl InMemoryAuthorizationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`RepositoryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every subsequent insert fail with [`RepositoryError::PermissionDenied`].
    pub fn set_writes_denied(&self, denied: bool) {
        self.inner.writes_denied.store(denied, Ordering::SeqCst);
    }

    /// Number of list calls (scoped or not) received so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.inner.list_calls.load(Ordering::SeqCst)
    }

    /// Number of insert attempts received so far, including rejected ones.
    #[must_use]
    pub fn insert_calls(&self) -> usize {
        self.inner.insert_calls.load(Ordering::SeqCst)
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.inner.records.read().await.rows.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "connection refused".to_owned(),
            ));
        }
        Ok(())
    }

    fn newest_first(mut rows: Vec<AdminUser>) -> Vec<AdminUser> {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }
}

impl AuthorizationStore for InMemoryAuthorizationStore {
    async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        self.inner.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let rows = self.inner.records.read().await.rows.clone();
        Ok(Self::newest_first(rows))
    }

    async fn list_for_identity(
        &self,
        identity_id: IdentityId,
    ) -> Result<Vec<AdminUser>, RepositoryError> {
        self.inner.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let rows = self
            .inner
            .records
            .read()
            .await
            .rows
            .iter()
            .filter(|r| r.is_owned_by(identity_id))
            .cloned()
            .collect();
        Ok(Self::newest_first(rows))
    }

    async fn insert(&self, record: &NewAdminUser) -> Result<AdminUser, RepositoryError> {
        self.inner.insert_calls.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers interleave before the uniqueness check.
        tokio::task::yield_now().await;
        self.check_available()?;
        if self.inner.writes_denied.load(Ordering::SeqCst) {
            return Err(RepositoryError::PermissionDenied(
                "new row violates row-level security policy for table \"admin_users\"".to_owned(),
            ));
        }

        let mut records = self.inner.records.write().await;
        if records
            .rows
            .iter()
            .any(|r| r.is_owned_by(record.identity_id))
        {
            return Err(RepositoryError::Conflict(
                "identity already has an admin record".to_owned(),
            ));
        }

        records.next_id += 1;
        let now = Utc::now();
        let row = AdminUser {
            id: AdminUserId::new(records.next_id),
            identity_id: record.identity_id,
            role: record.role,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            created_at: now,
            updated_at: now,
        };
        records.rows.push(row.clone());
        drop(records);

        Ok(row)
    }
}
