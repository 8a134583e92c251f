//! Integration tests for Firmdesk.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory reconciliation tests
//! cargo test -p firmdesk-integration-tests
//!
//! # Database and live-server tests (need ADMIN_DATABASE_URL / a running server)
//! cargo test -p firmdesk-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `access_reconciliation` - Access check and self-healing against the in-memory store
//! - `admin_users_repository` - `PostgreSQL` authorization store
//! - `admin_access_api` - HTTP API against a running server

use firmdesk_admin::models::Identity;
use firmdesk_core::{Email, IdentityId};

/// Build an identity with a fresh id.
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
#[allow(clippy::expect_used)]
pub fn identity(email: &str, is_privileged: bool) -> Identity {
    Identity {
        id: IdentityId::new_random(),
        email: Email::parse(email).expect("test email must be valid"),
        first_name: Some("Ada".to_owned()),
        last_name: Some("Okafor".to_owned()),
        is_privileged,
    }
}

/// A privileged identity (claim present).
#[must_use]
pub fn privileged(email: &str) -> Identity {
    identity(email, true)
}

/// An identity without the privilege claim.
#[must_use]
pub fn ordinary(email: &str) -> Identity {
    identity(email, false)
}

/// Admin server base URL for live tests.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}
