//! Domain models for the admin back end.
//!
//! - [`Identity`] - the authenticated principal, as reported by the auth provider
//! - [`AdminUser`] - an authorization record from `admin.admin_users`
//! - [`session_keys`] - keys under which session state is stored

pub mod admin_user;
pub mod identity;
pub mod session;

pub use admin_user::{AdminRole, AdminUser, NewAdminUser};
pub use identity::Identity;
pub use session::keys as session_keys;
