//! Core types for Firmdesk.
//!
//! Type-safe wrappers for the identity and authorization domain.

pub mod email;
pub mod id;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::{AdminRole, AdminRoleParseError};
