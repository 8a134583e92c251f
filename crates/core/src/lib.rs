//! Firmdesk Core - Shared types library.
//!
//! This crate provides the types shared by all Firmdesk components:
//! - `admin` - Admin back end (access reconciliation, admin user management)
//! - `cli` - Command-line tools for migrations and access checks
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is opt-in via the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for identity IDs, emails, and admin roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
