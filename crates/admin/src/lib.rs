//! Firmdesk Admin library.
//!
//! This crate provides the admin back end as a library,
//! allowing it to be tested and reused by the CLI.
//!
//! # Access reconciliation
//!
//! The auth provider's privilege claim and the `admin.admin_users` table
//! can disagree. [`services::reconcile`] classifies the disagreement and
//! repairs the one case with a defined fix (claim without record).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
