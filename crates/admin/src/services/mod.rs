//! Business logic services for admin.
//!
//! # Services
//!
//! - `identity` - Identity provider client (access token → [`Identity`](crate::models::Identity))
//! - `reconcile` - Admin access reconciliation and self-healing

pub mod identity;
pub mod reconcile;

pub use identity::{IdentityError, IdentityProviderClient};
pub use reconcile::{
    AccessAction, AccessState, FixOutcome, ReconcileError, Reconciler, ReconciliationResult,
    evaluate,
};
