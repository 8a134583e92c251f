//! Session-stored authentication state.

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the [`Identity`](crate::models::Identity) resolved at sign-in.
    pub const CURRENT_IDENTITY: &str = "current_identity";
}
