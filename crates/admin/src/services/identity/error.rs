//! Identity provider error types.

use thiserror::Error;

/// Errors that can occur when resolving an identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the access token.
    #[error("access token rejected by identity provider")]
    Unauthorized,

    /// The provider returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The account is missing data the admin back end requires.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}
