//! Identity provider client.
//!
//! Resolves a provider access token into the session [`Identity`] by calling
//! the provider's user endpoint.
//!
//! # API Reference
//!
//! - Endpoint: `GET {AUTH_URL}/auth/v1/user`
//! - Authentication: project key in the `apikey` header, user token as
//!   `Authorization: Bearer <access token>`
//!
//! The elevated claim is read from `app_metadata`: the session is privileged
//! when `app_metadata.role` (or any entry of `app_metadata.roles`) is one of
//! the configured privileged roles, or when the provider flags the account
//! with `is_super_admin`.

mod error;

pub use error::IdentityError;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use uuid::Uuid;

use firmdesk_core::Email;

use crate::config::AuthProviderConfig;
use crate::models::Identity;

/// Path of the current-user endpoint, relative to the provider URL.
const USER_PATH: &str = "/auth/v1/user";

/// User payload returned by the provider. Unlisted fields are ignored.
#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
    #[serde(default)]
    app_metadata: AppMetadata,
    #[serde(default)]
    is_super_admin: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AppMetadata {
    role: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

impl ProviderUser {
    fn into_identity(self, privileged_roles: &[String]) -> Result<Identity, IdentityError> {
        let email = self
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| IdentityError::InvalidIdentity("account has no email".to_owned()))?;
        let email = Email::parse(email).map_err(|e| IdentityError::InvalidIdentity(e.to_string()))?;

        let has_privileged_role = self
            .app_metadata
            .role
            .iter()
            .chain(self.app_metadata.roles.iter())
            .any(|role| privileged_roles.iter().any(|p| p == role));

        Ok(Identity {
            id: self.id.into(),
            email,
            first_name: non_blank(self.user_metadata.first_name),
            last_name: non_blank(self.user_metadata.last_name),
            is_privileged: has_privileged_role || self.is_super_admin == Some(true),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Client for the external identity provider.
#[derive(Clone)]
pub struct IdentityProviderClient {
    inner: Arc<IdentityProviderClientInner>,
}

struct IdentityProviderClientInner {
    client: reqwest::Client,
    user_url: String,
    privileged_roles: Vec<String>,
}

impl IdentityProviderClient {
    /// Create a new identity provider client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &AuthProviderConfig) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(config.anon_key.expose_secret())
            .map_err(|e| IdentityError::Parse(format!("Invalid API key format: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(IdentityProviderClientInner {
                client,
                user_url: format!("{}{USER_PATH}", config.url.trim_end_matches('/')),
                privileged_roles: config.privileged_roles.clone(),
            }),
        })
    }

    /// Resolve an access token into the identity it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Unauthorized` if the provider rejects the
    /// token, `IdentityError::InvalidIdentity` if the account lacks required
    /// fields, and `Http`/`Api`/`Parse` for transport and payload failures.
    pub async fn fetch_identity(&self, access_token: &str) -> Result<Identity, IdentityError> {
        let response = self
            .inner
            .client
            .get(&self.inner.user_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(IdentityError::Unauthorized);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let user: ProviderUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(format!("Failed to parse user payload: {e}")))?;

        user.into_identity(&self.inner.privileged_roles)
    }
}

impl std::fmt::Debug for IdentityProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProviderClient")
            .field("user_url", &self.inner.user_url)
            .field("privileged_roles", &self.inner.privileged_roles)
            .finish_non_exhaustive()
    }
}
