//! Authentication extractors for admin.
//!
//! The session holds the [`Identity`] resolved at sign-in. Whether that
//! identity may use admin endpoints is decided per request against the
//! authorization records, never cached in the session.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::{AdminUser, Identity, session_keys};
use crate::services::{AccessState, evaluate};
use crate::state::AppState;

async fn identity_from_parts(parts: &Parts) -> Option<Identity> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<Identity>(session_keys::CURRENT_IDENTITY)
        .await
        .ok()
        .flatten()
}

/// Extractor that requires a signed-in identity.
///
/// Rejects with 401 when no identity is stored in the session.
pub struct RequireIdentity(pub Identity);

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = identity_from_parts(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_string()))?;

        set_sentry_user(&identity.id.to_string(), Some(identity.email.as_str()));
        Ok(Self(identity))
    }
}

/// Extractor that optionally gets the current identity.
///
/// Unlike `RequireIdentity`, this does not reject anonymous requests.
pub struct OptionalIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(identity_from_parts(parts).await))
    }
}

/// Extractor that requires a consistent admin: privileged claim AND a
/// matching authorization record.
///
/// Rejects with 401 when signed out, 403 when the access check is not
/// [`AccessState::ConsistentAdmin`], and surfaces fetch failures as-is.
pub struct RequireListedAdmin {
    pub identity: Identity,
    pub record: AdminUser,
}

impl FromRequestParts<AppState> for RequireListedAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireIdentity(identity) = RequireIdentity::from_request_parts(parts, state).await?;

        let records = state
            .reconciler()
            .fetch_authorization_records_for(identity.id)
            .await?;
        let access = evaluate(Some(&identity), &records).state();
        if access != AccessState::ConsistentAdmin {
            tracing::warn!(identity_id = %identity.id, ?access, "Admin endpoint denied");
            return Err(AppError::Forbidden(access.description().to_string()));
        }

        let record = records
            .into_iter()
            .find(|r| r.is_owned_by(identity.id))
            .ok_or_else(|| AppError::Internal("listed admin without record".to_string()))?;

        Ok(Self { identity, record })
    }
}

/// Helper to store the identity in the session after sign-in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_identity(
    session: &Session,
    identity: &Identity,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_IDENTITY, identity).await
}

/// Helper to clear the identity from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_identity(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<Identity>(session_keys::CURRENT_IDENTITY)
        .await?;
    Ok(())
}
