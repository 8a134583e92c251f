//! Authentication route handlers for admin.
//!
//! Sign-in exchanges an identity provider access token for a server-side
//! session holding the resolved [`Identity`](crate::models::Identity).

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user};
use crate::middleware::auth::{clear_current_identity, set_current_identity};
use crate::models::Identity;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/session", post(create_session))
        .route("/auth/logout", post(logout))
}

/// Sign-in request body. Not `Debug`: the token must stay out of logs.
#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub access_token: String,
}

/// Sign-in response body.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub identity: Identity,
}

/// Resolve the access token and start a session.
///
/// POST /auth/session
#[instrument(skip_all)]
async fn create_session(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let identity = state
        .identity_provider()
        .fetch_identity(&body.access_token)
        .await?;

    // New session ID on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_current_identity(&session, &identity)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    tracing::info!(
        identity_id = %identity.id,
        is_privileged = identity.is_privileged,
        "Identity signed in"
    );

    Ok(Json(SessionResponse { identity }))
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_identity(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}
