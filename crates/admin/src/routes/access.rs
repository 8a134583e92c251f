//! Access check API.
//!
//! Each request runs one reconciliation cycle: load the identity's
//! authorization records, then classify. Nothing is cached between requests
//! and failures are returned for the client to display with a retry option.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::{OptionalIdentity, RequireIdentity};
use crate::models::AdminUser;
use crate::services::{AccessAction, AccessState, FixOutcome, ReconciliationResult};
use crate::state::AppState;

/// Build the access check router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/access", get(show))
        .route("/api/access/fix", post(fix))
}

/// Access check response.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    #[serde(flatten)]
    pub result: ReconciliationResult,
    pub state: AccessState,
    pub description: &'static str,
    pub action: Option<AccessAction>,
}

impl From<ReconciliationResult> for AccessResponse {
    fn from(result: ReconciliationResult) -> Self {
        let state = result.state();
        Self {
            action: result.available_action(),
            description: state.description(),
            state,
            result,
        }
    }
}

/// Fix outcome as reported to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStatus {
    Created,
    AlreadyListed,
}

/// Response for the fix action.
#[derive(Debug, Serialize)]
pub struct FixResponse {
    pub status: FixStatus,
    pub record: Option<AdminUser>,
}

impl From<FixOutcome> for FixResponse {
    fn from(outcome: FixOutcome) -> Self {
        match outcome {
            FixOutcome::Created(record) => Self {
                status: FixStatus::Created,
                record: Some(record),
            },
            FixOutcome::AlreadyListed(record) => Self {
                status: FixStatus::AlreadyListed,
                record,
            },
        }
    }
}

/// Run the access check for the current session.
///
/// GET /api/access
#[instrument(skip_all)]
async fn show(
    OptionalIdentity(identity): OptionalIdentity,
    State(state): State<AppState>,
) -> Result<Json<AccessResponse>, AppError> {
    let result = state.reconciler().check(identity.as_ref()).await?;
    Ok(Json(result.into()))
}

/// Insert the missing admin record for the current identity.
///
/// Only allowed while the access check reports a security inconsistency.
///
/// POST /api/access/fix
#[instrument(skip_all)]
async fn fix(
    RequireIdentity(identity): RequireIdentity,
    State(state): State<AppState>,
) -> Result<Json<FixResponse>, AppError> {
    let reconciler = state.reconciler();

    let current = reconciler.check(Some(&identity)).await?.state();
    if current != AccessState::SecurityInconsistency {
        return Err(AppError::Conflict(format!(
            "no fix available: {}",
            current.description()
        )));
    }

    let outcome = reconciler.fix_admin_status(&identity).await?;
    Ok(Json(outcome.into()))
}
