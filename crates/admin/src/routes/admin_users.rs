//! Admin user management API.
//!
//! Listing requires a consistent admin; changing or removing records
//! requires a `super_admin`. The last `super_admin` can be neither demoted
//! nor removed; the repository checks this inside the write transaction.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use firmdesk_core::AdminUserId;

use crate::error::AppError;
use crate::middleware::RequireListedAdmin;
use crate::models::{AdminRole, AdminUser};
use crate::state::AppState;

/// Build the admin users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin-users", get(index))
        .route("/api/admin-users/{id}", delete(remove))
        .route("/api/admin-users/{id}/role", put(update_role))
}

/// Admin users list response.
#[derive(Debug, Serialize)]
pub struct AdminUsersResponse {
    pub users: Vec<AdminUser>,
}

/// Role change request.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: AdminRole,
}

fn require_super_admin(admin: &RequireListedAdmin) -> Result<(), AppError> {
    if admin.record.role.can_manage_admins() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only super admins can manage admin users".to_string(),
        ))
    }
}

/// List all authorization records.
///
/// GET /api/admin-users
#[instrument(skip_all)]
async fn index(
    _admin: RequireListedAdmin,
    State(state): State<AppState>,
) -> Result<Json<AdminUsersResponse>, AppError> {
    let users = state.reconciler().fetch_authorization_records().await?;
    Ok(Json(AdminUsersResponse { users }))
}

/// Delete an authorization record.
///
/// DELETE /api/admin-users/{id}
#[instrument(skip_all)]
async fn remove(
    admin: RequireListedAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    require_super_admin(&admin)?;
    let id = AdminUserId::new(id);
    if admin.record.id == id {
        return Err(AppError::BadRequest(
            "cannot delete your own admin record".to_string(),
        ));
    }

    // Refuses the last super admin under a row lock
    state.admin_users().delete(id).await?;
    tracing::info!(
        admin_user_id = %id,
        removed_by = %admin.identity.id,
        "Admin record deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Change a record's role.
///
/// PUT /api/admin-users/{id}/role
#[instrument(skip_all)]
async fn update_role(
    admin: RequireListedAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Json<AdminUser>, AppError> {
    require_super_admin(&admin)?;
    let id = AdminUserId::new(id);

    let updated = state.admin_users().update_role(id, body.role).await?;
    tracing::info!(
        admin_user_id = %id,
        role = %updated.role,
        changed_by = %admin.identity.id,
        "Admin role updated"
    );

    Ok(Json(updated))
}
