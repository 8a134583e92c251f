//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{IdentityError, ReconcileError};

/// Application-level error type for the admin back end.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Access reconciliation failed. The message is shown to the user as-is.
    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    /// Identity provider call failed.
    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with the current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    /// Whether the client should offer a manual retry.
    pub retryable: bool,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Reconcile(ReconcileError::Fetch(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Reconcile(ReconcileError::Permission(_)) | Self::Forbidden(_) => {
                StatusCode::FORBIDDEN
            }
            Self::Reconcile(ReconcileError::Persistence(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Identity(IdentityError::Unauthorized) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Identity(IdentityError::InvalidIdentity(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Identity(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Whether the client should offer a manual retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Reconcile(err) => err.is_retryable(),
            Self::Database(RepositoryError::Conflict(_)) => false,
            Self::Database(_) | Self::Internal(_) => true,
            Self::Identity(err) => !matches!(
                err,
                IdentityError::Unauthorized | IdentityError::InvalidIdentity(_)
            ),
            Self::NotFound(_)
            | Self::Unauthorized(_)
            | Self::Forbidden(_)
            | Self::BadRequest(_)
            | Self::Conflict(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Reconcile messages are surfaced verbatim; other internals are not
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(reason)) => format!("Conflict: {reason}"),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Identity(IdentityError::Http(_) | IdentityError::Api { .. }) => {
                "Identity provider unavailable".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorBody {
            error: message,
            retryable: self.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}

/// Set the Sentry user context from the session identity.
pub fn set_sentry_user(identity_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(identity_id.to_owned()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("admin user 7".to_string());
        assert_eq!(err.to_string(), "Not found: admin user 7");

        let err = AppError::from(ReconcileError::Fetch("store unavailable".to_string()));
        assert_eq!(
            err.to_string(),
            "failed to load admin users: store unavailable"
        );
    }

    #[test]
    fn test_reconcile_error_status_codes() {
        assert_eq!(
            AppError::from(ReconcileError::Fetch(String::new())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(ReconcileError::Permission(String::new())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(ReconcileError::Persistence(String::new())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_retryable_flags() {
        assert!(AppError::from(ReconcileError::Fetch(String::new())).is_retryable());
        assert!(!AppError::from(ReconcileError::Permission(String::new())).is_retryable());
        assert!(!AppError::Conflict("x".to_string()).is_retryable());
        assert!(!AppError::from(IdentityError::Unauthorized).is_retryable());
    }

    #[test]
    fn test_repository_conflict_is_409() {
        let err = AppError::Database(RepositoryError::Conflict(
            "cannot remove the last super admin".to_string(),
        ));

        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(!err.is_retryable());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Identity(IdentityError::Parse("bad".to_string()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
    }
}
