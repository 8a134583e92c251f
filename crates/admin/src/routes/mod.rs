//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness check (main.rs)
//! GET    /health/ready               - Readiness check (main.rs)
//!
//! # Auth
//! POST   /auth/session               - Exchange provider access token for a session
//! POST   /auth/logout                - Clear session identity
//!
//! # Access check
//! GET    /api/access                 - Reconcile session identity against admin records
//! POST   /api/access/fix             - Insert the missing admin record
//!
//! # Admin users
//! GET    /api/admin-users            - List admin records (consistent admin)
//! DELETE /api/admin-users/{id}       - Remove admin record (super admin)
//! PUT    /api/admin-users/{id}/role  - Change role (super admin)
//! ```

pub mod access;
pub mod admin_users;
pub mod auth;

use axum::Router;

use crate::state::AppState;

/// Build the application router (without health checks and layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(access::router())
        .merge(admin_users::router())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::routes;
    use crate::state::test_support::lazy_state;

    async fn send(method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = routes().with_state(lazy_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_anonymous_access_check_is_ordinary_user() {
        let (status, body) = send("GET", "/api/access").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "ordinary_user");
        assert_eq!(body["is_privileged"], false);
        assert_eq!(body["is_listed"], false);
        assert!(body["action"].is_null());
    }

    #[tokio::test]
    async fn test_fix_requires_identity() {
        let (status, body) = send("POST", "/api/access/fix").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn test_admin_users_require_identity() {
        let (status, _) = send("GET", "/api/admin-users").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send("DELETE", "/api/admin-users/3").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
