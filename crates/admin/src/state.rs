//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::db::AdminUserRepository;
use crate::services::{IdentityError, IdentityProviderClient, Reconciler};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    identity_provider: IdentityProviderClient,
}

impl AppState {
    /// Build the application state.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if the identity provider client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, IdentityError> {
        let identity_provider = IdentityProviderClient::new(&config.auth)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                identity_provider,
            }),
        })
    }

    /// Application configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Identity provider client.
    #[must_use]
    pub fn identity_provider(&self) -> &IdentityProviderClient {
        &self.inner.identity_provider
    }

    /// Authorization record repository.
    #[must_use]
    pub fn admin_users(&self) -> AdminUserRepository<'_> {
        AdminUserRepository::new(self.pool())
    }

    /// Access reconciler backed by the database.
    #[must_use]
    pub fn reconciler(&self) -> Reconciler<AdminUserRepository<'_>> {
        Reconciler::new(self.admin_users())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("identity_provider", &self.inner.identity_provider)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    use super::AppState;
    use crate::config::{AdminConfig, AuthProviderConfig};

    /// State whose pool never connects unless a query is issued.
    #[allow(clippy::unwrap_used)]
    pub(crate) fn lazy_state() -> AppState {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://firmdesk@127.0.0.1:1/firmdesk"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            auth: AuthProviderConfig {
                url: "http://127.0.0.1:1".to_string(),
                anon_key: SecretString::from("pk_7Hq2x9LmN4vB8cR1"),
                privileged_roles: vec!["admin".to_string()],
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://firmdesk@127.0.0.1:1/firmdesk")
            .unwrap();

        AppState::new(config, pool).unwrap()
    }
}
