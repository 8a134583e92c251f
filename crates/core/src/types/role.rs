//! Admin role labels carried by authorization records.

use serde::{Deserialize, Serialize};

/// Error returned when a role label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid admin role: {0} (expected super_admin, admin or viewer)")]
pub struct AdminRoleParseError(pub String);

/// Admin role with different permission levels.
///
/// Records created by the self-healing access check get [`AdminRole::Admin`],
/// the `Default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// May manage other admin users.
    SuperAdmin,
    /// Baseline administrator.
    #[default]
    Admin,
    /// Read-only access.
    Viewer,
}

impl AdminRole {
    /// All roles, highest privilege first.
    pub const ALL: [Self; 3] = [Self::SuperAdmin, Self::Admin, Self::Viewer];

    /// The snake_case label used on the wire and in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }

    /// Whether this role may manage other admin users.
    #[must_use]
    pub const fn can_manage_admins(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = AdminRoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s.trim())
            .ok_or_else(|| AdminRoleParseError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_role_is_admin() {
        assert_eq!(AdminRole::default(), AdminRole::Admin);
    }

    #[test]
    fn test_parse_labels() {
        for role in AdminRole::ALL {
            assert_eq!(role.as_str().parse::<AdminRole>().unwrap(), role);
        }
        assert!("owner".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_only_super_admin_manages_admins() {
        assert!(AdminRole::SuperAdmin.can_manage_admins());
        assert!(!AdminRole::Admin.can_manage_admins());
        assert!(!AdminRole::Viewer.can_manage_admins());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&AdminRole::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
    }
}
