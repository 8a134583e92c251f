//! The authenticated principal.

use serde::{Deserialize, Serialize};

use firmdesk_core::{Email, IdentityId};

/// Identity of the current session, as established by the auth provider.
///
/// Only the fields the access check consumes are modeled. The provider's
/// payload may carry arbitrary extra claims; those are dropped at the
/// boundary (see `services::identity`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-issued identifier.
    pub id: IdentityId,
    /// Email address on the provider account.
    pub email: Email,
    /// Given name, if the provider knows it.
    pub first_name: Option<String>,
    /// Family name, if the provider knows it.
    pub last_name: Option<String>,
    /// Elevated-privilege claim. Says nothing about whether the
    /// authorization store agrees.
    pub is_privileged: bool,
}

impl Identity {
    /// Name to show in logs and responses; falls back to the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_owned(),
            (None, None) => self.email.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(first: Option<&str>, last: Option<&str>) -> Identity {
        Identity {
            id: IdentityId::new_random(),
            email: Email::parse("ops@firm.example").unwrap(),
            first_name: first.map(str::to_owned),
            last_name: last.map(str::to_owned),
            is_privileged: false,
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(identity(Some("Ada"), Some("Byron")).display_name(), "Ada Byron");
        assert_eq!(identity(Some("Ada"), None).display_name(), "Ada");
        assert_eq!(identity(None, Some("Byron")).display_name(), "Byron");
        assert_eq!(identity(None, None).display_name(), "ops@firm.example");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let json = r#"{
            "id": "6f1c1f2e-9a51-4c1b-8d1e-0d7a3c2b1a00",
            "email": "ops@firm.example",
            "first_name": null,
            "last_name": null,
            "is_privileged": true,
            "aal": "aal1",
            "factors": []
        }"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert!(identity.is_privileged);
    }
}
