//! Cached profile of the signed-in user

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// The signed-in back-office user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable user identifier
    pub id: String,
    /// Login e-mail
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Role, e.g. `trader`, `settlement`, `admin`
    #[serde(default)]
    pub role: String,
}

impl UserProfile {
    /// Encodes the profile for the credential store.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_stored(&self) -> DomainResult<String> {
        serde_json::to_string(self).map_err(|e| DomainError::InvalidUserProfile(e.to_string()))
    }

    /// Decodes a profile read from the credential store.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value is not a valid profile.
    pub fn from_stored(raw: &str) -> DomainResult<Self> {
        serde_json::from_str(raw).map_err(|e| DomainError::InvalidUserProfile(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_fields_are_ignored() {
        let raw = r#"{"id":"u-1","email":"ops@example.com","name":"Ops","role":"admin","avatar":"x.png"}"#;
        let user = UserProfile::from_stored(raw).unwrap();
        assert_eq!(user.role, "admin");
        assert_eq!(UserProfile::from_stored(&user.to_stored().unwrap()).unwrap(), user);
    }

    #[test]
    fn test_corrupt_profile() {
        let err = UserProfile::from_stored("not json").unwrap_err();
        assert!(matches!(err, DomainError::InvalidUserProfile(_)));
    }
}
