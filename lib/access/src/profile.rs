//! Application profiles.
//!
//! A profile is the marketplace's view of an identity: its role and display
//! data. Profile rows live in the backend keyed by identity id; the raw row
//! is a [`ProfileRecord`] and only becomes a [`Profile`] once its role is
//! recognized.

use crate::error::ProfileError;
use crate::role::Role;
use serde::{Deserialize, Serialize};
use studentcollab_core::IdentityId;

/// A validated application profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    id: IdentityId,
    email: String,
    role: Role,
    display_name: Option<String>,
    avatar_url: Option<String>,
}

impl Profile {
    /// Creates a profile with no display data.
    #[must_use]
    pub fn new(id: IdentityId, email: String, role: Role) -> Self {
        Self {
            id,
            email,
            role,
            display_name: None,
            avatar_url: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_avatar_url(mut self, url: Option<String>) -> Self {
        self.avatar_url = url;
        self
    }

    #[must_use]
    pub fn id(&self) -> &IdentityId {
        &self.id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    /// Name to show in the UI: the display name, else the email.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name().unwrap_or(&self.email)
    }
}

/// A profile row exactly as the profile store returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: IdentityId,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = ProfileError;

    fn try_from(record: ProfileRecord) -> Result<Self, Self::Error> {
        let role: Role = record
            .role
            .parse()
            .map_err(|e: crate::role::UnknownRole| ProfileError::InvalidRecord {
                identity_id: record.id.clone(),
                reason: e.to_string(),
            })?;

        let email = record
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ProfileError::InvalidRecord {
                identity_id: record.id.clone(),
                reason: "missing email".to_string(),
            })?;

        Ok(Profile::new(record.id, email, role)
            .with_display_name(record.full_name.filter(|n| !n.trim().is_empty()))
            .with_avatar_url(record.avatar_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(role: &str) -> ProfileRecord {
        ProfileRecord {
            id: IdentityId::new("u1"),
            email: Some("ada@example.com".to_string()),
            role: role.to_string(),
            full_name: Some("Ada".to_string()),
            avatar_url: None,
        }
    }

    #[test]
    fn record_with_known_role_converts() {
        let profile = Profile::try_from(record("client")).expect("valid");
        assert_eq!(profile.role(), Role::Client);
        assert_eq!(profile.label(), "Ada");
        assert_eq!(profile.id().as_str(), "u1");
    }

    #[test]
    fn record_with_unknown_role_is_rejected() {
        let err = Profile::try_from(record("moderator")).unwrap_err();
        match err {
            ProfileError::InvalidRecord { identity_id, reason } => {
                assert_eq!(identity_id.as_str(), "u1");
                assert!(reason.contains("moderator"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn record_without_email_is_rejected() {
        let mut raw = record("student");
        raw.email = None;
        assert!(matches!(
            Profile::try_from(raw),
            Err(ProfileError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn blank_display_name_falls_back_to_email() {
        let mut raw = record("student");
        raw.full_name = Some("  ".to_string());
        let profile = Profile::try_from(raw).expect("valid");
        assert_eq!(profile.label(), "ada@example.com");
    }

    #[test]
    fn record_deserializes_from_row() {
        let json = r#"{"id":"u2","email":"s@example.com","role":"student","created_at":"2024-01-01"}"#;
        let raw: ProfileRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(raw.role, "student");
        assert!(raw.full_name.is_none());
    }
}
