//! User-facing notices.
//!
//! The session store broadcasts a [`Notice`] whenever something the user
//! asked for finishes, or when a background refresh fails. The web layer
//! renders them as toasts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A short message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    #[must_use]
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            description: description.into(),
        }
    }

    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }

    pub(crate) fn signed_in() -> Self {
        Self::info("Welcome back!", "You've successfully signed in.")
    }

    pub(crate) fn signed_up(verification_pending: bool) -> Self {
        let description = if verification_pending {
            "Your account has been created. Please check your email to verify it before signing in."
        } else {
            "Your account has been created successfully."
        };
        Self::info("Welcome!", description)
    }

    pub(crate) fn signed_out() -> Self {
        Self::info("Signed out", "You've been successfully signed out.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_notices_are_flagged() {
        assert!(Notice::error("Error signing in", "bad password").is_error());
        assert!(!Notice::signed_in().is_error());
    }

    #[test]
    fn sign_up_notice_mentions_verification_when_pending() {
        assert!(Notice::signed_up(true).description.contains("verify"));
        assert!(!Notice::signed_up(false).description.contains("verify"));
    }
}
