//! Provider identities and the credentials used to obtain them.
//!
//! An [`Identity`] is issued by the identity provider and only ever read
//! here. [`Credential`] is the validated email/password pair the sign-in
//! and sign-up forms hand to the session store.

use crate::error::{CredentialError, MIN_PASSWORD_LEN};
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use studentcollab_core::IdentityId;

/// An authenticated principal as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable provider-issued identifier; profiles share it.
    id: IdentityId,
    /// Email address on the account, if the provider reports one.
    email: Option<String>,
    /// Whether the provider has verified the email address.
    email_confirmed: bool,
}

impl Identity {
    /// Creates an identity with an unconfirmed email.
    #[must_use]
    pub fn new(id: IdentityId, email: Option<String>) -> Self {
        Self {
            id,
            email,
            email_confirmed: false,
        }
    }

    /// Marks whether the email address has been verified.
    #[must_use]
    pub fn with_email_confirmed(mut self, confirmed: bool) -> Self {
        self.email_confirmed = confirmed;
        self
    }

    #[must_use]
    pub fn id(&self) -> &IdentityId {
        &self.id
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn email_confirmed(&self) -> bool {
        self.email_confirmed
    }
}

/// A validated email/password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    email: String,
    password: String,
}

impl Credential {
    /// Validates form input.
    ///
    /// The email is trimmed and must contain `@`; the password must be at
    /// least [`MIN_PASSWORD_LEN`] characters and is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns the first [`CredentialError`] found.
    pub fn new(email: &str, password: &str) -> Result<Self, CredentialError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(CredentialError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredentialError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// User metadata attached to a sign-up request.
///
/// The backend's profile trigger reads the role from here when it creates
/// the profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpMetadata {
    pub role: Role,
    pub email: String,
}

impl SignUpMetadata {
    #[must_use]
    pub fn new(credential: &Credential, role: Role) -> Self {
        Self {
            role,
            email: credential.email().to_string(),
        }
    }
}
