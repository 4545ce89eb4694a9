//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `CredentialError`: Form input rejected before any provider call
//! - `AuthError`: Identity provider failures (sign-in, sign-up, sign-out)
//! - `ProfileError`: Profile lookup and validation failures

use std::fmt;
use studentcollab_core::IdentityId;

/// Minimum password length accepted before calling the provider.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Credential input that fails local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Email is empty or lacks an `@`.
    InvalidEmail,
    /// Password is shorter than [`MIN_PASSWORD_LEN`].
    PasswordTooShort { min: usize },
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "please enter a valid email address"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialError {}

/// Errors from identity provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The provider rejected the email/password pair.
    InvalidCredential { reason: String },
    /// An account already exists for this email.
    DuplicateAccount { email: String },
    /// The provider considers the password too weak.
    WeakCredential { reason: String },
    /// The provider could not be reached.
    NetworkFailure { details: String },
    /// Any other provider-side failure.
    ProviderError { reason: String },
}

impl AuthError {
    /// Returns true for failures worth retrying unchanged.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkFailure { .. })
    }

    /// Maps a local sign-in validation failure.
    ///
    /// Sign-in never reports a weak password; a short password simply
    /// cannot be the right one.
    #[must_use]
    pub fn from_sign_in_input(err: CredentialError) -> Self {
        Self::InvalidCredential {
            reason: err.to_string(),
        }
    }

    /// Maps a local sign-up validation failure.
    #[must_use]
    pub fn from_sign_up_input(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidEmail => Self::InvalidCredential {
                reason: err.to_string(),
            },
            CredentialError::PasswordTooShort { .. } => Self::WeakCredential {
                reason: err.to_string(),
            },
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredential { reason } => write!(f, "invalid credentials: {reason}"),
            Self::DuplicateAccount { email } => {
                write!(f, "an account already exists for {email}")
            }
            Self::WeakCredential { reason } => write!(f, "password rejected: {reason}"),
            Self::NetworkFailure { details } => {
                write!(f, "could not reach the identity provider: {details}")
            }
            Self::ProviderError { reason } => write!(f, "identity provider error: {reason}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Errors from resolving an application profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// No profile record exists for the identity.
    NotFound { identity_id: IdentityId },
    /// The profile store could not be reached.
    NetworkFailure { details: String },
    /// A record exists but cannot be turned into a profile.
    InvalidRecord {
        identity_id: IdentityId,
        reason: String,
    },
}

impl ProfileError {
    /// Returns true if the failure says something about the profile itself,
    /// as opposed to the transport.
    #[must_use]
    pub fn is_definitive(&self) -> bool {
        !matches!(self, Self::NetworkFailure { .. })
    }
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { identity_id } => {
                write!(f, "no profile found for identity {identity_id}")
            }
            Self::NetworkFailure { details } => {
                write!(f, "profile lookup failed: {details}")
            }
            Self::InvalidRecord {
                identity_id,
                reason,
            } => {
                write!(f, "invalid profile record for {identity_id}: {reason}")
            }
        }
    }
}

impl std::error::Error for ProfileError {}
