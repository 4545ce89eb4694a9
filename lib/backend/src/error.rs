//! Backend data access errors.
//!
//! Identity and profile calls report the access crate's `AuthError` and
//! `ProfileError`; everything else reports [`BackendError`].

use std::fmt;
use studentcollab_core::ApplicationStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The operation needs a signed-in identity.
    NotSignedIn,
    /// The backend could not be reached.
    RequestFailed { details: String },
    /// The backend answered with a non-success status.
    Rejected { status: u16, message: String },
    /// The response body did not have the expected shape.
    InvalidResponse { reason: String },
    /// Input failed validation before any request was made.
    InvalidInput { reason: String },
    /// The application is not in a state that allows this change.
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
}

impl BackendError {
    /// Returns true for failures worth retrying unchanged.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed { .. } => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSignedIn => write!(f, "you must be signed in"),
            Self::RequestFailed { details } => write!(f, "backend request failed: {details}"),
            Self::Rejected { status, message } => {
                write!(f, "backend rejected request (HTTP {status}): {message}")
            }
            Self::InvalidResponse { reason } => write!(f, "unexpected backend response: {reason}"),
            Self::InvalidInput { reason } => write!(f, "{reason}"),
            Self::InvalidTransition { from, to } => {
                write!(f, "cannot change an application from {from} to {to}")
            }
        }
    }
}

impl std::error::Error for BackendError {}
