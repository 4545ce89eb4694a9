//! Error types for the web layer.
//!
//! Server functions convert [`WebError`] into a user-safe `ServerFnError`;
//! backend failures shown in pages go through [`user_message`].

use leptos::server_fn::error::ServerFnError;
use rootcause::prelude::Report;
use std::fmt;
use studentcollab_backend::BackendError;

/// Errors raised while serving or bootstrapping the application.
#[derive(Debug)]
pub enum WebError {
    /// Server configuration was not attached to the request.
    ConfigUnavailable { details: String },
    /// The backend client could not be created.
    BackendUnavailable { details: String },
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigUnavailable { details } => {
                write!(f, "configuration unavailable: {details}")
            }
            Self::BackendUnavailable { details } => {
                write!(f, "backend client unavailable: {details}")
            }
        }
    }
}

impl std::error::Error for WebError {}

impl WebError {
    /// Convert to a user-safe ServerFnError.
    pub fn into_server_error(self) -> ServerFnError {
        match &self {
            WebError::ConfigUnavailable { .. } => ServerFnError::new("Configuration unavailable"),
            WebError::BackendUnavailable { .. } => ServerFnError::new("Backend unavailable"),
        }
    }
}

/// Text shown to the user for a failed backend call.
pub fn user_message(report: &Report<BackendError>) -> String {
    match report.current_context() {
        BackendError::NotSignedIn => "Please sign in first.".to_string(),
        BackendError::RequestFailed { .. } => {
            "Could not reach the server. Please try again.".to_string()
        }
        BackendError::Rejected { status, .. } if *status >= 500 => {
            "The server had a problem. Please try again.".to_string()
        }
        BackendError::Rejected { message, .. } => message.clone(),
        BackendError::InvalidResponse { .. } => "Unexpected response from the server.".to_string(),
        BackendError::InvalidInput { reason } => reason.clone(),
        BackendError::InvalidTransition { from, .. } => {
            format!("This application was already {from}.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studentcollab_core::ApplicationStatus;

    #[test]
    fn server_errors_hide_details() {
        let err = WebError::ConfigUnavailable {
            details: "missing Extension<WebConfig>".to_string(),
        };
        assert_eq!(
            err.into_server_error().to_string(),
            ServerFnError::new("Configuration unavailable").to_string()
        );
    }

    #[test]
    fn rejected_requests_surface_backend_message() {
        let report: Report<BackendError> = BackendError::Rejected {
            status: 409,
            message: "duplicate key value".to_string(),
        }
        .into();
        assert_eq!(user_message(&report), "duplicate key value");

        let report: Report<BackendError> = BackendError::Rejected {
            status: 503,
            message: "upstream connect error".to_string(),
        }
        .into();
        assert_eq!(user_message(&report), "The server had a problem. Please try again.");
    }

    #[test]
    fn decided_applications_name_their_status() {
        let report: Report<BackendError> = BackendError::InvalidTransition {
            from: ApplicationStatus::Accepted,
            to: ApplicationStatus::Rejected,
        }
        .into();
        assert_eq!(user_message(&report), "This application was already accepted.");
    }
}
