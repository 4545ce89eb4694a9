//! Strongly-typed identifiers for marketplace entities.
//!
//! Every identifier in this system is issued by the managed backend (the
//! identity provider for users, the database for projects and
//! applications). They are opaque to us: we never generate, parse or
//! reorder them, we only carry them around and compare them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Generates a newtype around a backend-issued opaque identifier.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an identifier issued by the backend.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        reason: "identifier is empty".to_string(),
                    });
                }
                if trimmed.chars().any(char::is_whitespace) {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        reason: "identifier contains whitespace".to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

define_id!(
    /// Identifier of an authenticated principal, issued by the identity
    /// provider. Profiles are keyed by the same value.
    IdentityId
);

define_id!(
    /// Identifier of a posted project.
    ProjectId
);

define_id!(
    /// Identifier of a student's application to a project.
    ApplicationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_raw_identifier() {
        let id = IdentityId::new("6f1c2a9e-0d4b-4c1e-9a57-2f0e0c1d9b11");
        assert_eq!(id.to_string(), "6f1c2a9e-0d4b-4c1e-9a57-2f0e0c1d9b11");
        assert_eq!(id.as_str(), id.to_string());
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let id: ProjectId = "  prj-42 ".parse().expect("should parse");
        assert_eq!(id.as_str(), "prj-42");
    }

    #[test]
    fn parse_rejects_empty() {
        let err = "   ".parse::<IdentityId>().unwrap_err();
        assert_eq!(err.id_type, "IdentityId");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn parse_rejects_inner_whitespace() {
        let err = "abc def".parse::<ApplicationId>().unwrap_err();
        assert_eq!(err.id_type, "ApplicationId");
    }

    #[test]
    fn ids_of_same_value_are_equal() {
        let a: IdentityId = "user-1".into();
        let b = IdentityId::from("user-1".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_transparently() {
        let id = ProjectId::new("p1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"p1\"");
    }
}
