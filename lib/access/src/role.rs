//! Marketplace roles and role requirements.
//!
//! Every account is either a student or a client, chosen at sign-up and
//! never changed afterwards. Routes declare which roles may see them as a
//! [`RoleSet`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried by an application profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Browses open projects and applies to them.
    Student,
    /// Posts projects and reviews applications.
    Client,
}

impl Role {
    /// Returns the lowercase name stored in profile records.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Client => "client",
        }
    }

    /// Returns true if this role may post projects.
    #[must_use]
    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored role string is not one we know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole {
    pub value: String,
}

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.value)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "student" => Ok(Self::Student),
            "client" => Ok(Self::Client),
            other => Err(UnknownRole {
                value: other.to_string(),
            }),
        }
    }
}

/// Set of roles permitted on a route.
///
/// An empty set places no role requirement at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// Creates a set with no role requirement.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self { roles: Vec::new() }
    }

    /// Creates a set permitting exactly one role.
    #[must_use]
    pub fn only(role: Role) -> Self {
        Self { roles: vec![role] }
    }

    /// Creates a set from a list of roles, ignoring duplicates.
    #[must_use]
    pub fn of(roles: &[Role]) -> Self {
        let mut set = Vec::with_capacity(roles.len());
        for role in roles {
            if !set.contains(role) {
                set.push(*role);
            }
        }
        Self { roles: set }
    }

    /// Returns true if no role is required.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.roles.is_empty()
    }

    /// Returns true if `role` is in the set.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns true if a holder of `role` satisfies this requirement.
    ///
    /// A missing role only satisfies an unrestricted set.
    #[must_use]
    pub fn permits(&self, role: Option<Role>) -> bool {
        self.is_unrestricted() || role.is_some_and(|r| self.contains(r))
    }

    /// Returns the roles as a slice.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
