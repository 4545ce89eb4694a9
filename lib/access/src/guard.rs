//! Route guarding.
//!
//! [`can_access`] is the whole decision; [`RouteGuard`] is a static table
//! of per-route policies in front of it. Both are pure functions of the
//! session snapshot.

use crate::role::{Role, RoleSet};
use crate::session::Session;
use serde::{Deserialize, Serialize};

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Decision {
    Allow,
    /// Navigate to the contained route instead.
    DenyRedirect(String),
    /// The session is still settling; render a neutral placeholder.
    Pending,
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Access requirements for a single route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccessPolicy {
    /// Anyone, signed in or not.
    Public,
    /// Any signed-in identity, with or without a profile.
    Authenticated,
    /// A signed-in identity whose profile role is in the set.
    Roles(RoleSet),
}

impl RouteAccessPolicy {
    fn requirements(&self) -> (RoleSet, bool) {
        match self {
            Self::Public => (RoleSet::unrestricted(), false),
            Self::Authenticated => (RoleSet::unrestricted(), true),
            Self::Roles(roles) => (roles.clone(), true),
        }
    }
}

/// Guard settings read from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Where denied navigations are sent.
    #[serde(default = "default_fallback_route")]
    pub fallback_route: String,
}

fn default_fallback_route() -> String {
    "/".to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            fallback_route: default_fallback_route(),
        }
    }
}

/// Decides whether `session` may render a page.
///
/// Returns [`Decision::Pending`] while the session is loading, so that an
/// absent profile is never mistaken for a missing one.
#[must_use]
pub fn can_access(
    session: &Session,
    required_roles: &RoleSet,
    require_auth: bool,
    fallback: &str,
) -> Decision {
    if session.loading() {
        return Decision::Pending;
    }
    let identity_ok = session.is_authenticated() || !require_auth;
    if identity_ok && required_roles.permits(session.role()) {
        Decision::Allow
    } else {
        Decision::DenyRedirect(fallback.to_string())
    }
}

/// Static route table evaluated with [`can_access`].
#[derive(Debug, Clone)]
pub struct RouteGuard {
    fallback: String,
    routes: Vec<(String, RouteAccessPolicy)>,
}

impl RouteGuard {
    /// Creates an empty table. Unlisted routes are public.
    #[must_use]
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            fallback: config.fallback_route.clone(),
            routes: Vec::new(),
        }
    }

    /// Declares the policy for `path`, replacing any earlier one.
    #[must_use]
    pub fn route(mut self, path: &str, policy: RouteAccessPolicy) -> Self {
        let path = normalize(path).to_string();
        self.routes.retain(|(existing, _)| *existing != path);
        self.routes.push((path, policy));
        self
    }

    /// The marketplace's route table.
    #[must_use]
    pub fn marketplace(config: &AccessConfig) -> Self {
        Self::new(config)
            .route("/", RouteAccessPolicy::Public)
            .route("/projects", RouteAccessPolicy::Authenticated)
            .route(
                "/post-project",
                RouteAccessPolicy::Roles(RoleSet::only(Role::Client)),
            )
    }

    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Looks up the policy for `path`; query strings, fragments and a
    /// trailing slash are ignored.
    #[must_use]
    pub fn policy_for(&self, path: &str) -> RouteAccessPolicy {
        let path = normalize(path);
        self.routes
            .iter()
            .find(|(route, _)| route == path)
            .map_or(RouteAccessPolicy::Public, |(_, policy)| policy.clone())
    }

    /// Checks `session` against the policy declared for `path`.
    #[must_use]
    pub fn check(&self, session: &Session, path: &str) -> Decision {
        self.evaluate(session, &self.policy_for(path))
    }

    /// Checks `session` against an explicit policy.
    #[must_use]
    pub fn evaluate(&self, session: &Session, policy: &RouteAccessPolicy) -> Decision {
        let (roles, require_auth) = policy.requirements();
        can_access(session, &roles, require_auth, &self.fallback)
    }
}

fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::profile::Profile;
    use studentcollab_core::IdentityId;

    fn signed_in(role: Option<Role>) -> Session {
        let id = IdentityId::new("u1");
        let identity = Identity::new(id.clone(), Some("u1@example.com".to_string()));
        let profile = role.map(|role| Profile::new(id, "u1@example.com".to_string(), role));
        Session::authenticated(identity, profile)
    }

    fn guard() -> RouteGuard {
        RouteGuard::marketplace(&AccessConfig::default())
    }

    #[test]
    fn loading_is_always_pending() {
        let guard = guard();
        for path in ["/", "/projects", "/post-project", "/unknown"] {
            assert_eq!(guard.check(&Session::uninitialized(), path), Decision::Pending);
            assert_eq!(
                guard.check(&signed_in(Some(Role::Client)).to_checking(), path),
                Decision::Pending
            );
        }
    }

    #[test]
    fn anonymous_is_sent_home_from_post_project() {
        assert_eq!(
            guard().check(&Session::anonymous(), "/post-project"),
            Decision::DenyRedirect("/".to_string())
        );
    }

    #[test]
    fn anonymous_may_view_landing() {
        assert_eq!(guard().check(&Session::anonymous(), "/"), Decision::Allow);
    }

    #[test]
    fn student_is_denied_post_project_but_sees_projects() {
        let student = signed_in(Some(Role::Student));
        assert_eq!(
            guard().check(&student, "/post-project"),
            Decision::DenyRedirect("/".to_string())
        );
        assert_eq!(guard().check(&student, "/projects"), Decision::Allow);
    }

    #[test]
    fn client_may_post_projects() {
        assert_eq!(
            guard().check(&signed_in(Some(Role::Client)), "/post-project"),
            Decision::Allow
        );
    }

    #[test]
    fn roleless_identity_fails_role_checks_only() {
        let roleless = signed_in(None);
        assert_eq!(
            guard().check(&roleless, "/post-project"),
            Decision::DenyRedirect("/".to_string())
        );
        assert_eq!(guard().check(&roleless, "/projects"), Decision::Allow);
    }

    #[test]
    fn configured_fallback_is_used() {
        let config = AccessConfig {
            fallback_route: "/welcome".to_string(),
        };
        let guard = RouteGuard::marketplace(&config);
        assert_eq!(
            guard.check(&Session::anonymous(), "/projects"),
            Decision::DenyRedirect("/welcome".to_string())
        );
    }

    #[test]
    fn paths_are_normalized() {
        let guard = guard();
        let student = signed_in(Some(Role::Student));
        assert!(!guard.check(&student, "/post-project/").is_allowed());
        assert!(!guard.check(&student, "/post-project?draft=1").is_allowed());
        assert_eq!(guard.policy_for("/missing"), RouteAccessPolicy::Public);
        assert_eq!(guard.policy_for(""), RouteAccessPolicy::Public);
    }

    #[test]
    fn later_route_declaration_replaces_earlier() {
        let guard = RouteGuard::new(&AccessConfig::default())
            .route("/projects", RouteAccessPolicy::Public)
            .route("/projects", RouteAccessPolicy::Authenticated);
        assert_eq!(
            guard.policy_for("/projects"),
            RouteAccessPolicy::Authenticated
        );
    }

    #[test]
    fn can_access_without_auth_requirement_allows_anonymous() {
        assert_eq!(
            can_access(&Session::anonymous(), &RoleSet::unrestricted(), false, "/"),
            Decision::Allow
        );
        assert_eq!(
            can_access(&Session::anonymous(), &RoleSet::only(Role::Client), false, "/"),
            Decision::DenyRedirect("/".to_string())
        );
    }

    #[test]
    fn access_config_defaults_fallback() {
        let config: AccessConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config.fallback_route, "/");
    }
}
