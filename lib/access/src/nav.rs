//! Navigation affordances derived from the session.

use crate::role::Role;
use crate::session::Session;

/// What the UI should do when an action is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavIntent {
    /// Client-side navigation to a route or in-page anchor.
    Navigate(&'static str),
    RequestSignIn,
    RequestSignUp,
    RequestSignOut,
}

/// An entry in the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavAction {
    HowItWorks,
    BrowseProjects,
    ForClients,
    SignIn,
    SignUp,
    FindProjects,
    PostProject,
    ViewProjects,
    SignOut,
}

impl NavAction {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::HowItWorks => "How it Works",
            Self::BrowseProjects => "Projects",
            Self::ForClients => "For Clients",
            Self::SignIn => "Sign In",
            Self::SignUp => "Get Started",
            Self::FindProjects => "Find Projects",
            Self::PostProject => "Post a Project",
            Self::ViewProjects => "View Projects",
            Self::SignOut => "Sign Out",
        }
    }

    #[must_use]
    pub fn intent(&self) -> NavIntent {
        match self {
            Self::HowItWorks => NavIntent::Navigate("/#how-it-works"),
            Self::BrowseProjects => NavIntent::Navigate("/#projects"),
            Self::ForClients => NavIntent::Navigate("/#for-clients"),
            Self::SignIn => NavIntent::RequestSignIn,
            Self::SignUp => NavIntent::RequestSignUp,
            Self::FindProjects | Self::ViewProjects => NavIntent::Navigate("/projects"),
            Self::PostProject => NavIntent::Navigate("/post-project"),
            Self::SignOut => NavIntent::RequestSignOut,
        }
    }

    /// True for the buttons rendered with emphasis.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::SignUp | Self::PostProject | Self::FindProjects)
    }
}

const PUBLIC_LINKS: [NavAction; 3] = [
    NavAction::HowItWorks,
    NavAction::BrowseProjects,
    NavAction::ForClients,
];

/// Maps a session snapshot to the ordered navigation entries.
pub struct NavigationPresenter;

impl NavigationPresenter {
    /// Returns the entries to show for `session`.
    ///
    /// While the session is loading only the public links are offered, so
    /// nothing role-specific flashes before the profile arrives. A signed-in
    /// identity without a profile can only sign out.
    #[must_use]
    pub fn actions(session: &Session) -> Vec<NavAction> {
        if session.loading() {
            return PUBLIC_LINKS.to_vec();
        }
        if !session.is_authenticated() {
            let mut actions = vec![NavAction::SignIn, NavAction::SignUp];
            actions.extend(PUBLIC_LINKS);
            return actions;
        }
        match session.role() {
            Some(Role::Student) => vec![NavAction::FindProjects, NavAction::SignOut],
            Some(Role::Client) => vec![
                NavAction::PostProject,
                NavAction::ViewProjects,
                NavAction::SignOut,
            ],
            None => vec![NavAction::SignOut],
        }
    }
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

    #[test]
    fn anonymous_gets_sign_in_first() {
        assert_eq!(
            NavigationPresenter::actions(&Session::anonymous()),
            vec![
                NavAction::SignIn,
                NavAction::SignUp,
                NavAction::HowItWorks,
                NavAction::BrowseProjects,
                NavAction::ForClients,
            ]
        );
    }

    #[test]
    fn student_actions() {
        assert_eq!(
            NavigationPresenter::actions(&signed_in(Some(Role::Student))),
            vec![NavAction::FindProjects, NavAction::SignOut]
        );
    }

    #[test]
    fn client_actions() {
        assert_eq!(
            NavigationPresenter::actions(&signed_in(Some(Role::Client))),
            vec![
                NavAction::PostProject,
                NavAction::ViewProjects,
                NavAction::SignOut
            ]
        );
    }

    #[test]
    fn loading_shows_public_links_only() {
        let actions = NavigationPresenter::actions(&signed_in(Some(Role::Client)).to_checking());
        assert_eq!(actions, PUBLIC_LINKS.to_vec());
    }

    #[test]
    fn roleless_identity_can_only_sign_out() {
        assert_eq!(
            NavigationPresenter::actions(&signed_in(None)),
            vec![NavAction::SignOut]
        );
    }

    #[test]
    fn intents() {
        assert_eq!(NavAction::SignIn.intent(), NavIntent::RequestSignIn);
        assert_eq!(NavAction::SignOut.intent(), NavIntent::RequestSignOut);
        assert_eq!(
            NavAction::PostProject.intent(),
            NavIntent::Navigate("/post-project")
        );
        assert_eq!(
            NavAction::ViewProjects.intent(),
            NavAction::FindProjects.intent()
        );
    }
}
