//! The published session snapshot.
//!
//! A [`Session`] is an immutable view of "who is signed in, with which
//! profile, and whether that is still being worked out". The session store
//! is its only writer; everything else reads snapshots. Fields are private
//! and the constructors are the only way to build one, so a session without
//! an identity can never carry a profile.

use crate::identity::Identity;
use crate::profile::Profile;
use crate::role::Role;
use studentcollab_core::IdentityId;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// The store exists but has not asked the provider anything yet.
    Uninitialized,
    /// A session check or profile fetch is in flight.
    Checking,
    /// Settled with an identity (the profile may still be absent).
    Authenticated,
    /// Settled with no identity.
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Uninitialized,
    Checking,
    Settled,
}

/// Snapshot of the current authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    profile: Option<Profile>,
    progress: Progress,
}

impl Session {
    /// The state at application start: nothing known, loading.
    #[must_use]
    pub fn uninitialized() -> Self {
        Self {
            identity: None,
            profile: None,
            progress: Progress::Uninitialized,
        }
    }

    /// Settled with nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            identity: None,
            profile: None,
            progress: Progress::Settled,
        }
    }

    /// Settled for `identity`.
    ///
    /// A profile belonging to a different identity is dropped.
    #[must_use]
    pub fn authenticated(identity: Identity, profile: Option<Profile>) -> Self {
        let profile = profile.filter(|p| p.id() == identity.id());
        Self {
            identity: Some(identity),
            profile,
            progress: Progress::Settled,
        }
    }

    /// A check in flight, showing `identity` (and `profile`, when it
    /// belongs to that identity) until the check settles.
    #[must_use]
    pub fn checking(identity: Option<Identity>, profile: Option<Profile>) -> Self {
        let profile = match &identity {
            Some(identity) => profile.filter(|p| p.id() == identity.id()),
            None => None,
        };
        Self {
            identity,
            profile,
            progress: Progress::Checking,
        }
    }

    /// Returns the same identity and profile, marked as in flight.
    #[must_use]
    pub fn to_checking(&self) -> Self {
        Self::checking(self.identity.clone(), self.profile.clone())
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn identity_id(&self) -> Option<&IdentityId> {
        self.identity.as_ref().map(Identity::id)
    }

    /// The profile, if resolved. While [`Session::loading`] is true an
    /// absent profile means "not known yet", not "does not exist".
    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(Profile::role)
    }

    /// True until the first check settles, and during every later check.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.progress != Progress::Settled
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (self.progress, &self.identity) {
            (Progress::Uninitialized, _) => SessionPhase::Uninitialized,
            (Progress::Checking, _) => SessionPhase::Checking,
            (Progress::Settled, Some(_)) => SessionPhase::Authenticated,
            (Progress::Settled, None) => SessionPhase::Anonymous,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::uninitialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str) -> Identity {
        Identity::new(IdentityId::new(id), Some(format!("{id}@example.com")))
    }

    fn profile(id: &str, role: Role) -> Profile {
        Profile::new(IdentityId::new(id), format!("{id}@example.com"), role)
    }

    #[test]
    fn starts_uninitialized_and_loading() {
        let session = Session::default();
        assert_eq!(session.phase(), SessionPhase::Uninitialized);
        assert!(session.loading());
        assert!(session.identity().is_none());
        assert!(session.profile().is_none());
    }

    #[test]
    fn anonymous_is_settled() {
        let session = Session::anonymous();
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert!(!session.loading());
    }

    #[test]
    fn authenticated_keeps_matching_profile() {
        let session = Session::authenticated(identity("a"), Some(profile("a", Role::Client)));
        assert_eq!(session.phase(), SessionPhase::Authenticated);
        assert_eq!(session.role(), Some(Role::Client));
    }

    #[test]
    fn authenticated_drops_foreign_profile() {
        let session = Session::authenticated(identity("a"), Some(profile("b", Role::Client)));
        assert!(session.profile().is_none());
        assert!(session.is_authenticated());
    }

    #[test]
    fn checking_without_identity_never_has_profile() {
        let session = Session::checking(None, Some(profile("a", Role::Student)));
        assert!(session.profile().is_none());
        assert!(session.loading());
        assert_eq!(session.phase(), SessionPhase::Checking);
    }

    #[test]
    fn to_checking_preserves_identity_and_profile() {
        let settled = Session::authenticated(identity("a"), Some(profile("a", Role::Student)));
        let checking = settled.to_checking();
        assert!(checking.loading());
        assert_eq!(checking.identity(), settled.identity());
        assert_eq!(checking.profile(), settled.profile());
    }
}
