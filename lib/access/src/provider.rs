//! Contracts for the external identity provider and profile store.
//!
//! The session store depends on these traits only. The backend crate
//! implements them against the managed backend; tests implement them in
//! memory.
//!
//! Browser builds use `?Send` futures because the HTTP client there runs on
//! the JS event loop.

use crate::error::{AuthError, ProfileError};
use crate::identity::{Identity, SignUpMetadata};
use crate::profile::ProfileRecord;
use async_trait::async_trait;
use std::fmt;
use studentcollab_core::IdentityId;
use tokio::sync::mpsc;
use tracing::debug;

/// Kind of change reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthEvent {
    /// Replay of the existing session when a listener attaches.
    InitialSession,
    SignedIn,
    SignedOut,
    /// The access token was renewed; the identity is unchanged.
    TokenRefreshed,
    /// Account data (email, metadata) changed.
    UserUpdated,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
        };
        f.write_str(name)
    }
}

/// A change notification: the event and the identity it leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub identity: Option<Identity>,
}

impl AuthChange {
    #[must_use]
    pub fn new(event: AuthEvent, identity: Option<Identity>) -> Self {
        Self { event, identity }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self::new(AuthEvent::SignedOut, None)
    }
}

/// Provider-side half of an auth-change subscription.
#[derive(Debug, Clone)]
pub struct AuthChangeSender {
    tx: mpsc::UnboundedSender<AuthChange>,
}

impl AuthChangeSender {
    /// Delivers a change. Returns false once the listener has unsubscribed.
    pub fn send(&self, change: AuthChange) -> bool {
        self.tx.send(change).is_ok()
    }

    /// Returns true once the listener has unsubscribed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Listener-side half of an auth-change subscription.
///
/// Dropping it unsubscribes; the provider notices through
/// [`AuthChangeSender::is_closed`] and stops delivering.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: mpsc::UnboundedReceiver<AuthChange>,
}

impl AuthSubscription {
    /// Creates a connected sender/subscription pair.
    #[must_use]
    pub fn channel() -> (AuthChangeSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AuthChangeSender { tx }, Self { rx })
    }

    /// Waits for the next change; `None` once the provider side is gone.
    pub async fn next(&mut self) -> Option<AuthChange> {
        self.rx.recv().await
    }

    /// Stops delivery and discards anything still queued.
    pub fn unsubscribe(mut self) {
        self.rx.close();
        debug!("auth change subscription closed");
    }
}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account exists and a session was issued.
    SignedIn(Identity),
    /// The account exists but the email must be verified before signing in.
    VerificationRequired { email: String },
}

/// The identity provider.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AuthService: Send + Sync {
    /// Returns the identity of the session the provider currently holds.
    async fn current_session(&self) -> Result<Option<Identity>, AuthError>;

    /// Subscribes to auth-change notifications.
    fn on_auth_state_change(&self) -> AuthSubscription;

    /// Exchanges an email and password for a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError>;

    /// Requests account creation with metadata attached.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpOutcome, AuthError>;

    /// Revokes the current session. Succeeds when there is none.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// The table holding application profiles, keyed by identity id.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ProfileStore: Send + Sync {
    /// Fetches the profile row for `id`, if one exists.
    async fn select_profile_by_id(
        &self,
        id: &IdentityId,
    ) -> Result<Option<ProfileRecord>, ProfileError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscription_receives_sent_changes() {
        let (tx, mut subscription) = AuthSubscription::channel();
        assert!(tx.send(AuthChange::signed_out()));
        let change = subscription.next().await.expect("change");
        assert_eq!(change.event, AuthEvent::SignedOut);
        assert!(change.identity.is_none());
    }

    #[tokio::test]
    async fn unsubscribe_closes_sender() {
        let (tx, subscription) = AuthSubscription::channel();
        subscription.unsubscribe();
        assert!(tx.is_closed());
        assert!(!tx.send(AuthChange::signed_out()));
    }

    #[tokio::test]
    async fn subscription_ends_when_provider_drops() {
        let (tx, mut subscription) = AuthSubscription::channel();
        drop(tx);
        assert!(subscription.next().await.is_none());
    }

    #[test]
    fn event_names_match_provider_wire_names() {
        assert_eq!(AuthEvent::TokenRefreshed.to_string(), "TOKEN_REFRESHED");
        assert_eq!(AuthEvent::SignedIn.to_string(), "SIGNED_IN");
    }
}
