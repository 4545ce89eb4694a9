//! The identity session store.
//!
//! [`SessionStore`] is the single writer of the [`Session`] snapshot. It
//! asks the identity provider for an existing session, listens for provider
//! changes, performs explicit sign-in, sign-up and sign-out, and resolves
//! the profile after every identity change.
//!
//! Readers never see the store's internals: they hold a
//! `watch::Receiver<Session>` and react to new snapshots.
//!
//! # Ordering
//!
//! Every piece of work that ends in a profile resolution takes a new
//! generation number when it starts. A result is applied only if its
//! generation is still the latest and the published identity is still the
//! one it resolved for; anything else is dropped. Sign-out and teardown
//! take a generation too, so an in-flight fetch can never resurrect a
//! signed-out session. Among explicit operations, the one whose provider
//! call completes last wins.
//!
//! Sign-in and sign-up also note the sign-out count before calling the
//! provider. A credential exchange that completes after a sign-out is not
//! published; the session it produced is revoked instead.

use crate::error::{AuthError, ProfileError};
use crate::identity::{Credential, Identity, SignUpMetadata};
use crate::notice::Notice;
use crate::profile::Profile;
use crate::provider::{AuthChange, AuthEvent, AuthService, ProfileStore, SignUpOutcome};
use crate::resolver::ProfileResolver;
use crate::role::Role;
use crate::session::Session;
use rootcause::prelude::Report;
use std::sync::{Arc, Mutex, MutexGuard};
use studentcollab_core::IdentityId;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, instrument, warn};

const NOTICE_CAPACITY: usize = 16;

/// Why a completed credential exchange was not published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overtaken {
    SignOut,
    Teardown,
}

#[derive(Debug, Default)]
struct Control {
    generation: u64,
    sign_outs: u64,
    subscribed: bool,
    torn_down: bool,
}

struct Inner<A, P> {
    auth: A,
    resolver: ProfileResolver<P>,
    snapshot: watch::Sender<Session>,
    notices: broadcast::Sender<Notice>,
    shutdown: watch::Sender<bool>,
    control: Mutex<Control>,
}

/// Owns the session snapshot and everything that changes it.
///
/// Cheap to clone; clones share the same state.
pub struct SessionStore<A, P> {
    inner: Arc<Inner<A, P>>,
}

impl<A, P> Clone for SessionStore<A, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: AuthService, P: ProfileStore> SessionStore<A, P> {
    /// Creates a store in the `Uninitialized` state.
    ///
    /// Nothing is requested from the provider until [`Self::initialize`]
    /// and [`Self::listen`] are called.
    pub fn new(auth: A, profiles: P) -> Self {
        let (snapshot, _) = watch::channel(Session::uninitialized());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                auth,
                resolver: ProfileResolver::new(profiles),
                snapshot,
                notices,
                shutdown,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    /// Subscribes to session snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.snapshot.subscribe()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribes to user-facing notices.
    #[must_use]
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    #[must_use]
    pub fn auth(&self) -> &A {
        &self.inner.auth
    }

    /// Runs the initial session check.
    ///
    /// Always settles the session. A provider failure settles it as
    /// anonymous and is also returned.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`AuthError`] when the check itself fails.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<(), Report<AuthError>> {
        let Some(generation) = self.begin() else {
            return Ok(());
        };
        self.publish(generation, Session::to_checking);

        match self.inner.auth.current_session().await {
            Ok(Some(identity)) => {
                debug!(identity_id = %identity.id(), "existing session found");
                self.refresh(generation, identity).await;
                Ok(())
            }
            Ok(None) => {
                debug!("no existing session");
                self.publish(generation, |_| Session::anonymous());
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "initial session check failed");
                self.publish(generation, |_| Session::anonymous());
                Err(e.into())
            }
        }
    }

    /// Listens for provider changes until [`Self::teardown`].
    ///
    /// Only the first call subscribes; later calls, and calls after
    /// teardown, return immediately.
    pub async fn listen(&self) {
        {
            let mut control = self.control();
            if control.subscribed || control.torn_down {
                debug!("auth change listener already attached");
                return;
            }
            control.subscribed = true;
        }

        let mut subscription = self.inner.auth.on_auth_state_change();
        let mut shutdown = self.inner.shutdown.subscribe();
        let already_down = *shutdown.borrow_and_update();
        if already_down {
            subscription.unsubscribe();
            return;
        }
        info!("listening for auth changes");

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                change = subscription.next() => match change {
                    Some(change) => self.handle_auth_change(change).await,
                    None => {
                        debug!("auth change stream ended");
                        break;
                    }
                },
            }
        }
        subscription.unsubscribe();
    }

    /// Applies one provider change.
    ///
    /// A `SIGNED_IN` or `INITIAL_SESSION` for the identity that is already
    /// published, with its profile resolved or in flight, is a duplicate of
    /// work the store has already done and is skipped.
    #[instrument(skip(self, change), fields(event = %change.event))]
    pub async fn handle_auth_change(&self, change: AuthChange) {
        let Some(identity) = change.identity else {
            if let Some(generation) = self.begin() {
                self.publish(generation, |_| Session::anonymous());
            }
            return;
        };

        let current = self.session();
        let same_identity = current.identity_id() == Some(identity.id());
        if same_identity
            && matches!(change.event, AuthEvent::SignedIn | AuthEvent::InitialSession)
            && (current.loading() || current.profile().is_some())
        {
            debug!(identity_id = %identity.id(), "duplicate sign-in event skipped");
            return;
        }

        let Some(generation) = self.begin() else {
            return;
        };
        self.refresh(generation, identity).await;
    }

    /// Signs in with an email and password from the sign-in form.
    ///
    /// The published session is untouched while the provider call is in
    /// flight; on success the profile is resolved before returning. A
    /// profile failure does not fail the sign-in. If the user signs out
    /// while the provider call is in flight, the sign-out stands and the
    /// new provider session is revoked.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredential`] for rejected input or credentials,
    /// [`AuthError::NetworkFailure`] or [`AuthError::ProviderError`]
    /// otherwise.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), Report<AuthError>> {
        let ticket = self.control().sign_outs;
        let result = match Credential::new(email, password) {
            Ok(credential) => {
                self.inner
                    .auth
                    .sign_in_with_password(credential.email(), credential.password())
                    .await
            }
            Err(e) => Err(AuthError::from_sign_in_input(e)),
        };

        match result {
            Ok(identity) => {
                let generation = match self.begin_since(ticket) {
                    Ok(generation) => generation,
                    Err(overtaken) => {
                        self.discard(&identity, overtaken).await;
                        return Ok(());
                    }
                };
                info!(identity_id = %identity.id(), "signed in");
                self.notify(Notice::signed_in());
                self.refresh(generation, identity).await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                self.notify(Notice::error("Error signing in", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Creates an account with `role` attached as metadata.
    ///
    /// When the provider issues a session straight away the profile is
    /// resolved as for sign-in. When it requires email verification the
    /// session is left as it was; callers inspect the returned outcome or
    /// the published session. A session issued after a concurrent sign-out
    /// is revoked, as for sign-in.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredential`] or [`AuthError::WeakCredential`]
    /// for rejected input, [`AuthError::DuplicateAccount`] when the email is
    /// taken, [`AuthError::NetworkFailure`] or [`AuthError::ProviderError`]
    /// otherwise.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<SignUpOutcome, Report<AuthError>> {
        let ticket = self.control().sign_outs;
        let result = match Credential::new(email, password) {
            Ok(credential) => {
                let metadata = SignUpMetadata::new(&credential, role);
                self.inner
                    .auth
                    .sign_up(credential.email(), credential.password(), &metadata)
                    .await
            }
            Err(e) => Err(AuthError::from_sign_up_input(e)),
        };

        match result {
            Ok(SignUpOutcome::SignedIn(identity)) => {
                info!(identity_id = %identity.id(), %role, "account created");
                match self.begin_since(ticket) {
                    Ok(generation) => {
                        self.notify(Notice::signed_up(false));
                        self.refresh(generation, identity.clone()).await;
                    }
                    Err(overtaken) => self.discard(&identity, overtaken).await,
                }
                Ok(SignUpOutcome::SignedIn(identity))
            }
            Ok(SignUpOutcome::VerificationRequired { email }) => {
                info!(%role, "account created, verification pending");
                self.notify(Notice::signed_up(true));
                Ok(SignUpOutcome::VerificationRequired { email })
            }
            Err(e) => {
                warn!(error = %e, "sign-up failed");
                self.notify(Notice::error("Error signing up", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Signs out.
    ///
    /// Local state is cleared before the provider is contacted and stays
    /// cleared whatever the provider says. Calling it again is harmless.
    /// After [`Self::teardown`] only the provider session is revoked; the
    /// last published snapshot is left alone.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`AuthError`] when remote revocation fails.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), Report<AuthError>> {
        {
            let mut control = self.control();
            if !control.torn_down {
                control.generation += 1;
                control.sign_outs += 1;
                self.inner
                    .snapshot
                    .send_if_modified(|current| replace_if_changed(current, Session::anonymous()));
            }
        }

        match self.inner.auth.sign_out().await {
            Ok(()) => {
                info!("signed out");
                self.notify(Notice::signed_out());
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "remote sign-out failed; local session already cleared");
                self.notify(Notice::error("Error signing out", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Stops the listener and discards every in-flight resolution.
    ///
    /// The last published snapshot stays readable.
    pub fn teardown(&self) {
        {
            let mut control = self.control();
            if control.torn_down {
                return;
            }
            control.torn_down = true;
            control.generation += 1;
        }
        self.inner.shutdown.send_replace(true);
        debug!("session store torn down");
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.control().torn_down
    }

    fn control(&self) -> MutexGuard<'_, Control> {
        self.inner
            .control
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Starts a new generation; `None` after teardown.
    fn begin(&self) -> Option<u64> {
        let mut control = self.control();
        if control.torn_down {
            return None;
        }
        control.generation += 1;
        Some(control.generation)
    }

    /// Starts a new generation for a credential exchange that began when
    /// the sign-out count was `ticket`.
    fn begin_since(&self, ticket: u64) -> Result<u64, Overtaken> {
        let mut control = self.control();
        if control.torn_down {
            return Err(Overtaken::Teardown);
        }
        if control.sign_outs != ticket {
            return Err(Overtaken::SignOut);
        }
        control.generation += 1;
        Ok(control.generation)
    }

    /// Drops a provider session that completed too late to publish.
    async fn discard(&self, identity: &Identity, overtaken: Overtaken) {
        match overtaken {
            Overtaken::Teardown => {
                debug!(identity_id = %identity.id(), "credential exchange finished after teardown");
            }
            Overtaken::SignOut => {
                info!(identity_id = %identity.id(), "signed out during credential exchange; revoking");
                if let Err(e) = self.inner.auth.sign_out().await {
                    warn!(error = %e, "could not revoke overtaken provider session");
                }
            }
        }
    }

    /// Publishes `next(current)` if `generation` is still the latest.
    fn publish(&self, generation: u64, next: impl FnOnce(&Session) -> Session) -> bool {
        let control = self.control();
        if control.torn_down || control.generation != generation {
            return false;
        }
        self.inner.snapshot.send_if_modified(|current| {
            let updated = next(current);
            replace_if_changed(current, updated)
        });
        true
    }

    /// Marks the session as checking for `identity`, resolves its profile
    /// and applies the result if nothing newer has started.
    async fn refresh(&self, generation: u64, identity: Identity) {
        let marked = self.publish(generation, |current| {
            if current.identity_id() == Some(identity.id()) {
                Session::checking(Some(identity.clone()), current.profile().cloned())
            } else {
                Session::checking(Some(identity.clone()), None)
            }
        });
        if !marked {
            debug!(generation, "superseded before resolution started");
            return;
        }

        let result = self.inner.resolver.resolve(identity.id()).await;
        self.settle(generation, identity, result);
    }

    fn settle(
        &self,
        generation: u64,
        identity: Identity,
        result: Result<Profile, Report<ProfileError>>,
    ) {
        let identity_id: IdentityId = identity.id().clone();
        let mut failure = None;

        let applied = self.publish(generation, |current| {
            if current.identity_id() != Some(&identity_id) {
                return current.clone();
            }
            match &result {
                Ok(profile) => Session::authenticated(identity.clone(), Some(profile.clone())),
                Err(report) => {
                    failure = Some(report.current_context().clone());
                    match report.current_context() {
                        ProfileError::NetworkFailure { .. } => {
                            Session::authenticated(identity.clone(), current.profile().cloned())
                        }
                        ProfileError::NotFound { .. } | ProfileError::InvalidRecord { .. } => {
                            Session::authenticated(identity.clone(), None)
                        }
                    }
                }
            }
        });

        if !applied {
            debug!(generation, %identity_id, "stale profile resolution discarded");
            return;
        }

        match failure {
            None => {}
            Some(ProfileError::NotFound { .. }) => {
                info!(%identity_id, "no profile for identity; continuing without a role");
            }
            Some(e @ ProfileError::InvalidRecord { .. }) => {
                warn!(%identity_id, error = %e, "profile record rejected; continuing without a role");
            }
            Some(e @ ProfileError::NetworkFailure { .. }) => {
                error!(%identity_id, error = %e, "profile refresh failed; keeping previous profile");
                self.notify(Notice::error(
                    "Could not load your profile",
                    "Some features may be unavailable until the connection recovers.",
                ));
            }
        }
    }

    fn notify(&self, notice: Notice) {
        // No receivers just means nobody is showing notices right now.
        let _ = self.inner.notices.send(notice);
    }
}

fn replace_if_changed(current: &mut Session, updated: Session) -> bool {
    if *current == updated {
        false
    } else {
        *current = updated;
        true
    }
}
