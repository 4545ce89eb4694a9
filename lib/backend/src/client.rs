//! The backend client handle.
//!
//! [`BackendClient`] owns the HTTP client, the provider session (access and
//! refresh tokens plus the identity they belong to) and the list of
//! auth-change listeners. The identity, profile and marketplace calls live
//! in their own modules as further `impl BackendClient` blocks.
//!
//! Every change to the provider session is written through a
//! [`SessionStorage`], and a new client starts from whatever was saved, so
//! a page reload keeps the user signed in.

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::persist::{self, SessionStorage};
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Method, RequestBuilder, Response};
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use studentcollab_access::{AuthChange, AuthChangeSender, Identity};
use tracing::{debug, warn};

/// Seconds before expiry at which the access token is renewed.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Tokens issued by the identity provider.
#[derive(Clone, Serialize, Deserialize)]
pub(crate) struct ProviderSession {
    pub(crate) access_token: String,
    pub(crate) refresh_token: Option<String>,
    #[serde(default)]
    pub(crate) expires_at: Option<DateTime<Utc>>,
    pub(crate) identity: Identity,
}

impl ProviderSession {
    /// Whether the access token is due for renewal at `now`.
    pub(crate) fn refresh_due(&self, now: DateTime<Utc>) -> bool {
        self.refresh_token.is_some()
            && self.expires_at.is_some_and(|expires_at| {
                expires_at - TimeDelta::seconds(REFRESH_MARGIN_SECS) <= now
            })
    }
}

struct ClientInner {
    http: reqwest::Client,
    config: BackendConfig,
    storage: Arc<dyn SessionStorage>,
    session: Mutex<Option<ProviderSession>>,
    listeners: Mutex<Vec<AuthChangeSender>>,
    refreshing: AtomicBool,
}

/// Handle to the managed backend. Cheap to clone.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<ClientInner>,
}

impl BackendClient {
    /// Creates a client for `config` on the platform's session storage.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::RequestFailed`] if the HTTP client cannot be
    /// built.
    pub fn new(config: BackendConfig) -> Result<Self, Report<BackendError>> {
        Self::with_storage(config, persist::default_storage())
    }

    /// Creates a client that saves its session in `storage`, starting from
    /// the session already saved there.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::RequestFailed`] if the HTTP client cannot be
    /// built.
    pub fn with_storage(
        config: BackendConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, Report<BackendError>> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.request_timeout());
        let http = builder.build().map_err(|e| BackendError::RequestFailed {
            details: e.to_string(),
        })?;

        let restored: Option<ProviderSession> = persist::restore(storage.as_ref());
        if let Some(session) = &restored {
            debug!(identity_id = %session.identity.id(), "restored saved session");
        }

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                storage,
                session: Mutex::new(restored),
                listeners: Mutex::new(Vec::new()),
                refreshing: AtomicBool::new(false),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    /// Identity of the current provider session, if any.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.session().as_ref().map(|s| s.identity.clone())
    }

    /// Public download URL for a stored resume.
    #[must_use]
    pub fn resume_public_url(&self, path: &str) -> String {
        self.inner.config.resume_public_url(path)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(crate) fn session(&self) -> MutexGuard<'_, Option<ProviderSession>> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Whether the access token should be renewed now.
    #[must_use]
    pub fn refresh_due(&self) -> bool {
        self.session()
            .as_ref()
            .is_some_and(|s| s.refresh_due(Utc::now()))
    }

    pub(crate) fn refreshing(&self) -> &AtomicBool {
        &self.inner.refreshing
    }

    pub(crate) fn store_session(&self, session: ProviderSession) {
        self.persist(&session);
        *self.session() = Some(session);
    }

    pub(crate) fn take_session(&self) -> Option<ProviderSession> {
        self.inner.storage.clear();
        self.session().take()
    }

    /// Replaces the session's identity with a fresher copy from the
    /// provider. Returns true when anything about it changed.
    pub(crate) fn update_identity(&self, identity: &Identity) -> bool {
        let mut guard = self.session();
        let Some(session) = guard.as_mut() else {
            return false;
        };
        if session.identity == *identity {
            return false;
        }
        session.identity = identity.clone();
        let updated = session.clone();
        drop(guard);
        self.persist(&updated);
        true
    }

    fn persist(&self, session: &ProviderSession) {
        match serde_json::to_string(session) {
            Ok(raw) => self.inner.storage.save(&raw),
            Err(e) => warn!(error = %e, "could not serialize session"),
        }
    }

    pub(crate) fn require_identity(&self) -> Result<Identity, BackendError> {
        self.current_identity().ok_or(BackendError::NotSignedIn)
    }

    /// Bearer token for data requests: the user's access token when signed
    /// in, otherwise the anon key.
    pub(crate) fn bearer(&self) -> String {
        self.session()
            .as_ref()
            .map_or_else(|| self.inner.config.anon_key().to_string(), |s| s.access_token.clone())
    }

    /// Registers a listener for auth changes.
    pub(crate) fn add_listener(&self, listener: AuthChangeSender) {
        let mut listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        listeners.retain(|l| !l.is_closed());
        listeners.push(listener);
    }

    /// Delivers `change` to every live listener, dropping closed ones.
    pub(crate) fn emit(&self, change: AuthChange) {
        let mut listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        listeners.retain(|l| l.send(change.clone()));
        debug!(event = %change.event, listeners = listeners.len(), "auth change emitted");
    }

    /// Starts a request against a table's REST endpoint.
    pub(crate) fn rest(&self, method: Method, table: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, self.inner.config.rest_url(table))
            .header("apikey", self.inner.config.anon_key())
            .bearer_auth(self.bearer())
    }

    /// Starts a request against an identity endpoint.
    pub(crate) fn auth_request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, self.inner.config.auth_url(endpoint))
            .header("apikey", self.inner.config.anon_key())
    }

    /// Sends a data request and decodes the JSON body.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, Report<BackendError>> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "backend request failed");
            BackendError::RequestFailed {
                details: e.to_string(),
            }
        })?;
        let response = ensure_success(response).await?;
        let body = response.text().await.map_err(|e| BackendError::RequestFailed {
            details: e.to_string(),
        })?;
        serde_json::from_str(&body).map_err(|e| {
            BackendError::InvalidResponse {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "backend returned error");
    Err(BackendError::Rejected {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pulls a human-readable message out of a backend error body.
///
/// The REST layer uses `message`, the identity layer `msg` or
/// `error_description`; anything unparseable is returned as is.
pub(crate) fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        msg: Option<String>,
        error_description: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.msg).or(b.error_description))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStorage;
    use studentcollab_access::AuthSubscription;
    use studentcollab_core::IdentityId;

    fn session(id: &str, expires_at: Option<DateTime<Utc>>) -> ProviderSession {
        ProviderSession {
            access_token: format!("{id}-token"),
            refresh_token: Some(format!("{id}-refresh")),
            expires_at,
            identity: Identity::new(IdentityId::new(id), Some(format!("{id}@example.com"))),
        }
    }

    fn config() -> BackendConfig {
        BackendConfig::new("http://localhost:54321".to_string(), "anon-key".to_string())
    }

    fn client() -> BackendClient {
        BackendClient::new(BackendConfig::new(
            "http://localhost:54321".to_string(),
            "anon-key".to_string(),
        ))
        .expect("client")
    }

    #[test]
    fn bearer_falls_back_to_anon_key() {
        let client = client();
        assert_eq!(client.bearer(), "anon-key");

        client.store_session(ProviderSession {
            access_token: "user-token".to_string(),
            refresh_token: None,
            expires_at: None,
            identity: Identity::new(IdentityId::new("u1"), None),
        });
        assert_eq!(client.bearer(), "user-token");
        assert_eq!(
            client.current_identity().map(|i| i.id().clone()),
            Some(IdentityId::new("u1"))
        );
    }

    #[test]
    fn saved_session_survives_a_new_client() {
        let storage = MemoryStorage::default();
        let first = BackendClient::with_storage(config(), Arc::new(storage.clone())).expect("client");
        first.store_session(session("u1", None));

        let reloaded =
            BackendClient::with_storage(config(), Arc::new(storage.clone())).expect("client");
        assert_eq!(
            reloaded.current_identity().map(|i| i.id().clone()),
            Some(IdentityId::new("u1"))
        );
        assert_eq!(reloaded.bearer(), "u1-token");

        reloaded.take_session();
        assert!(storage.load().is_none());
        let after_sign_out =
            BackendClient::with_storage(config(), Arc::new(storage)).expect("client");
        assert!(after_sign_out.current_identity().is_none());
    }

    #[test]
    fn identity_update_is_saved() {
        let storage = MemoryStorage::default();
        let client = BackendClient::with_storage(config(), Arc::new(storage.clone())).expect("client");
        client.store_session(session("u1", None));

        let same = Identity::new(IdentityId::new("u1"), Some("u1@example.com".to_string()));
        assert!(!client.update_identity(&same));
        let changed = Identity::new(IdentityId::new("u1"), Some("new@example.com".to_string()));
        assert!(client.update_identity(&changed));

        let reloaded = BackendClient::with_storage(config(), Arc::new(storage)).expect("client");
        assert_eq!(
            reloaded.current_identity().and_then(|i| i.email().map(str::to_string)),
            Some("new@example.com".to_string())
        );
    }

    #[test]
    fn refresh_is_due_inside_the_margin() {
        let now = Utc::now();
        assert!(session("u1", Some(now + TimeDelta::seconds(30))).refresh_due(now));
        assert!(session("u1", Some(now - TimeDelta::seconds(5))).refresh_due(now));
        assert!(!session("u1", Some(now + TimeDelta::minutes(30))).refresh_due(now));
        assert!(!session("u1", None).refresh_due(now));

        let mut without_refresh_token = session("u1", Some(now));
        without_refresh_token.refresh_token = None;
        assert!(!without_refresh_token.refresh_due(now));
    }

    #[test]
    fn require_identity_without_session() {
        assert_eq!(
            client().require_identity().unwrap_err(),
            BackendError::NotSignedIn
        );
    }

    #[test]
    fn emit_drops_closed_listeners() {
        let client = client();
        let (open_tx, _open) = AuthSubscription::channel();
        let (closed_tx, closed) = AuthSubscription::channel();
        client.add_listener(open_tx);
        client.add_listener(closed_tx);
        closed.unsubscribe();

        client.emit(AuthChange::signed_out());

        let listeners = client.inner.listeners.lock().unwrap();
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn error_message_reads_known_shapes() {
        assert_eq!(
            error_message(r#"{"code":"23505","message":"duplicate key"}"#),
            "duplicate key"
        );
        assert_eq!(
            error_message(r#"{"code":422,"msg":"User already registered"}"#),
            "User already registered"
        );
        assert_eq!(error_message("  gateway timeout "), "gateway timeout");
    }
}
