//! Identity provider calls (GoTrue).

use crate::client::{BackendClient, ProviderSession, error_message};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Method, Response, StatusCode};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use studentcollab_access::{
    AuthChange, AuthError, AuthEvent, AuthService, AuthSubscription, Identity, SignUpMetadata,
    SignUpOutcome,
};
use std::sync::atomic::Ordering;
use studentcollab_core::IdentityId;
use tracing::{debug, info, instrument, warn};

/// User object as the identity provider returns it.
#[derive(Debug, Deserialize)]
struct UserRecord {
    id: IdentityId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
}

impl From<UserRecord> for Identity {
    fn from(user: UserRecord) -> Self {
        Identity::new(user.id, user.email).with_email_confirmed(user.email_confirmed_at.is_some())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    expires_in: Option<i64>,
    /// Expiry of the access token as a unix timestamp.
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserRecord,
}

impl TokenResponse {
    fn into_session(self, issued_at: DateTime<Utc>) -> ProviderSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| issued_at + TimeDelta::seconds(secs)));
        ProviderSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            identity: self.user.into(),
        }
    }
}

/// Sign-up answers with a full session when email confirmation is off and
/// with the bare user object when it is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    Pending(UserRecord),
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a SignUpMetadata,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorCode {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Maps an identity provider error response onto [`AuthError`].
///
/// `email` is the address the request was made for.
pub(crate) fn auth_failure(status: StatusCode, body: &str, email: &str) -> AuthError {
    let code = serde_json::from_str::<ErrorCode>(body)
        .ok()
        .and_then(|c| c.error_code.or(c.error))
        .unwrap_or_default();
    let message = error_message(body);
    let lowered = message.to_lowercase();

    match code.as_str() {
        "invalid_grant" | "invalid_credentials" | "email_not_confirmed" => {
            return AuthError::InvalidCredential { reason: message };
        }
        "user_already_exists" | "email_exists" => {
            return AuthError::DuplicateAccount {
                email: email.to_string(),
            };
        }
        "weak_password" => return AuthError::WeakCredential { reason: message },
        _ => {}
    }

    if lowered.contains("already registered") {
        AuthError::DuplicateAccount {
            email: email.to_string(),
        }
    } else if lowered.contains("password should") {
        AuthError::WeakCredential { reason: message }
    } else if status == StatusCode::BAD_REQUEST && lowered.contains("invalid login") {
        AuthError::InvalidCredential { reason: message }
    } else {
        AuthError::ProviderError {
            reason: format!("HTTP {}: {}", status.as_u16(), message),
        }
    }
}

fn network_failure(e: &reqwest::Error) -> AuthError {
    AuthError::NetworkFailure {
        details: e.to_string(),
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: Response,
    email: &str,
) -> Result<T, AuthError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| network_failure(&e))?;
    if !status.is_success() {
        return Err(auth_failure(status, &body, email));
    }
    serde_json::from_str(&body).map_err(|e| AuthError::ProviderError {
        reason: format!("unexpected response: {e}"),
    })
}

impl BackendClient {
    /// Exchanges the refresh token for a new access token.
    ///
    /// Emits `TOKEN_REFRESHED` on success. A rejected refresh token ends the
    /// session and emits `SIGNED_OUT`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] when there is nothing to
    /// refresh or the provider rejects the token.
    #[instrument(skip(self))]
    pub async fn refresh_session(&self) -> Result<Identity, Report<AuthError>> {
        let refresh_token = self
            .session()
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
            .ok_or_else(|| AuthError::InvalidCredential {
                reason: "no session to refresh".to_string(),
            })?;

        let response = self
            .auth_request(Method::POST, "token")
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| network_failure(&e))?;

        match decode::<TokenResponse>(response, "").await {
            Ok(tokens) => {
                let session = tokens.into_session(Utc::now());
                let identity = session.identity.clone();
                self.store_session(session);
                debug!(identity_id = %identity.id(), "session refreshed");
                self.emit(AuthChange::new(AuthEvent::TokenRefreshed, Some(identity.clone())));
                Ok(identity)
            }
            Err(e) => {
                if matches!(e, AuthError::InvalidCredential { .. }) {
                    warn!(error = %e, "refresh token rejected; ending session");
                    self.take_session();
                    self.emit(AuthChange::signed_out());
                }
                Err(e.into())
            }
        }
    }

    /// Renews the access token when it is close to expiry.
    ///
    /// Returns `Ok(false)` when nothing was due or a renewal is already
    /// running.
    ///
    /// # Errors
    ///
    /// Whatever [`Self::refresh_session`] returns.
    pub async fn refresh_if_due(&self) -> Result<bool, Report<AuthError>> {
        if !self.refresh_due() || self.refreshing().swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        let result = self.refresh_session().await;
        self.refreshing().store(false, Ordering::Release);
        result.map(|_| true)
    }

    /// Records the provider's current view of the signed-in user and emits
    /// `USER_UPDATED` when it differs from the saved one.
    fn adopt_user(&self, identity: &Identity) {
        if self.update_identity(identity) {
            debug!(identity_id = %identity.id(), "account data changed");
            self.emit(AuthChange::new(AuthEvent::UserUpdated, Some(identity.clone())));
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Option<Identity>, AuthError> {
        let response = self
            .auth_request(Method::GET, "user")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| network_failure(&e))?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        let user: UserRecord = decode(response, "").await?;
        Ok(Some(user.into()))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AuthService for BackendClient {
    #[instrument(skip(self))]
    async fn current_session(&self) -> Result<Option<Identity>, AuthError> {
        let Some(access_token) = self.session().as_ref().map(|s| s.access_token.clone()) else {
            return Ok(None);
        };

        if let Some(identity) = self.fetch_user(&access_token).await? {
            self.adopt_user(&identity);
            return Ok(Some(identity));
        }

        debug!("access token expired; attempting refresh");
        match self.refresh_session().await {
            Ok(identity) => Ok(Some(identity)),
            Err(report) => match report.current_context() {
                AuthError::InvalidCredential { .. } => Ok(None),
                other => Err(other.clone()),
            },
        }
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        let (tx, subscription) = AuthSubscription::channel();
        tx.send(AuthChange::new(
            AuthEvent::InitialSession,
            self.current_identity(),
        ));
        self.add_listener(tx);
        subscription
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let response = self
            .auth_request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(|e| network_failure(&e))?;

        let session = decode::<TokenResponse>(response, email)
            .await?
            .into_session(Utc::now());
        let identity = session.identity.clone();
        self.store_session(session);
        info!(identity_id = %identity.id(), "provider session issued");
        self.emit(AuthChange::new(AuthEvent::SignedIn, Some(identity.clone())));
        Ok(identity)
    }

    #[instrument(skip(self, password, metadata), fields(role = %metadata.role))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .auth_request(Method::POST, "signup")
            .json(&SignUpRequest {
                email,
                password,
                data: metadata,
            })
            .send()
            .await
            .map_err(|e| network_failure(&e))?;

        match decode::<SignUpResponse>(response, email).await? {
            SignUpResponse::Session(tokens) => {
                let session = tokens.into_session(Utc::now());
                let identity = session.identity.clone();
                self.store_session(session);
                info!(identity_id = %identity.id(), "account created with session");
                self.emit(AuthChange::new(AuthEvent::SignedIn, Some(identity.clone())));
                Ok(SignUpOutcome::SignedIn(identity))
            }
            SignUpResponse::Pending(user) => {
                info!(identity_id = %user.id, "account created; awaiting email confirmation");
                Ok(SignUpOutcome::VerificationRequired {
                    email: user.email.unwrap_or_else(|| email.to_string()),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.take_session() else {
            return Ok(());
        };
        self.emit(AuthChange::signed_out());

        let response = self
            .auth_request(Method::POST, "logout")
            .query(&[("scope", "local")])
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| network_failure(&e))?;

        let status = response.status();
        if status.is_success()
            || matches!(status, StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND)
        {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(auth_failure(status, &body, session.identity.email().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    fn client() -> BackendClient {
        BackendClient::new(BackendConfig::new(
            "http://127.0.0.1:9".to_string(),
            "anon".to_string(),
        ))
        .expect("client")
    }

    #[test]
    fn invalid_grant_is_invalid_credential() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            auth_failure(StatusCode::BAD_REQUEST, body, "a@b.c"),
            AuthError::InvalidCredential {
                reason: "Invalid login credentials".to_string()
            }
        );
    }

    #[test]
    fn error_code_shape_is_understood() {
        let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        assert!(matches!(
            auth_failure(StatusCode::BAD_REQUEST, body, "a@b.c"),
            AuthError::InvalidCredential { .. }
        ));
    }

    #[test]
    fn existing_user_is_duplicate_account() {
        let body = r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#;
        assert_eq!(
            auth_failure(StatusCode::UNPROCESSABLE_ENTITY, body, "a@b.c"),
            AuthError::DuplicateAccount {
                email: "a@b.c".to_string()
            }
        );
        let legacy = r#"{"msg":"User already registered"}"#;
        assert!(matches!(
            auth_failure(StatusCode::BAD_REQUEST, legacy, "a@b.c"),
            AuthError::DuplicateAccount { .. }
        ));
    }

    #[test]
    fn weak_password_is_weak_credential() {
        let body = r#"{"code":422,"error_code":"weak_password","msg":"Password should contain at least one character of each"}"#;
        assert!(matches!(
            auth_failure(StatusCode::UNPROCESSABLE_ENTITY, body, "a@b.c"),
            AuthError::WeakCredential { .. }
        ));
    }

    #[test]
    fn other_failures_are_provider_errors() {
        let err = auth_failure(StatusCode::INTERNAL_SERVER_ERROR, "upstream down", "a@b.c");
        assert_eq!(
            err,
            AuthError::ProviderError {
                reason: "HTTP 500: upstream down".to_string()
            }
        );
    }

    #[test]
    fn sign_up_response_shapes() {
        let session = r#"{"access_token":"t","refresh_token":"r","user":{"id":"u1","email":"a@b.c","email_confirmed_at":"2024-01-01T00:00:00Z"}}"#;
        match serde_json::from_str::<SignUpResponse>(session).expect("session") {
            SignUpResponse::Session(tokens) => {
                let identity: Identity = tokens.user.into();
                assert!(identity.email_confirmed());
            }
            SignUpResponse::Pending(_) => panic!("expected a session"),
        }

        let pending = r#"{"id":"u2","email":"c@d.e","confirmation_sent_at":"2024-01-01T00:00:00Z"}"#;
        assert!(matches!(
            serde_json::from_str::<SignUpResponse>(pending).expect("pending"),
            SignUpResponse::Pending(_)
        ));
    }

    #[test]
    fn token_expiry_prefers_absolute_timestamp() {
        let issued_at = DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp");
        let absolute = r#"{"access_token":"t","refresh_token":"r","expires_in":3600,"expires_at":1700000500,"user":{"id":"u1"}}"#;
        let session = serde_json::from_str::<TokenResponse>(absolute)
            .expect("tokens")
            .into_session(issued_at);
        assert_eq!(session.expires_at, DateTime::from_timestamp(1_700_000_500, 0));

        let relative = r#"{"access_token":"t","refresh_token":"r","expires_in":3600,"user":{"id":"u1"}}"#;
        let session = serde_json::from_str::<TokenResponse>(relative)
            .expect("tokens")
            .into_session(issued_at);
        assert_eq!(session.expires_at, Some(issued_at + TimeDelta::hours(1)));
    }

    #[tokio::test]
    async fn changed_account_data_emits_user_updated() {
        let client = client();
        let user = |email: &str| UserRecord {
            id: IdentityId::new("u1"),
            email: Some(email.to_string()),
            email_confirmed_at: None,
        };
        let tokens = TokenResponse {
            access_token: "t".to_string(),
            refresh_token: Some("r".to_string()),
            expires_in: None,
            expires_at: None,
            user: user("old@example.com"),
        };
        client.store_session(tokens.into_session(Utc::now()));
        let mut subscription = client.on_auth_state_change();
        assert_eq!(
            subscription.next().await.map(|c| c.event),
            Some(AuthEvent::InitialSession)
        );

        client.adopt_user(&user("old@example.com").into());
        client.adopt_user(&user("new@example.com").into());
        client.emit(AuthChange::signed_out());

        let change = subscription.next().await.expect("update");
        assert_eq!(change.event, AuthEvent::UserUpdated);
        assert_eq!(
            change.identity.as_ref().and_then(Identity::email),
            Some("new@example.com")
        );
        assert_eq!(
            subscription.next().await.map(|c| c.event),
            Some(AuthEvent::SignedOut)
        );
    }

    #[tokio::test]
    async fn refresh_if_due_without_session_does_nothing() {
        assert_eq!(client().refresh_if_due().await.ok(), Some(false));
    }

    #[tokio::test]
    async fn sign_out_without_session_is_a_no_op() {
        let client = client();
        client.sign_out().await.expect("sign out");
        client.sign_out().await.expect("second sign out");
    }

    #[tokio::test]
    async fn current_session_without_tokens_is_none() {
        assert_eq!(client().current_session().await, Ok(None));
    }

    #[tokio::test]
    async fn new_listener_receives_initial_session() {
        let client = client();
        let mut subscription = client.on_auth_state_change();
        let change = subscription.next().await.expect("initial change");
        assert_eq!(change.event, AuthEvent::InitialSession);
        assert!(change.identity.is_none());
    }
}
