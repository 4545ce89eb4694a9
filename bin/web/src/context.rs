//! Client-side application context.
//!
//! [`AppContext`] is provided once by the root component. It mirrors the
//! session store's snapshot into a signal, turns the store's notices into
//! toasts and holds the backend handle the pages use for marketplace calls.
//! While the store runs, a timer renews the access token before it expires.
//! The store itself only exists in the browser; during server rendering the
//! session stays uninitialized and guarded pages render their loading view.

use crate::config::WebConfig;
use crate::error::WebError;
use leptos::leptos_dom::helpers::{IntervalHandle, set_interval_with_handle};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::time::Duration;
use studentcollab_access::{AccessConfig, Notice, RouteGuard, Session, SessionStore};
use studentcollab_backend::BackendClient;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, warn};

/// How long a toast stays up before it is dismissed.
const TOAST_DURATION: Duration = Duration::from_secs(5);

/// How often the access token's expiry is checked.
const REFRESH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

pub type Store = SessionStore<BackendClient, BackendClient>;

/// Which form the auth modal shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

/// A notice on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub notice: Notice,
}

/// Reactive handles shared by every component.
#[derive(Clone, Copy)]
pub struct AppContext {
    pub session: RwSignal<Session>,
    pub toasts: RwSignal<Vec<Toast>>,
    pub guard: RwSignal<RouteGuard>,
    pub auth_modal: RwSignal<Option<AuthMode>>,
    store: StoredValue<Option<Store>, LocalStorage>,
    refresh_timer: StoredValue<Option<IntervalHandle>>,
    next_toast: StoredValue<u64>,
}

impl AppContext {
    /// Creates the context and provides it to descendants.
    pub fn provide() -> Self {
        let context = Self {
            session: RwSignal::new(Session::uninitialized()),
            toasts: RwSignal::new(Vec::new()),
            guard: RwSignal::new(RouteGuard::marketplace(&AccessConfig::default())),
            auth_modal: RwSignal::new(None),
            store: StoredValue::new_local(None),
            refresh_timer: StoredValue::new(None),
            next_toast: StoredValue::new(0),
        };
        provide_context(context);
        context
    }

    /// The context provided by the root component.
    pub fn expect() -> Self {
        expect_context::<Self>()
    }

    /// The running session store, once the browser has started it.
    pub fn store(&self) -> Option<Store> {
        self.store.try_get_value().flatten()
    }

    /// The backend client behind the session store.
    pub fn backend(&self) -> Option<BackendClient> {
        self.store().map(|store| store.auth().clone())
    }

    /// Starts the session store against the configured backend.
    ///
    /// Snapshots and notices are bridged into signals before the store is
    /// initialized so nothing it publishes is missed.
    pub fn start(&self, config: WebConfig) {
        let backend = match BackendClient::new(config.backend) {
            Ok(backend) => backend,
            Err(report) => {
                let err = WebError::BackendUnavailable {
                    details: report.to_string(),
                };
                error!(error = %err, "could not start session store");
                self.notify(Notice::error(
                    "Could not connect",
                    "The application could not reach its backend.",
                ));
                return;
            }
        };
        let store = Store::new(backend.clone(), backend.clone());
        self.guard.set(RouteGuard::marketplace(&config.access));
        self.store.set_value(Some(store.clone()));

        self.bridge_snapshots(&store);
        self.bridge_notices(&store);
        self.schedule_refresh(backend);

        let listener = store.clone();
        spawn_local(async move { listener.listen().await });

        spawn_local(async move {
            if let Err(report) = store.initialize().await {
                warn!(error = %report, "initial session check failed");
            }
        });
    }

    /// Tears the store down. Safe to call more than once.
    pub fn shutdown(&self) {
        if let Some(timer) = self.refresh_timer.try_update_value(Option::take).flatten() {
            timer.clear();
        }
        if let Some(store) = self.store() {
            store.teardown();
        }
    }

    /// Signs out through the store, if it is running.
    pub fn sign_out(&self) {
        let Some(store) = self.store() else {
            return;
        };
        spawn_local(async move {
            if let Err(report) = store.sign_out().await {
                warn!(error = %report, "sign out did not reach the backend");
            }
        });
    }

    pub fn open_auth(&self, mode: AuthMode) {
        self.auth_modal.set(Some(mode));
    }

    /// Shows `notice` as a toast. Returns false once the context is gone.
    pub fn notify(&self, notice: Notice) -> bool {
        let Some(id) = self.next_toast.try_update_value(|next| {
            *next += 1;
            *next
        }) else {
            return false;
        };
        let toasts = self.toasts;
        if toasts.try_update(|t| t.push(Toast { id, notice })).is_none() {
            return false;
        }
        set_timeout(move || Self::remove(toasts, id), TOAST_DURATION);
        true
    }

    pub fn dismiss(&self, id: u64) {
        Self::remove(self.toasts, id);
    }

    fn remove(toasts: RwSignal<Vec<Toast>>, id: u64) {
        toasts.try_update(|t| t.retain(|toast| toast.id != id));
    }

    /// Renewal emits `TOKEN_REFRESHED` through the backend, which the
    /// store picks up like any other provider change.
    fn schedule_refresh(&self, backend: BackendClient) {
        let tick = move || {
            let backend = backend.clone();
            spawn_local(async move {
                match backend.refresh_if_due().await {
                    Ok(true) => debug!("access token renewed"),
                    Ok(false) => {}
                    Err(report) => warn!(error = %report, "access token renewal failed"),
                }
            });
        };
        match set_interval_with_handle(tick, REFRESH_CHECK_INTERVAL) {
            Ok(handle) => self.refresh_timer.set_value(Some(handle)),
            Err(e) => warn!(error = ?e, "could not schedule token renewal"),
        }
    }

    fn bridge_snapshots(&self, store: &Store) {
        let mut snapshots = store.subscribe();
        let session = self.session;
        spawn_local(async move {
            loop {
                let snapshot = snapshots.borrow_and_update().clone();
                debug!(phase = ?snapshot.phase(), "session snapshot");
                if session.try_set(snapshot).is_some() {
                    break;
                }
                if snapshots.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    fn bridge_notices(&self, store: &Store) {
        let mut notices = store.notices();
        let context = *self;
        spawn_local(async move {
            loop {
                match notices.recv().await {
                    Ok(notice) => {
                        if !context.notify(notice) {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "notices dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}
