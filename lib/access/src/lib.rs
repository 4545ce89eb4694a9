//! Session state, route guarding and navigation for studentcollab.
//!
//! This crate provides:
//! - The identity session store (`SessionStore`), the single writer of the
//!   published `Session` snapshot
//! - Profile resolution (`ProfileResolver`) and the closed `Role` enum
//! - The route guard (`can_access`, `RouteGuard`)
//! - The navigation presenter (`NavigationPresenter`)
//! - Contracts for the identity provider and profile store
//!   (`AuthService`, `ProfileStore`)
//!
//! # Session model
//!
//! A session is `{identity?, profile?, loading}`. While `loading` is true an
//! absent profile means "not known yet"; the guard answers `Pending` and the
//! navigation bar shows only public links. An identity without a profile is
//! signed in but roleless, and fails every role-gated check.
//!
//! # Example
//!
//! ```
//! use studentcollab_access::{
//!     AccessConfig, Decision, NavAction, NavigationPresenter, RouteGuard, Session,
//! };
//!
//! let guard = RouteGuard::marketplace(&AccessConfig::default());
//!
//! // Nothing is known yet: wait.
//! assert_eq!(guard.check(&Session::uninitialized(), "/post-project"), Decision::Pending);
//!
//! // Settled with nobody signed in: send them home.
//! let anonymous = Session::anonymous();
//! assert_eq!(
//!     guard.check(&anonymous, "/post-project"),
//!     Decision::DenyRedirect("/".to_string())
//! );
//! assert_eq!(NavigationPresenter::actions(&anonymous)[0], NavAction::SignIn);
//! ```

pub mod error;
pub mod guard;
pub mod identity;
pub mod nav;
pub mod notice;
pub mod profile;
pub mod provider;
pub mod resolver;
pub mod role;
pub mod session;
pub mod store;

// Re-export main types at crate root
pub use error::{AuthError, CredentialError, MIN_PASSWORD_LEN, ProfileError};
pub use guard::{AccessConfig, Decision, RouteAccessPolicy, RouteGuard, can_access};
pub use identity::{Credential, Identity, SignUpMetadata};
pub use nav::{NavAction, NavIntent, NavigationPresenter};
pub use notice::{Notice, NoticeLevel};
pub use profile::{Profile, ProfileRecord};
pub use provider::{
    AuthChange, AuthChangeSender, AuthEvent, AuthService, AuthSubscription, ProfileStore,
    SignUpOutcome,
};
pub use resolver::ProfileResolver;
pub use role::{Role, RoleSet, UnknownRole};
pub use session::{Session, SessionPhase};
pub use store::SessionStore;
