//! Client for the studentcollab managed backend.
//!
//! The backend provides three services behind one base URL:
//! - Identity (`/auth/v1`): password sign-in, sign-up, sign-out, token refresh
//! - Tables (`/rest/v1`): profiles, projects and applications
//! - Storage (`/storage/v1`): the public resume bucket
//!
//! The provider session is saved through a [`SessionStorage`] (the
//! browser's `localStorage` in wasm builds) and restored on startup.
//!
//! [`BackendClient`] implements the access crate's `AuthService` and
//! `ProfileStore`, so a session store can be built directly on it:
//!
//! ```no_run
//! use studentcollab_access::SessionStore;
//! use studentcollab_backend::{BackendClient, BackendConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BackendConfig::new(
//!     "https://abcd.supabase.co".to_string(),
//!     "public-anon-key".to_string(),
//! );
//! let client = BackendClient::new(config).map_err(|e| e.to_string())?;
//! let store = SessionStore::new(client.clone(), client);
//! store.initialize().await.map_err(|e| e.to_string())?;
//! # Ok(())
//! # }
//! ```

mod auth;
pub mod client;
pub mod config;
pub mod error;
mod marketplace;
pub mod persist;
mod profiles;

pub use client::BackendClient;
pub use config::{BackendConfig, BackendConfigBuilder};
pub use error::BackendError;
pub use persist::{MemoryStorage, SessionStorage};
