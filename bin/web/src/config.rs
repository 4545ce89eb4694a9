//! Server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys:
//!
//! ```text
//! BACKEND__URL=https://abcd.supabase.co
//! BACKEND__ANON_KEY=...
//! ACCESS__FALLBACK_ROUTE=/
//! ```
//!
//! Everything here is safe to hand to the browser: the backend is reached
//! with its public anon key and row-level security does the rest.

use serde::{Deserialize, Serialize};
use studentcollab_access::AccessConfig;
use studentcollab_backend::BackendConfig;

/// Web configuration composed from library configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebConfig {
    /// Managed backend endpoints and keys.
    pub backend: BackendConfig,

    /// Route guard settings.
    #[serde(default)]
    pub access: AccessConfig,
}

#[cfg(feature = "ssr")]
impl WebConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_section_is_optional() {
        let config: WebConfig = serde_json::from_str(
            r#"{"backend":{"url":"https://abcd.supabase.co","anon_key":"anon"}}"#,
        )
        .expect("config");
        assert_eq!(config.access.fallback_route, "/");
        assert_eq!(config.backend.url(), "https://abcd.supabase.co");
        assert_eq!(config.backend.profiles_table(), "profiles");
    }

    #[test]
    fn fallback_route_can_be_overridden() {
        let config: WebConfig = serde_json::from_str(
            r#"{"backend":{"url":"u","anon_key":"k"},"access":{"fallback_route":"/welcome"}}"#,
        )
        .expect("config");
        assert_eq!(config.access.fallback_route, "/welcome");
    }
}
