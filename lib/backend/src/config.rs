//! Managed backend configuration.
//!
//! Everything here is safe to ship to the browser: the anon key is the
//! backend's public key and only grants what row-level security allows.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the managed backend.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL (e.g., "https://abcd.supabase.co").
    url: String,
    /// Public anon key sent as `apikey` on every request.
    anon_key: String,
    /// Default: "profiles"
    #[serde(default = "default_profiles_table")]
    profiles_table: String,
    /// Default: "projects"
    #[serde(default = "default_projects_table")]
    projects_table: String,
    /// Default: "applications"
    #[serde(default = "default_applications_table")]
    applications_table: String,
    /// Storage bucket holding uploaded resumes.
    /// Default: "resumes"
    #[serde(default = "default_resume_bucket")]
    resume_bucket: String,
    /// Default: 10
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
}

fn default_profiles_table() -> String {
    "profiles".to_string()
}

fn default_projects_table() -> String {
    "projects".to_string()
}

fn default_applications_table() -> String {
    "applications".to_string()
}

fn default_resume_bucket() -> String {
    "resumes".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl BackendConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(url: String, anon_key: String) -> Self {
        BackendConfigBuilder::new(url, anon_key).build()
    }

    #[must_use]
    pub fn builder(url: String, anon_key: String) -> BackendConfigBuilder {
        BackendConfigBuilder::new(url, anon_key)
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    #[must_use]
    pub fn profiles_table(&self) -> &str {
        &self.profiles_table
    }

    #[must_use]
    pub fn projects_table(&self) -> &str {
        &self.projects_table
    }

    #[must_use]
    pub fn applications_table(&self) -> &str {
        &self.applications_table
    }

    #[must_use]
    pub fn resume_bucket(&self) -> &str {
        &self.resume_bucket
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// URL of an identity endpoint, e.g. `auth_url("token")`.
    #[must_use]
    pub fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.url(), endpoint)
    }

    /// URL of a table's REST endpoint.
    #[must_use]
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url(), table)
    }

    /// Public download URL for a resume stored at `path` in the resume bucket.
    #[must_use]
    pub fn resume_public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.url(),
            self.resume_bucket,
            path.trim_start_matches('/')
        )
    }
}

/// Builder for `BackendConfig`.
#[derive(Debug)]
pub struct BackendConfigBuilder {
    url: String,
    anon_key: String,
    profiles_table: String,
    projects_table: String,
    applications_table: String,
    resume_bucket: String,
    request_timeout: Duration,
}

impl BackendConfigBuilder {
    #[must_use]
    pub fn new(url: String, anon_key: String) -> Self {
        Self {
            url,
            anon_key,
            profiles_table: default_profiles_table(),
            projects_table: default_projects_table(),
            applications_table: default_applications_table(),
            resume_bucket: default_resume_bucket(),
            request_timeout: Duration::from_secs(default_request_timeout_secs()),
        }
    }

    #[must_use]
    pub fn profiles_table(mut self, table: String) -> Self {
        self.profiles_table = table;
        self
    }

    #[must_use]
    pub fn projects_table(mut self, table: String) -> Self {
        self.projects_table = table;
        self
    }

    #[must_use]
    pub fn applications_table(mut self, table: String) -> Self {
        self.applications_table = table;
        self
    }

    #[must_use]
    pub fn resume_bucket(mut self, bucket: String) -> Self {
        self.resume_bucket = bucket;
        self
    }

    /// Sets the per-request timeout; sub-second precision is dropped.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn build(self) -> BackendConfig {
        BackendConfig {
            url: self.url,
            anon_key: self.anon_key,
            profiles_table: self.profiles_table,
            projects_table: self.projects_table,
            applications_table: self.applications_table,
            resume_bucket: self.resume_bucket,
            request_timeout_secs: self.request_timeout.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BackendConfig {
        BackendConfig::new("https://abcd.supabase.co/".to_string(), "anon".to_string())
    }

    #[test]
    fn new_config_has_defaults() {
        let config = config();
        assert_eq!(config.url(), "https://abcd.supabase.co");
        assert_eq!(config.profiles_table(), "profiles");
        assert_eq!(config.projects_table(), "projects");
        assert_eq!(config.applications_table(), "applications");
        assert_eq!(config.resume_bucket(), "resumes");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn endpoint_urls() {
        let config = config();
        assert_eq!(
            config.auth_url("token"),
            "https://abcd.supabase.co/auth/v1/token"
        );
        assert_eq!(
            config.rest_url("projects"),
            "https://abcd.supabase.co/rest/v1/projects"
        );
    }

    #[test]
    fn resume_public_url_uses_bucket() {
        assert_eq!(
            config().resume_public_url("u1/p1_1700000000.pdf"),
            "https://abcd.supabase.co/storage/v1/object/public/resumes/u1/p1_1700000000.pdf"
        );
    }

    #[test]
    fn builder_allows_customization() {
        let config = BackendConfig::builder("http://localhost:54321".to_string(), "anon".to_string())
            .resume_bucket("cvs".to_string())
            .request_timeout(Duration::from_secs(3))
            .build();
        assert_eq!(config.resume_bucket(), "cvs");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{"url": "http://localhost:54321", "anon_key": "anon"}"#;
        let config: BackendConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.profiles_table(), "profiles");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }
}
