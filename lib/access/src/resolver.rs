//! Profile resolution.
//!
//! Turns an identity id into a validated [`Profile`]. Lookups always go to
//! the profile store; nothing is cached between identities.

use crate::error::ProfileError;
use crate::profile::Profile;
use crate::provider::ProfileStore;
use rootcause::prelude::Report;
use studentcollab_core::IdentityId;
use tracing::{debug, instrument};

/// Fetches and validates application profiles.
pub struct ProfileResolver<P> {
    store: P,
}

impl<P: ProfileStore> ProfileResolver<P> {
    #[must_use]
    pub fn new(store: P) -> Self {
        Self { store }
    }

    /// Returns the underlying profile store.
    #[must_use]
    pub fn store(&self) -> &P {
        &self.store
    }

    /// Resolves the profile for `identity_id`.
    ///
    /// # Errors
    ///
    /// - [`ProfileError::NotFound`] when no row exists
    /// - [`ProfileError::InvalidRecord`] when the row is keyed to another
    ///   identity or carries an unknown role
    /// - [`ProfileError::NetworkFailure`] when the store is unreachable
    #[instrument(skip(self, identity_id), fields(identity_id = %identity_id))]
    pub async fn resolve(&self, identity_id: &IdentityId) -> Result<Profile, Report<ProfileError>> {
        let record = self
            .store
            .select_profile_by_id(identity_id)
            .await?
            .ok_or_else(|| ProfileError::NotFound {
                identity_id: identity_id.clone(),
            })?;

        if record.id != *identity_id {
            return Err(ProfileError::InvalidRecord {
                identity_id: identity_id.clone(),
                reason: format!("record is keyed to {}", record.id),
            }
            .into());
        }

        let profile = Profile::try_from(record)?;
        debug!(role = %profile.role(), "profile resolved");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileRecord;
    use crate::role::Role;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FixedProfiles {
        rows: HashMap<IdentityId, ProfileRecord>,
        offline: bool,
    }

    #[async_trait]
    impl ProfileStore for FixedProfiles {
        async fn select_profile_by_id(
            &self,
            id: &IdentityId,
        ) -> Result<Option<ProfileRecord>, ProfileError> {
            if self.offline {
                return Err(ProfileError::NetworkFailure {
                    details: "connection refused".to_string(),
                });
            }
            Ok(self.rows.get(id).cloned())
        }
    }

    fn row(key: &str, id: &str, role: &str) -> (IdentityId, ProfileRecord) {
        (
            IdentityId::new(key),
            ProfileRecord {
                id: IdentityId::new(id),
                email: Some(format!("{id}@example.com")),
                role: role.to_string(),
                full_name: None,
                avatar_url: None,
            },
        )
    }

    fn resolver(rows: Vec<(IdentityId, ProfileRecord)>, offline: bool) -> ProfileResolver<FixedProfiles> {
        ProfileResolver::new(FixedProfiles {
            rows: rows.into_iter().collect(),
            offline,
        })
    }

    #[tokio::test]
    async fn resolves_existing_profile() {
        let resolver = resolver(vec![row("u1", "u1", "student")], false);
        let profile = resolver
            .resolve(&IdentityId::new("u1"))
            .await
            .expect("profile");
        assert_eq!(profile.role(), Role::Student);
    }

    #[tokio::test]
    async fn missing_row_is_not_found() {
        let resolver = resolver(Vec::new(), false);
        let err = resolver.resolve(&IdentityId::new("u1")).await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProfileError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn unknown_role_is_invalid_record() {
        let resolver = resolver(vec![row("u1", "u1", "admin")], false);
        let err = resolver.resolve(&IdentityId::new("u1")).await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProfileError::InvalidRecord { .. }
        ));
    }

    #[tokio::test]
    async fn row_keyed_to_other_identity_is_invalid_record() {
        let resolver = resolver(vec![row("u1", "u2", "client")], false);
        let err = resolver.resolve(&IdentityId::new("u1")).await.unwrap_err();
        assert!(err.to_string().contains("keyed to u2"));
    }

    #[tokio::test]
    async fn store_failure_is_network_failure() {
        let resolver = resolver(Vec::new(), true);
        let err = resolver.resolve(&IdentityId::new("u1")).await.unwrap_err();
        assert!(!err.current_context().is_definitive());
    }
}
