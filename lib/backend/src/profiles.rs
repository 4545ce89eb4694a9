//! Profile table lookups.

use crate::client::{BackendClient, error_message};
use async_trait::async_trait;
use reqwest::Method;
use studentcollab_access::{ProfileError, ProfileRecord, ProfileStore};
use studentcollab_core::IdentityId;
use tracing::{instrument, warn};

/// Decodes a profile query result: zero or one row.
fn parse_profile_rows(
    identity_id: &IdentityId,
    body: &str,
) -> Result<Option<ProfileRecord>, ProfileError> {
    let rows: Vec<ProfileRecord> =
        serde_json::from_str(body).map_err(|e| ProfileError::InvalidRecord {
            identity_id: identity_id.clone(),
            reason: e.to_string(),
        })?;
    if rows.len() > 1 {
        return Err(ProfileError::InvalidRecord {
            identity_id: identity_id.clone(),
            reason: format!("{} profile rows share one id", rows.len()),
        });
    }
    Ok(rows.into_iter().next())
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl ProfileStore for BackendClient {
    #[instrument(skip(self, id), fields(identity_id = %id))]
    async fn select_profile_by_id(
        &self,
        id: &IdentityId,
    ) -> Result<Option<ProfileRecord>, ProfileError> {
        let network = |details: String| ProfileError::NetworkFailure { details };

        let response = self
            .rest(Method::GET, self.config().profiles_table())
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())])
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| network(e.to_string()))?;
        if !status.is_success() {
            warn!(status = %status, "profile lookup rejected");
            return Err(network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_message(&body)
            )));
        }
        parse_profile_rows(id, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_is_none() {
        assert_eq!(parse_profile_rows(&IdentityId::new("u1"), "[]"), Ok(None));
    }

    #[test]
    fn single_row_is_returned() {
        let body = r#"[{"id":"u1","email":"a@b.c","role":"client","full_name":"Ada","created_at":"2024-01-01T00:00:00Z"}]"#;
        let record = parse_profile_rows(&IdentityId::new("u1"), body)
            .expect("rows")
            .expect("row");
        assert_eq!(record.role, "client");
        assert_eq!(record.full_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn malformed_rows_are_invalid_records() {
        let err = parse_profile_rows(&IdentityId::new("u1"), r#"[{"id":"u1"}]"#).unwrap_err();
        assert!(err.is_definitive());
        assert!(matches!(err, ProfileError::InvalidRecord { .. }));
    }

    #[test]
    fn duplicate_rows_are_invalid_records() {
        let body = r#"[{"id":"u1","role":"client"},{"id":"u1","role":"student"}]"#;
        assert!(matches!(
            parse_profile_rows(&IdentityId::new("u1"), body),
            Err(ProfileError::InvalidRecord { .. })
        ));
    }
}
