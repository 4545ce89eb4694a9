//! Project and application tables.
//!
//! Row-level security on the backend decides what each identity may read
//! and write; these calls only add the filters the pages need.

use crate::client::BackendClient;
use crate::error::BackendError;
use reqwest::Method;
use serde::Serialize;
use studentcollab_core::{
    Application, ApplicationStatus, IdentityId, NewApplication, Project, ProjectDraft, ProjectId,
    ProjectStatus, Result,
};
use tracing::{info, instrument};

type Query = Vec<(&'static str, String)>;

const STUDENT_APPLICATION_SELECT: &str = "*,projects:project_id(*)";
const CLIENT_APPLICATION_SELECT: &str = "*,projects:project_id!inner(*),profiles:student_id(*)";

#[derive(Serialize)]
struct ProjectInsert<'a> {
    #[serde(flatten)]
    draft: &'a ProjectDraft,
    client_id: &'a IdentityId,
    status: ProjectStatus,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: ApplicationStatus,
}

fn newest_first(mut query: Query) -> Query {
    query.push(("order", "created_at.desc".to_string()));
    query
}

fn open_projects_query() -> Query {
    newest_first(vec![("select", "*".to_string())])
}

fn client_projects_query(client: &IdentityId) -> Query {
    newest_first(vec![
        ("select", "*".to_string()),
        ("client_id", format!("eq.{client}")),
    ])
}

fn student_applications_query(student: &IdentityId) -> Query {
    newest_first(vec![
        ("select", STUDENT_APPLICATION_SELECT.to_string()),
        ("student_id", format!("eq.{student}")),
    ])
}

fn client_applications_query(client: &IdentityId) -> Query {
    newest_first(vec![
        ("select", CLIENT_APPLICATION_SELECT.to_string()),
        ("projects.client_id", format!("eq.{client}")),
    ])
}

/// Checks that `application` may move to `decision`.
fn check_decision(
    application: &Application,
    decision: ApplicationStatus,
) -> std::result::Result<(), BackendError> {
    if !decision.is_decision() || !application.awaiting_decision() {
        return Err(BackendError::InvalidTransition {
            from: application.status,
            to: decision,
        });
    }
    Ok(())
}

fn single<T>(rows: Vec<T>) -> std::result::Result<T, BackendError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::InvalidResponse {
            reason: "no row returned".to_string(),
        })
}

impl BackendClient {
    /// Lists every project, newest first.
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<Project>, BackendError> {
        let request = self
            .rest(Method::GET, self.config().projects_table())
            .query(&open_projects_query());
        self.fetch(request).await
    }

    /// Lists the signed-in client's own projects, newest first.
    #[instrument(skip(self))]
    pub async fn list_client_projects(&self) -> Result<Vec<Project>, BackendError> {
        let client = self.require_identity()?;
        let request = self
            .rest(Method::GET, self.config().projects_table())
            .query(&client_projects_query(client.id()));
        self.fetch(request).await
    }

    /// Posts a project owned by the signed-in identity.
    #[instrument(skip(self, draft), fields(title = %draft.title()))]
    pub async fn insert_project(&self, draft: &ProjectDraft) -> Result<Project, BackendError> {
        let client = self.require_identity()?;
        let request = self
            .rest(Method::POST, self.config().projects_table())
            .header("Prefer", "return=representation")
            .json(&ProjectInsert {
                draft,
                client_id: client.id(),
                status: ProjectStatus::Open,
            });
        let project = single(self.fetch::<Vec<Project>>(request).await?)?;
        info!(project_id = %project.id, "project posted");
        Ok(project)
    }

    /// Lists the signed-in student's applications with their projects.
    #[instrument(skip(self))]
    pub async fn list_student_applications(
        &self,
    ) -> Result<Vec<Application>, BackendError> {
        let student = self.require_identity()?;
        let request = self
            .rest(Method::GET, self.config().applications_table())
            .query(&student_applications_query(student.id()));
        self.fetch(request).await
    }

    /// Lists applications to the signed-in client's projects, with the
    /// project and the applicant embedded.
    #[instrument(skip(self))]
    pub async fn list_client_applications(
        &self,
    ) -> Result<Vec<Application>, BackendError> {
        let client = self.require_identity()?;
        let request = self
            .rest(Method::GET, self.config().applications_table())
            .query(&client_applications_query(client.id()));
        self.fetch(request).await
    }

    /// Applies to `project_id` as the signed-in student, referencing a
    /// resume already stored at `resume_path` in the resume bucket.
    #[instrument(skip(self, project_id), fields(project_id = %project_id))]
    pub async fn submit_application(
        &self,
        project_id: &ProjectId,
        resume_path: &str,
    ) -> Result<Application, BackendError> {
        let student = self.require_identity()?;
        let application = NewApplication::new(project_id.clone(), student.id().clone(), resume_path)
            .map_err(|e| BackendError::InvalidInput {
                reason: e.to_string(),
            })?;
        let request = self
            .rest(Method::POST, self.config().applications_table())
            .header("Prefer", "return=representation")
            .json(&application);
        let created = single(self.fetch::<Vec<Application>>(request).await?)?;
        info!(application_id = %created.id, "application submitted");
        Ok(created)
    }

    /// Accepts or rejects a pending application.
    ///
    /// The update is conditional on the row still being pending, so a
    /// decision made elsewhere in the meantime is reported as an invalid
    /// transition rather than overwritten.
    #[instrument(skip(self, application, decision), fields(application_id = %application.id, %decision))]
    pub async fn decide_application(
        &self,
        application: &Application,
        decision: ApplicationStatus,
    ) -> Result<Application, BackendError> {
        check_decision(application, decision)?;
        self.require_identity()?;

        let request = self
            .rest(Method::PATCH, self.config().applications_table())
            .query(&[
                ("id", format!("eq.{}", application.id)),
                ("status", format!("eq.{}", ApplicationStatus::Pending)),
            ])
            .header("Prefer", "return=representation")
            .json(&StatusUpdate { status: decision });
        let rows: Vec<Application> = self.fetch(request).await?;
        let updated = rows
            .into_iter()
            .next()
            .ok_or(BackendError::InvalidTransition {
                from: application.status,
                to: decision,
            })?;
        info!("application {}", updated.status);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use studentcollab_core::ApplicationId;

    fn application(status: ApplicationStatus) -> Application {
        let json = format!(
            r#"{{"id":"a1","project_id":"p1","student_id":"s1","resume_url":"s1/p1.pdf","status":"{status}","created_at":"2024-03-01T12:00:00+00:00"}}"#
        );
        serde_json::from_str(&json).expect("application")
    }

    #[test]
    fn only_pending_applications_can_be_decided() {
        assert!(check_decision(&application(ApplicationStatus::Pending), ApplicationStatus::Accepted).is_ok());
        assert!(check_decision(&application(ApplicationStatus::Pending), ApplicationStatus::Rejected).is_ok());
        assert_eq!(
            check_decision(&application(ApplicationStatus::Accepted), ApplicationStatus::Rejected),
            Err(BackendError::InvalidTransition {
                from: ApplicationStatus::Accepted,
                to: ApplicationStatus::Rejected,
            })
        );
    }

    #[test]
    fn pending_is_not_a_decision() {
        assert!(matches!(
            check_decision(&application(ApplicationStatus::Pending), ApplicationStatus::Pending),
            Err(BackendError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn client_applications_filter_through_embedded_project() {
        let query = client_applications_query(&IdentityId::new("c1"));
        assert!(query.contains(&("projects.client_id", "eq.c1".to_string())));
        assert!(query.contains(&("select", CLIENT_APPLICATION_SELECT.to_string())));
        assert_eq!(query.last(), Some(&("order", "created_at.desc".to_string())));
    }

    #[test]
    fn student_applications_filter_by_student() {
        let query = student_applications_query(&IdentityId::new("s1"));
        assert!(query.contains(&("student_id", "eq.s1".to_string())));
    }

    #[test]
    fn project_insert_carries_owner_and_open_status() {
        let draft = ProjectDraft::parse("Logo", "Design a logo", "120", "figma, branding")
            .expect("draft");
        let client_id = IdentityId::new("c1");
        let json = serde_json::to_value(ProjectInsert {
            draft: &draft,
            client_id: &client_id,
            status: ProjectStatus::Open,
        })
        .expect("serialize");
        assert_eq!(json["client_id"], "c1");
        assert_eq!(json["status"], "open");
        assert_eq!(json["title"], "Logo");
        assert_eq!(json["skills_required"][1], "branding");
    }

    #[test]
    fn embedded_listing_decodes() {
        let body = r#"[{"id":"a1","project_id":"p1","student_id":"s1","resume_url":"s1/p1.pdf","status":"pending","created_at":"2024-03-01T12:00:00+00:00",
            "projects":{"id":"p1","title":"Logo","description":"d","budget":120,"client_id":"c1","status":"open","created_at":"2024-02-01T12:00:00+00:00","skills_required":["figma"]},
            "profiles":{"id":"s1","email":"s1@example.com","full_name":null,"role":"student"}}]"#;
        let rows: Vec<Application> = serde_json::from_str(body).expect("rows");
        assert_eq!(rows[0].id, ApplicationId::new("a1"));
        assert_eq!(rows[0].project.as_ref().map(|p| p.title.as_str()), Some("Logo"));
        assert_eq!(
            rows[0].applicant.as_ref().map(|a| a.email.as_str()),
            Some("s1@example.com")
        );
    }

    #[tokio::test]
    async fn writes_require_a_signed_in_identity() {
        let client = BackendClient::new(BackendConfig::new(
            "http://127.0.0.1:9".to_string(),
            "anon".to_string(),
        ))
        .expect("client");
        let draft = ProjectDraft::parse("Logo", "Design a logo", "120", "figma").expect("draft");

        let err = client.insert_project(&draft).await.unwrap_err();
        assert_eq!(err.current_context(), &BackendError::NotSignedIn);
        let err = client
            .submit_application(&ProjectId::new("p1"), "s1/p1.pdf")
            .await
            .unwrap_err();
        assert_eq!(err.current_context(), &BackendError::NotSignedIn);
    }
}
