//! Marketplace domain types: projects posted by clients and the
//! applications students send to them.
//!
//! Rows come back from the backend's REST layer as JSON; these types
//! deserialize directly from those rows. Drafts are the validated form input
//! that precedes an insert.

use crate::id::{ApplicationId, IdentityId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a posted project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Accepting applications.
    Open,
    /// A student has been selected and work is under way.
    InProgress,
    /// Work is finished.
    Completed,
}

impl ProjectStatus {
    /// Human-readable label for listings.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }
}

/// A project posted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub client_id: IdentityId,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub skills_required: Vec<String>,
}

impl Project {
    /// Returns true if students may still apply.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == ProjectStatus::Open
    }
}

/// Reasons a project draft or application is rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// A required field was empty after trimming.
    MissingField { field: &'static str },
    /// The budget could not be parsed as a number.
    InvalidBudget { input: String },
    /// The budget was negative.
    NegativeBudget,
}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "{field} is required"),
            Self::InvalidBudget { input } => write!(f, "budget '{input}' is not a number"),
            Self::NegativeBudget => write!(f, "budget must be positive"),
        }
    }
}

impl std::error::Error for DraftError {}

/// Validated input for a new project.
///
/// The owning client is not part of the draft; the backend client attaches
/// the signed-in identity when inserting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDraft {
    title: String,
    description: String,
    budget: f64,
    skills_required: Vec<String>,
}

impl ProjectDraft {
    /// Parses the post-project form fields.
    ///
    /// Skills are a comma-separated list; blank entries are dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`DraftError`] naming the first invalid field.
    pub fn parse(
        title: &str,
        description: &str,
        budget: &str,
        skills: &str,
    ) -> Result<Self, DraftError> {
        let title = required(title, "title")?;
        let description = required(description, "description")?;

        let budget_input = required(budget, "budget")?;
        let budget: f64 = budget_input
            .parse()
            .ok()
            .filter(|b: &f64| b.is_finite())
            .ok_or(DraftError::InvalidBudget {
                input: budget_input,
            })?;
        if budget < 0.0 {
            return Err(DraftError::NegativeBudget);
        }

        let skills_required: Vec<String> = skills
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if skills_required.is_empty() {
            return Err(DraftError::MissingField {
                field: "required skills",
            });
        }

        Ok(Self {
            title,
            description,
            budget,
            skills_required,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn budget(&self) -> f64 {
        self.budget
    }

    #[must_use]
    pub fn skills_required(&self) -> &[String] {
        &self.skills_required
    }
}

fn required(value: &str, field: &'static str) -> Result<String, DraftError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DraftError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Review state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    /// Returns the lowercase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true for the two outcomes a client can choose.
    #[must_use]
    pub fn is_decision(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact details of the student behind an application, embedded when a
/// client lists applications to their projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub email: String,
    #[serde(default, rename = "full_name")]
    pub display_name: Option<String>,
}

/// A student's application to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub project_id: ProjectId,
    pub student_id: IdentityId,
    /// Object path of the resume inside the resume bucket.
    pub resume_url: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    /// The project applied to, when the listing embeds it.
    #[serde(default, rename = "projects")]
    pub project: Option<Project>,
    /// The applying student, when the listing embeds it.
    #[serde(default, rename = "profiles")]
    pub applicant: Option<Applicant>,
}

impl Application {
    /// Returns true if a client may still accept or reject this application.
    #[must_use]
    pub fn awaiting_decision(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}

/// Insert payload for a new application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewApplication {
    project_id: ProjectId,
    student_id: IdentityId,
    resume_url: String,
}

impl NewApplication {
    /// Builds an application for `student_id` to `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::MissingField`] if the resume path is blank.
    pub fn new(
        project_id: ProjectId,
        student_id: IdentityId,
        resume_path: &str,
    ) -> Result<Self, DraftError> {
        Ok(Self {
            project_id,
            student_id,
            resume_url: required(resume_path, "resume")?,
        })
    }

    #[must_use]
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    #[must_use]
    pub fn student_id(&self) -> &IdentityId {
        &self.student_id
    }

    #[must_use]
    pub fn resume_url(&self) -> &str {
        &self.resume_url
    }
}
