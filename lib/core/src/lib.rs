//! Core domain types and utilities for the studentcollab marketplace.
//!
//! This crate provides the foundational types shared by the access layer,
//! the backend client and the web front-end: opaque identifiers, the
//! project/application domain model, and the `Result` alias used for
//! rootcause error reports.

pub mod error;
pub mod id;
pub mod project;

pub use error::Result;
pub use id::{ApplicationId, IdentityId, ParseIdError, ProjectId};
pub use project::{
    Applicant, Application, ApplicationStatus, DraftError, NewApplication, Project, ProjectDraft,
    ProjectStatus,
};
