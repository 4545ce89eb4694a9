//! Page components for the application.
//!
//! Each page is a Leptos component that renders a specific route.

pub mod home;
pub mod not_found;
pub mod post_project;
pub mod projects;

pub use home::HomePage;
pub use not_found::NotFoundPage;
pub use post_project::PostProjectPage;
pub use projects::ProjectsPage;
