//! Projects page.
//!
//! Students browse open projects and track their applications; clients
//! manage their own projects and decide on the applications they receive.
//! Both workspaces load their two lists concurrently and reload them after
//! every write.

use crate::context::AppContext;
use crate::error::user_message;
use chrono::{DateTime, Utc};
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use studentcollab_access::{Notice, Role, Session};
use studentcollab_backend::BackendClient;
use studentcollab_core::{Application, ApplicationStatus, Project, ProjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Projects,
    Applications,
}

/// Everything a workspace renders: projects plus applications.
#[derive(Debug, Clone, PartialEq)]
struct Workspace {
    projects: Vec<Project>,
    applications: Vec<Application>,
}

impl Workspace {
    fn has_applied(&self, project: &ProjectId) -> bool {
        self.applications.iter().any(|a| &a.project_id == project)
    }

    fn pending_count(&self) -> usize {
        self.applications
            .iter()
            .filter(|a| a.awaiting_decision())
            .count()
    }
}

fn budget_label(budget: f64) -> String {
    if budget.fract() == 0.0 {
        format!("${budget:.0}")
    } else {
        format!("${budget:.2}")
    }
}

fn posted_on(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

fn status_class(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => "status status-pending",
        ApplicationStatus::Accepted => "status status-accepted",
        ApplicationStatus::Rejected => "status status-rejected",
    }
}

/// Resume path suggested when a student applies.
fn suggested_resume_path(session: &Session, project: &ProjectId) -> String {
    session
        .identity_id()
        .map(|id| format!("{id}/{project}.pdf"))
        .unwrap_or_default()
}

async fn load_student(backend: Option<BackendClient>) -> Result<Workspace, String> {
    let backend = backend.ok_or_else(|| "Still connecting. Please try again.".to_string())?;
    let (projects, applications) = futures::future::try_join(
        backend.list_projects(),
        backend.list_student_applications(),
    )
    .await
    .map_err(|report| {
        tracing::warn!(error = %report, "loading student workspace failed");
        user_message(&report)
    })?;
    Ok(Workspace {
        projects,
        applications,
    })
}

async fn load_client(backend: Option<BackendClient>) -> Result<Workspace, String> {
    let backend = backend.ok_or_else(|| "Still connecting. Please try again.".to_string())?;
    let (projects, applications) = futures::future::try_join(
        backend.list_client_projects(),
        backend.list_client_applications(),
    )
    .await
    .map_err(|report| {
        tracing::warn!(error = %report, "loading client workspace failed");
        user_message(&report)
    })?;
    Ok(Workspace {
        projects,
        applications,
    })
}

/// Projects page; the workspace shown depends on the profile's role.
#[component]
pub fn ProjectsPage() -> impl IntoView {
    let context = AppContext::expect();
    let role = Memo::new(move |_| context.session.with(Session::role));

    move || match role.get() {
        Some(Role::Student) => view! { <StudentWorkspace/> }.into_any(),
        Some(Role::Client) => view! { <ClientWorkspace/> }.into_any(),
        None => view! {
            <div class="projects-page">
                <h1>"Projects"</h1>
                <p class="empty">"Your account has no role yet, so there is nothing to show here."</p>
            </div>
        }
        .into_any(),
    }
}

#[component]
fn TabBar(tab: RwSignal<Tab>, projects: &'static str, applications: &'static str) -> impl IntoView {
    let tab_class = move |which: Tab| {
        if tab.get() == which { "tab active" } else { "tab" }
    };
    view! {
        <div class="tabs">
            <button class=move || tab_class(Tab::Projects) on:click=move |_| tab.set(Tab::Projects)>
                {projects}
            </button>
            <button class=move || tab_class(Tab::Applications) on:click=move |_| tab.set(Tab::Applications)>
                {applications}
            </button>
        </div>
    }
}

fn project_card(project: &Project, footer: Option<AnyView>) -> AnyView {
    view! {
        <div class="card">
            <h3>{project.title.clone()}</h3>
            <p class="card-description">{project.description.clone()}</p>
            <p><strong>"Budget: "</strong>{budget_label(project.budget)}</p>
            <p><strong>"Status: "</strong>{project.status.label()}</p>
            <p><strong>"Posted: "</strong>{posted_on(&project.created_at)}</p>
            <div class="skills">
                {project
                    .skills_required
                    .iter()
                    .map(|skill| view! { <span class="skill">{skill.clone()}</span> })
                    .collect_view()}
            </div>
            {footer}
        </div>
    }
    .into_any()
}

fn application_card(
    application: &Application,
    resume_href: String,
    show_applicant: bool,
    footer: Option<AnyView>,
) -> AnyView {
    let title = application
        .project
        .as_ref()
        .map_or_else(|| "Project".to_string(), |p| p.title.clone());
    let applicant = application
        .applicant
        .as_ref()
        .filter(|_| show_applicant)
        .map(|a| a.display_name.clone().unwrap_or_else(|| a.email.clone()));

    view! {
        <div class="card">
            <h3>{title}</h3>
            {applicant.map(|name| view! { <p><strong>"Applicant: "</strong>{name}</p> })}
            <p>
                <strong>"Status: "</strong>
                <span class=status_class(application.status)>{application.status.as_str()}</span>
            </p>
            <p><strong>"Applied: "</strong>{posted_on(&application.created_at)}</p>
            <a href=resume_href target="_blank" rel="noopener noreferrer">"View Resume"</a>
            {footer}
        </div>
    }
    .into_any()
}

#[component]
fn StudentWorkspace() -> impl IntoView {
    let context = AppContext::expect();
    let tab = RwSignal::new(Tab::Projects);
    let applying = RwSignal::new(Option::<Project>::None);

    // Reload whenever the signed-in identity changes.
    let identity = Memo::new(move |_| context.session.with(|s| s.identity_id().cloned()));
    let workspace = LocalResource::new(move || {
        identity.track();
        load_student(context.backend())
    });

    view! {
        <div class="projects-page">
            <h1>"Available Projects"</h1>
            <TabBar tab projects="Available Projects" applications="My Applications"/>
            {move || match workspace.get() {
                None => view! { <p class="loading">"Loading projects..."</p> }.into_any(),
                Some(Err(message)) => view! { <p class="form-error">{message}</p> }.into_any(),
                Some(Ok(data)) => match tab.get() {
                    Tab::Projects => student_projects(&data, applying),
                    Tab::Applications => student_applications(context, &data),
                },
            }}
            {move || applying.get().map(|project| view! {
                <ApplyDialog project applying on_applied=move |()| workspace.refetch()/>
            })}
        </div>
    }
}

fn student_projects(data: &Workspace, applying: RwSignal<Option<Project>>) -> AnyView {
    if data.projects.is_empty() {
        return view! { <p class="empty">"No projects available yet."</p> }.into_any();
    }
    view! {
        <div class="grid">
            {data
                .projects
                .iter()
                .map(|project| {
                    let footer = if data.has_applied(&project.id) {
                        Some(view! { <p class="hint">"You have applied to this project."</p> }.into_any())
                    } else if project.is_open() {
                        let selected = project.clone();
                        Some(
                            view! {
                                <button
                                    class="primary"
                                    on:click=move |_| applying.set(Some(selected.clone()))
                                >
                                    "Apply Now"
                                </button>
                            }
                            .into_any(),
                        )
                    } else {
                        None
                    };
                    project_card(project, footer)
                })
                .collect_view()}
        </div>
    }
    .into_any()
}

fn student_applications(context: AppContext, data: &Workspace) -> AnyView {
    if data.applications.is_empty() {
        return view! { <p class="empty">"You haven't applied to any projects yet."</p> }.into_any();
    }
    let backend = context.backend();
    view! {
        <div class="grid">
            {data
                .applications
                .iter()
                .map(|application| {
                    let href = backend
                        .as_ref()
                        .map(|b| b.resume_public_url(&application.resume_url))
                        .unwrap_or_default();
                    application_card(application, href, false, None)
                })
                .collect_view()}
        </div>
    }
    .into_any()
}

/// Collects the stored resume path and submits the application.
#[component]
fn ApplyDialog(
    project: Project,
    applying: RwSignal<Option<Project>>,
    #[prop(into)] on_applied: Callback<()>,
) -> impl IntoView {
    let context = AppContext::expect();
    let initial = context
        .session
        .with_untracked(|s| suggested_resume_path(s, &project.id));
    let (resume_path, set_resume_path) = signal(initial);
    let (submitting, set_submitting) = signal(false);
    let project_id = project.id.clone();

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let Some(backend) = context.backend() else {
            return;
        };
        let path = resume_path.get_untracked();
        let project_id = project_id.clone();
        set_submitting.set(true);
        spawn_local(async move {
            match backend.submit_application(&project_id, &path).await {
                Ok(_) => {
                    context.notify(Notice::info(
                        "Application submitted",
                        "Your application has been submitted successfully.",
                    ));
                    applying.set(None);
                    on_applied.run(());
                }
                Err(report) => {
                    tracing::warn!(error = %report, "application failed");
                    context.notify(Notice::error("Error", user_message(&report)));
                }
            }
            set_submitting.set(false);
        });
    };

    view! {
        <div class="modal-overlay">
            <div class="modal">
                <h2>"Apply for " {project.title.clone()}</h2>
                <form on:submit=on_submit>
                    <label for="resume-path">"Resume"</label>
                    <input
                        id="resume-path"
                        type="text"
                        required
                        prop:value=move || resume_path.get()
                        on:input=move |ev| set_resume_path.set(event_target_value(&ev))
                    />
                    <p class="hint">"Path of your uploaded resume in the resume bucket."</p>
                    <div class="modal-actions">
                        <button type="button" on:click=move |_| applying.set(None)>"Cancel"</button>
                        <button
                            type="submit"
                            class="primary"
                            disabled=move || submitting.get() || resume_path.get().trim().is_empty()
                        >
                            {move || if submitting.get() { "Submitting..." } else { "Submit Application" }}
                        </button>
                    </div>
                </form>
            </div>
        </div>
    }
}

#[component]
fn ClientWorkspace() -> impl IntoView {
    let context = AppContext::expect();
    let tab = RwSignal::new(Tab::Projects);

    let identity = Memo::new(move |_| context.session.with(|s| s.identity_id().cloned()));
    let workspace = LocalResource::new(move || {
        identity.track();
        load_client(context.backend())
    });
    let reload = Callback::new(move |()| workspace.refetch());

    view! {
        <div class="projects-page">
            <h1>"Manage Projects"</h1>
            <TabBar tab projects="My Projects" applications="Applications"/>
            {move || match workspace.get() {
                None => view! { <p class="loading">"Loading projects..."</p> }.into_any(),
                Some(Err(message)) => view! { <p class="form-error">{message}</p> }.into_any(),
                Some(Ok(data)) => match tab.get() {
                    Tab::Projects => client_projects(&data),
                    Tab::Applications => client_applications(context, &data, reload),
                },
            }}
        </div>
    }
}

fn client_projects(data: &Workspace) -> AnyView {
    view! {
        <div class="page-actions">
            <a href="/post-project" class="cta-button">"Post New Project"</a>
        </div>
        {if data.projects.is_empty() {
            view! { <p class="empty">"You haven't posted any projects yet."</p> }.into_any()
        } else {
            view! {
                <div class="grid">
                    {data.projects.iter().map(|project| project_card(project, None)).collect_view()}
                </div>
            }
            .into_any()
        }}
    }
    .into_any()
}

fn client_applications(
    context: AppContext,
    data: &Workspace,
    reload: Callback<()>,
) -> AnyView {
    if data.applications.is_empty() {
        return view! { <p class="empty">"No applications received yet."</p> }.into_any();
    }
    let backend = context.backend();
    view! {
        <p class="hint">{format!("{} awaiting your decision", data.pending_count())}</p>
        <div class="grid">
            {data
                .applications
                .iter()
                .map(|application| {
                    let href = backend
                        .as_ref()
                        .map(|b| b.resume_public_url(&application.resume_url))
                        .unwrap_or_default();
                    let footer = application
                        .awaiting_decision()
                        .then(|| decision_buttons(context, application.clone(), reload));
                    application_card(application, href, true, footer)
                })
                .collect_view()}
        </div>
    }
    .into_any()
}

fn decision_buttons(context: AppContext, application: Application, reload: Callback<()>) -> AnyView {
    let decide = move |decision: ApplicationStatus| {
        let Some(backend) = context.backend() else {
            return;
        };
        let application = application.clone();
        spawn_local(async move {
            match backend.decide_application(&application, decision).await {
                Ok(updated) => {
                    context.notify(Notice::info(
                        "Application updated",
                        format!("The application has been {}.", updated.status),
                    ));
                }
                Err(report) => {
                    tracing::warn!(error = %report, "decision failed");
                    context.notify(Notice::error("Error", user_message(&report)));
                }
            }
            reload.run(());
        });
    };
    let accept = decide.clone();

    view! {
        <div class="card-actions">
            <button class="accept" on:click=move |_| accept(ApplicationStatus::Accepted)>
                "Accept"
            </button>
            <button class="reject" on:click=move |_| decide(ApplicationStatus::Rejected)>
                "Reject"
            </button>
        </div>
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;
    use studentcollab_access::{Identity, Profile};
    use studentcollab_core::IdentityId;

    fn application(project: &str, status: &str) -> Application {
        serde_json::from_str(&format!(
            r#"{{"id":"a-{project}","project_id":"{project}","student_id":"s1","resume_url":"s1/{project}.pdf","status":"{status}","created_at":"2024-03-01T12:00:00+00:00"}}"#
        ))
        .expect("application")
    }

    #[test]
    fn applied_projects_are_recognised() {
        let data = Workspace {
            projects: Vec::new(),
            applications: vec![application("p1", "pending"), application("p2", "rejected")],
        };
        assert!(data.has_applied(&ProjectId::new("p1")));
        assert!(data.has_applied(&ProjectId::new("p2")));
        assert!(!data.has_applied(&ProjectId::new("p3")));
        assert_eq!(data.pending_count(), 1);
    }

    #[test]
    fn budgets_drop_zero_cents() {
        assert_eq!(budget_label(120.0), "$120");
        assert_eq!(budget_label(99.5), "$99.50");
    }

    #[test]
    fn posted_dates_are_short() {
        let at: DateTime<Utc> = "2024-03-01T12:00:00Z".parse().expect("timestamp");
        assert_eq!(posted_on(&at), "Mar 1, 2024");
    }

    #[test]
    fn resume_path_is_keyed_to_student_and_project() {
        let id = IdentityId::new("s1");
        let session = Session::authenticated(
            Identity::new(id.clone(), None),
            Some(Profile::new(id, "s1@example.com".to_string(), Role::Student)),
        );
        assert_eq!(
            suggested_resume_path(&session, &ProjectId::new("p9")),
            "s1/p9.pdf"
        );
        assert_eq!(
            suggested_resume_path(&Session::anonymous(), &ProjectId::new("p9")),
            ""
        );
    }
}
