//! Post-project page (clients only).

use crate::context::AppContext;
use crate::error::user_message;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;
use studentcollab_access::Notice;
use studentcollab_core::ProjectDraft;

#[component]
pub fn PostProjectPage() -> impl IntoView {
    let context = AppContext::expect();
    let navigate = use_navigate();

    let (title, set_title) = signal(String::new());
    let (description, set_description) = signal(String::new());
    let (budget, set_budget) = signal(String::new());
    let (skills, set_skills) = signal(String::new());
    let (submitting, set_submitting) = signal(false);
    let (form_error, set_form_error) = signal(Option::<String>::None);

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let draft = match ProjectDraft::parse(
            &title.get_untracked(),
            &description.get_untracked(),
            &budget.get_untracked(),
            &skills.get_untracked(),
        ) {
            Ok(draft) => draft,
            Err(e) => {
                set_form_error.set(Some(e.to_string()));
                return;
            }
        };
        let Some(backend) = context.backend() else {
            set_form_error.set(Some("Still connecting. Please try again.".to_string()));
            return;
        };

        set_form_error.set(None);
        set_submitting.set(true);
        let navigate = navigate.clone();
        spawn_local(async move {
            match backend.insert_project(&draft).await {
                Ok(project) => {
                    context.notify(Notice::info(
                        "Project posted",
                        format!("\"{}\" is now open for applications.", project.title),
                    ));
                    navigate("/projects", NavigateOptions::default());
                }
                Err(report) => {
                    tracing::warn!(error = %report, "posting project failed");
                    context.notify(Notice::error("Error posting project", user_message(&report)));
                }
            }
            set_submitting.set(false);
        });
    };

    view! {
        <div class="post-project-page">
            <h1>"Post a New Project"</h1>
            <form class="project-form" on:submit=on_submit>
                <label for="project-title">"Project Title"</label>
                <input
                    id="project-title"
                    type="text"
                    placeholder="e.g., Website Redesign"
                    prop:value=move || title.get()
                    on:input=move |ev| set_title.set(event_target_value(&ev))
                />

                <label for="project-description">"Description"</label>
                <textarea
                    id="project-description"
                    rows="5"
                    placeholder="Describe the project, deliverables and timeline"
                    prop:value=move || description.get()
                    on:input=move |ev| set_description.set(event_target_value(&ev))
                ></textarea>

                <label for="project-budget">"Budget ($)"</label>
                <input
                    id="project-budget"
                    type="number"
                    min="0"
                    step="any"
                    prop:value=move || budget.get()
                    on:input=move |ev| set_budget.set(event_target_value(&ev))
                />

                <label for="project-skills">"Required Skills"</label>
                <input
                    id="project-skills"
                    type="text"
                    placeholder="e.g., React, TypeScript, UI Design"
                    prop:value=move || skills.get()
                    on:input=move |ev| set_skills.set(event_target_value(&ev))
                />
                <p class="hint">"Separate skills with commas."</p>

                {move || form_error.get().map(|msg| view! { <p class="form-error">{msg}</p> })}

                <button type="submit" class="primary" disabled=move || submitting.get()>
                    {move || if submitting.get() { "Posting..." } else { "Post Project" }}
                </button>
            </form>
        </div>
    }
}
