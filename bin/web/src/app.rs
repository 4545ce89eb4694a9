//! Main Leptos application component and routing.

use crate::components::{AuthModal, Guarded, Navigation, Toasts};
use crate::config::WebConfig;
use crate::context::AppContext;
use crate::pages::{HomePage, NotFoundPage, PostProjectPage, ProjectsPage};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    components::{Route, Router, Routes},
    path,
};
use studentcollab_access::Notice;

/// Server function handing the public backend settings to the browser.
#[server]
pub async fn get_public_config() -> Result<WebConfig, ServerFnError> {
    use crate::error::WebError;
    use axum::Extension;

    let Extension(config): Extension<WebConfig> = leptos_axum::extract().await.map_err(|e| {
        tracing::error!(error = %e, "web configuration missing from request");
        WebError::ConfigUnavailable {
            details: e.to_string(),
        }
        .into_server_error()
    })?;
    Ok(config)
}

/// The main application component.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    let context = AppContext::provide();

    // Effects only run in the browser, which is the only place the
    // session store lives.
    Effect::new(move || {
        spawn_local(async move {
            match get_public_config().await {
                Ok(config) => context.start(config),
                Err(e) => {
                    tracing::error!(error = %e, "could not load configuration");
                    context.notify(Notice::error(
                        "Could not start",
                        "The application configuration could not be loaded.",
                    ));
                }
            }
        });
    });
    on_cleanup(move || context.shutdown());

    view! {
        <Title text="StudentCollab"/>
        <Router>
            <Navigation/>
            <main class="container">
                <Routes fallback=|| view! { <NotFoundPage/> }>
                    <Route path=path!("/") view=HomePage/>
                    <Route
                        path=path!("/projects")
                        view=|| view! { <Guarded><ProjectsPage/></Guarded> }
                    />
                    <Route
                        path=path!("/post-project")
                        view=|| view! { <Guarded><PostProjectPage/></Guarded> }
                    />
                </Routes>
            </main>
            <AuthModal/>
            <Toasts/>
        </Router>
    }
}
