//! Fallback for unknown routes.

use leptos::prelude::*;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <div class="not-found-page">
            <h1>"Page not found"</h1>
            <p>"The page you are looking for does not exist."</p>
            <a href="/" class="link-button">"Back to home"</a>
        </div>
    }
}
