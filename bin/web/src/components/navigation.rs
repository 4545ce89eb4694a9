//! Navigation bar.

use crate::context::{AppContext, AuthMode};
use leptos::prelude::*;
use studentcollab_access::{NavAction, NavIntent, NavigationPresenter};

/// Header with the entries the presenter offers for the current session.
#[component]
pub fn Navigation() -> impl IntoView {
    let context = AppContext::expect();
    let actions = Memo::new(move |_| context.session.with(NavigationPresenter::actions));
    let signed_in_as = Memo::new(move |_| {
        context
            .session
            .with(|session| session.profile().map(|profile| profile.label().to_string()))
    });

    view! {
        <header class="header">
            <div class="header-left">
                <a href="/" class="logo">"StudentCollab"</a>
            </div>
            <nav class="header-right">
                {move || signed_in_as.get().map(|label| view! { <span class="user-name">{label}</span> })}
                <For
                    each=move || actions.get()
                    key=|action| *action
                    children=move |action| nav_entry(context, action)
                />
            </nav>
        </header>
    }
}

fn nav_entry(context: AppContext, action: NavAction) -> AnyView {
    let class = if action.is_primary() {
        "nav-button primary"
    } else {
        "nav-link"
    };
    let label = action.label();

    match action.intent() {
        NavIntent::Navigate(href) => view! { <a href=href class=class>{label}</a> }.into_any(),
        NavIntent::RequestSignIn => view! {
            <button class=class on:click=move |_| context.open_auth(AuthMode::SignIn)>{label}</button>
        }
        .into_any(),
        NavIntent::RequestSignUp => view! {
            <button class=class on:click=move |_| context.open_auth(AuthMode::SignUp)>{label}</button>
        }
        .into_any(),
        NavIntent::RequestSignOut => view! {
            <button class=class on:click=move |_| context.sign_out()>{label}</button>
        }
        .into_any(),
    }
}
