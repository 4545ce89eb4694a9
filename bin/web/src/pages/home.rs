//! Landing page.

use crate::context::{AppContext, AuthMode};
use leptos::ev::MouseEvent;
use leptos::prelude::*;
use studentcollab_access::{NavIntent, Role, Session};

/// The call to action offered in the hero for `session`, or `None` while
/// the session is still loading.
fn hero_action(session: &Session) -> Option<(&'static str, NavIntent)> {
    if session.loading() {
        return None;
    }
    if !session.is_authenticated() {
        return Some(("Get Started", NavIntent::RequestSignUp));
    }
    Some(match session.role() {
        Some(Role::Client) => ("Post Project", NavIntent::Navigate("/post-project")),
        _ => ("Find Projects", NavIntent::Navigate("/projects")),
    })
}

fn action_view(context: AppContext, label: &'static str, intent: NavIntent) -> AnyView {
    let on_click = move |_: MouseEvent| match intent {
        NavIntent::RequestSignIn => context.open_auth(AuthMode::SignIn),
        NavIntent::RequestSignUp => context.open_auth(AuthMode::SignUp),
        NavIntent::RequestSignOut => context.sign_out(),
        NavIntent::Navigate(_) => {}
    };
    match intent {
        NavIntent::Navigate(href) => {
            view! { <a href=href class="cta-button">{label}</a> }.into_any()
        }
        _ => view! { <button class="cta-button" on:click=on_click>{label}</button> }.into_any(),
    }
}

/// The home page component.
#[component]
pub fn HomePage() -> impl IntoView {
    let context = AppContext::expect();
    let action = Memo::new(move |_| context.session.with(hero_action));

    view! {
        <div class="home-page">
            <section class="hero">
                <h1>"Where Student Talent Meets " <span class="accent">"Real Projects"</span></h1>
                <p>
                    "Join a community of students working on real-world projects. "
                    "Build your portfolio, earn money, and gain valuable experience."
                </p>
                <div class="hero-actions">
                    {move || action.get().map(|(label, intent)| action_view(context, label, intent))}
                </div>
            </section>

            <section id="how-it-works" class="steps">
                <h2>"How It Works"</h2>
                <div class="grid">
                    <div class="step">
                        <span class="step-number">"1"</span>
                        <h3>"Create Your Profile"</h3>
                        <p>"Sign up as a student or a client in under a minute."</p>
                    </div>
                    <div class="step">
                        <span class="step-number">"2"</span>
                        <h3>"Find Projects"</h3>
                        <p>"Browse and apply to projects that match your skills and interests."</p>
                    </div>
                    <div class="step">
                        <span class="step-number">"3"</span>
                        <h3>"Get to Work"</h3>
                        <p>"Once a client accepts your application, the project is yours."</p>
                    </div>
                </div>
            </section>

            <section id="projects" class="feature">
                <h2>"Projects for Students"</h2>
                <p>
                    "Design, development, research and writing projects posted by real clients. "
                    "Apply with your resume and track every application in one place."
                </p>
            </section>

            <section id="for-clients" class="feature">
                <h2>"For Clients"</h2>
                <p>
                    "Post a project with a budget and the skills you need, "
                    "then review applications and accept the students you want to work with."
                </p>
            </section>
        </div>
    }
}
