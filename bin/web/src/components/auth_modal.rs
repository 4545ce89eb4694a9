//! Sign-in / sign-up modal.
//!
//! Submission goes through the session store, which validates the
//! credentials and announces the outcome as a notice. The modal closes on
//! success and stays open with its input on failure.

use crate::context::{AppContext, AuthMode};
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use studentcollab_access::{MIN_PASSWORD_LEN, Notice, Role};

#[derive(Clone, Copy)]
struct ModalText {
    title: &'static str,
    submit: &'static str,
    busy: &'static str,
    switch_prompt: &'static str,
    switch_label: &'static str,
    switch_to: AuthMode,
}

fn modal_text(mode: AuthMode) -> ModalText {
    match mode {
        AuthMode::SignIn => ModalText {
            title: "Welcome back",
            submit: "Sign In",
            busy: "Signing in...",
            switch_prompt: "Don't have an account? ",
            switch_label: "Sign up",
            switch_to: AuthMode::SignUp,
        },
        AuthMode::SignUp => ModalText {
            title: "Create an account",
            submit: "Sign Up",
            busy: "Creating account...",
            switch_prompt: "Already have an account? ",
            switch_label: "Sign in",
            switch_to: AuthMode::SignIn,
        },
    }
}

#[component]
pub fn AuthModal() -> impl IntoView {
    let context = AppContext::expect();
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (role, set_role) = signal(Role::Student);
    let (submitting, set_submitting) = signal(false);

    let close = move || {
        context.auth_modal.set(None);
        set_password.set(String::new());
    };

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let Some(mode) = context.auth_modal.get_untracked() else {
            return;
        };
        let Some(store) = context.store() else {
            context.notify(Notice::error(
                "Not ready",
                "Still connecting. Please try again in a moment.",
            ));
            return;
        };
        let email = email.get_untracked();
        let password = password.get_untracked();
        let role = role.get_untracked();

        set_submitting.set(true);
        spawn_local(async move {
            let result = match mode {
                AuthMode::SignIn => store.sign_in(&email, &password).await,
                AuthMode::SignUp => store.sign_up(&email, &password, role).await.map(|_| ()),
            };
            set_submitting.set(false);
            if result.is_ok() {
                close();
            }
        });
    };

    move || {
        context.auth_modal.get().map(|mode| {
            let text = modal_text(mode);
            view! {
                <div class="modal-overlay" on:click=move |_| close()>
                    <div class="modal" on:click=|ev| ev.stop_propagation()>
                        <h2>{text.title}</h2>
                        <form class="auth-form" on:submit=on_submit>
                            <label for="auth-email">"Email"</label>
                            <input
                                id="auth-email"
                                type="email"
                                required
                                prop:value=move || email.get()
                                on:input=move |ev| set_email.set(event_target_value(&ev))
                            />
                            <label for="auth-password">"Password"</label>
                            <input
                                id="auth-password"
                                type="password"
                                required
                                minlength=MIN_PASSWORD_LEN.to_string()
                                prop:value=move || password.get()
                                on:input=move |ev| set_password.set(event_target_value(&ev))
                            />
                            {(mode == AuthMode::SignUp).then(|| view! {
                                <label for="auth-role">"I am a"</label>
                                <select
                                    id="auth-role"
                                    on:change=move |ev| {
                                        if let Ok(selected) = event_target_value(&ev).parse::<Role>() {
                                            set_role.set(selected);
                                        }
                                    }
                                >
                                    <option value="student" selected=move || role.get() == Role::Student>
                                        "Student"
                                    </option>
                                    <option value="client" selected=move || role.get() == Role::Client>
                                        "Client"
                                    </option>
                                </select>
                            })}
                            <button type="submit" class="primary" disabled=move || submitting.get()>
                                {move || if submitting.get() { text.busy } else { text.submit }}
                            </button>
                        </form>
                        <p class="modal-switch">
                            {text.switch_prompt}
                            <button
                                type="button"
                                class="link-button"
                                on:click=move |_| context.open_auth(text.switch_to)
                            >
                                {text.switch_label}
                            </button>
                        </p>
                    </div>
                </div>
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_switch_to_each_other() {
        assert_eq!(modal_text(AuthMode::SignIn).switch_to, AuthMode::SignUp);
        assert_eq!(modal_text(AuthMode::SignUp).switch_to, AuthMode::SignIn);
    }
}
