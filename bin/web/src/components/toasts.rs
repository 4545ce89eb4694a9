//! Notice toasts.

use crate::context::AppContext;
use leptos::prelude::*;
use studentcollab_access::NoticeLevel;

#[component]
pub fn Toasts() -> impl IntoView {
    let context = AppContext::expect();

    view! {
        <div class="toasts" aria-live="polite">
            <For
                each=move || context.toasts.get()
                key=|toast| toast.id
                children=move |toast| {
                    let id = toast.id;
                    let class = match toast.notice.level {
                        NoticeLevel::Info => "toast",
                        NoticeLevel::Error => "toast toast-error",
                    };
                    view! {
                        <div class=class role="status" on:click=move |_| context.dismiss(id)>
                            <p class="toast-title">{toast.notice.title}</p>
                            <p class="toast-description">{toast.notice.description}</p>
                        </div>
                    }
                }
            />
        </div>
    }
}
