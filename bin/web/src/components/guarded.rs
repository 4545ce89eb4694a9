//! Route guard wrapper for protected pages.

use crate::context::AppContext;
use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};
use studentcollab_access::Decision;

/// Renders `children` only when the guard allows the current route.
///
/// While the session is still resolving a neutral loading view is shown;
/// a denied visit is replaced by the configured fallback route.
#[component]
pub fn Guarded(children: ChildrenFn) -> impl IntoView {
    let context = AppContext::expect();
    let location = use_location();

    let decision = Memo::new(move |_| {
        let path = location.pathname.get();
        context
            .guard
            .with(|guard| context.session.with(|session| guard.check(session, &path)))
    });

    let navigate = use_navigate();
    Effect::new(move || {
        if let Decision::DenyRedirect(target) = decision.get() {
            tracing::debug!(%target, "route denied");
            navigate(
                &target,
                NavigateOptions {
                    replace: true,
                    ..Default::default()
                },
            );
        }
    });

    move || match decision.get() {
        Decision::Allow => children().into_any(),
        Decision::Pending => view! {
            <div class="page-loading">
                <p>"Loading..."</p>
            </div>
        }
        .into_any(),
        Decision::DenyRedirect(_) => ().into_any(),
    }
}
