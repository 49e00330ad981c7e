//! Router service.
//!
//! Wraps the History API and keeps the current route in a signal. Every
//! navigation goes through [`AppRoute::guard`]; the session signals are
//! injected so routing knows nothing about how authentication works.

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use floodwatch_client::log_info;

use super::route::AppRoute;

fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

fn push_history_state(path: &str) {
    if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
        let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
    }
}

fn replace_history_state(path: &str) {
    if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
        let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
    }
}

#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: ReadSignal<AppRoute>,
    set_route: WriteSignal<AppRoute>,
    is_authenticated: Signal<bool>,
    /// True while the stored token is being verified.
    is_pending: Signal<bool>,
}

impl RouterService {
    fn new(is_authenticated: Signal<bool>, is_pending: Signal<bool>) -> Self {
        let (current_route, set_route) = signal(AppRoute::from_path(&current_path()));
        Self {
            current_route,
            set_route,
            is_authenticated,
            is_pending,
        }
    }

    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    pub fn is_pending(&self) -> Signal<bool> {
        self.is_pending
    }

    pub fn navigate(&self, path: &str) {
        self.navigate_to_route(AppRoute::from_path(path), true);
    }

    fn navigate_to_route(&self, target: AppRoute, use_push: bool) {
        let landed = target.guard(self.is_authenticated.get_untracked());
        if landed != target {
            log_info!("[Router] {} redirected to {}", target, landed);
        }

        if use_push {
            push_history_state(landed.to_path());
        } else {
            replace_history_state(landed.to_path());
        }
        self.set_route.set(landed);
    }

    /// Back/forward buttons go through the same guard.
    fn init_popstate_listener(&self) {
        let router = *self;
        let closure = Closure::<dyn Fn()>::new(move || {
            router.navigate_to_route(AppRoute::from_path(&current_path()), false);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // The listener lives as long as the page.
        closure.forget();
    }

    /// Re-applies the guard whenever the session changes, which includes a
    /// 401/403 tearing it down mid-page.
    fn setup_auth_redirect(&self) {
        let router = *self;
        Effect::new(move |_| {
            let is_auth = router.is_authenticated.get();
            let is_pending = router.is_pending.get();
            let route = router.current_route.get_untracked();
            if let Some(landed) = route.after_session_change(is_auth, is_pending) {
                log_info!(
                    "[Router] Session {}, redirecting to {}",
                    if is_auth { "started" } else { "ended" },
                    landed
                );
                replace_history_state(landed.to_path());
                router.set_route.set(landed);
            }
        });
    }
}

fn provide_router(is_authenticated: Signal<bool>, is_pending: Signal<bool>) -> RouterService {
    let router = RouterService::new(is_authenticated, is_pending);
    router.init_popstate_listener();
    router.setup_auth_redirect();
    provide_context(router);
    router
}

pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

pub fn use_navigate() -> impl Fn(&str) + Clone {
    let router = use_router();
    move |to: &str| router.navigate(to)
}

// ============================================================================
// Components
// ============================================================================

#[component]
pub fn Router(
    is_authenticated: Signal<bool>,
    is_pending: Signal<bool>,
    children: Children,
) -> impl IntoView {
    provide_router(is_authenticated, is_pending);
    children()
}

/// Renders the view for the current route, or a spinner while the session
/// is still being verified.
#[component]
pub fn RouterOutlet(matcher: fn(AppRoute) -> AnyView) -> impl IntoView {
    let router = use_router();

    move || {
        if router.is_pending().get() {
            view! {
                <div class="flex items-center justify-center min-h-screen">
                    <span class="loading loading-spinner loading-lg text-primary"></span>
                </div>
            }
            .into_any()
        } else {
            matcher(router.current_route().get())
        }
    }
}
