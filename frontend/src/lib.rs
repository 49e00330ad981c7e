//! FloodWatch admin front end.
//!
//! - `web`: browser transport, token storage, routing
//! - `auth`: session context shared by the pages
//! - `components`: login screen and dashboard

mod auth;
mod components {
    pub mod dashboard;
    pub mod login;
}
pub(crate) mod web;

use crate::auth::{AuthContext, init_auth};
use crate::components::dashboard::DashboardPage;
use crate::components::login::LoginPage;

use leptos::prelude::*;

use web::route::AppRoute;
use web::router::{Router, RouterOutlet, use_navigate};

#[component]
fn NotFoundPage() -> impl IntoView {
    let navigate = use_navigate();
    view! {
        <div class="flex items-center justify-center min-h-screen bg-base-200">
            <div class="text-center">
                <h1 class="text-6xl font-bold text-error">"404"</h1>
                <p class="text-xl mt-4">"Page not found"</p>
                <button
                    class="btn btn-primary mt-6"
                    on:click=move |_| navigate(AppRoute::Dashboard.to_path())
                >
                    "Go to dashboard"
                </button>
            </div>
        </div>
    }
}

fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::NotFound => view! { <NotFoundPage /> }.into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    let auth_ctx = AuthContext::new();
    provide_context(auth_ctx);

    // Verify the stored token, if any.
    init_auth(&auth_ctx);

    view! {
        <Router
            is_authenticated=auth_ctx.is_authenticated_signal()
            is_pending=auth_ctx.is_pending_signal()
        >
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
