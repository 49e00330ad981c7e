use crate::auth::{login, use_auth};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let is_submitting = move || auth.session.with(|s| s.is_loading);

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let (email, password) = (email.get(), password.get());
        if email.trim().is_empty() || password.is_empty() {
            set_error_msg.set(Some("Please enter your email and password".to_string()));
            return;
        }

        set_error_msg.set(None);
        // On success the router's session effect moves us to the dashboard.
        spawn_local(async move {
            if let Err(message) = login(&auth, email.trim().to_string(), password).await {
                set_error_msg.set(Some(message));
            }
        });
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">"FloodWatch Admin"</h1>
                    <p class="text-base-content/70">"Sign in to manage alerts and evacuation data"</p>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <Show when=move || error_msg.get().is_some()>
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <span>{move || error_msg.get().unwrap_or_default()}</span>
                            </div>
                        </Show>

                        <div class="form-control">
                            <label class="label" for="email">
                                <span class="label-text">"Email or username"</span>
                            </label>
                            <input
                                id="email"
                                type="text"
                                autocomplete="username"
                                placeholder="admin@floodwatch.ph"
                                on:input=move |ev| set_email.set(event_target_value(&ev))
                                prop:value=email
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control">
                            <label class="label" for="password">
                                <span class="label-text">"Password"</span>
                            </label>
                            <input
                                id="password"
                                type="password"
                                autocomplete="current-password"
                                placeholder="••••••••"
                                on:input=move |ev| set_password.set(event_target_value(&ev))
                                prop:value=password
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=is_submitting>
                                {move || if is_submitting() {
                                    view! { <span class="loading loading-spinner"></span> "Signing in..." }.into_any()
                                } else {
                                    "Sign in".into_any()
                                }}
                            </button>
                        </div>
                    </form>
                </div>
            </div>
        </div>
    }
}
