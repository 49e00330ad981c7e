//! Authentication context.
//!
//! Holds the client backend for the lifetime of the app and mirrors the
//! session controller into a signal. The router only sees the derived
//! `is_authenticated` / `is_pending` signals.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use floodwatch_client::{AdminBackend, ClientConfig, Session, SessionPhase};
use floodwatch_shared::LoginCredentials;

use crate::web::{FetchHttpClient, LocalTokenStore};

pub type Backend = AdminBackend<FetchHttpClient>;

/// Authentication state shared through Leptos context.
///
/// `Copy`, so pages and closures capture it freely.
#[derive(Clone, Copy)]
pub struct AuthContext {
    pub session: ReadSignal<Session>,
    backend: StoredValue<Backend, LocalStorage>,
}

impl AuthContext {
    /// Builds the backend from the compile-time config and starts mirroring
    /// the session. Call once, at the app root.
    pub fn new() -> Self {
        let backend = AdminBackend::new(
            ClientConfig::from_build_env(),
            FetchHttpClient::new(),
            Rc::new(LocalTokenStore),
        );

        let (session, set_session) = signal(backend.session.snapshot());
        // Covers login, logout, verification and 401/403 invalidation alike.
        backend
            .session
            .observe(move |snapshot| set_session.set(snapshot.clone()));

        Self {
            session,
            backend: StoredValue::new_local(backend),
        }
    }

    /// A handle to the shared backend. Clones share one client.
    pub fn backend(&self) -> Backend {
        self.backend.get_value()
    }

    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        let session = self.session;
        Signal::derive(move || session.with(Session::is_authenticated))
    }

    pub fn is_pending_signal(&self) -> Signal<bool> {
        let session = self.session;
        Signal::derive(move || session.with(|s| s.phase() == SessionPhase::Verifying))
    }
}

pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// Verifies the stored token in the background.
pub fn init_auth(ctx: &AuthContext) {
    let backend = ctx.backend();
    spawn_local(async move {
        backend.session.init().await;
    });
}

/// Signs in.
///
/// # Arguments
/// * `ctx` - the app's auth context
/// * `email` - email or username, already trimmed
/// * `password` - password as typed
///
/// # Returns
/// - `Ok(())` once the session is authenticated
/// - `Err(message)` with the text to show under the form
pub async fn login(ctx: &AuthContext, email: String, password: String) -> Result<(), String> {
    let backend = ctx.backend();
    backend
        .session
        .login(&LoginCredentials::new(email, password))
        .await
        .map(|_| ())
        .map_err(|e| e.display_message().to_string())
}

/// Signs out. The router redirects once the session signal clears.
pub fn logout(ctx: &AuthContext) {
    let backend = ctx.backend();
    spawn_local(async move {
        backend.session.logout().await;
    });
}
