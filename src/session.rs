//! Session controller.
//!
//! Owns the [`Session`] (current user, token, loading flag) and drives it
//! through startup verification, login, logout and profile edits. The
//! persisted token lives in the [`TokenStore`]; the in-memory session mirrors
//! it. Readers get clones via [`SessionController::snapshot`] or register an
//! observer.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::api::FloodWatchApi;
use crate::error::ApiResult;
use crate::events::{AuthEvent, ListenerId};
use crate::request::HttpClient;
use crate::storage::TokenStore;
use crate::strategy::{LoginStrategy, strategy_for};
use floodwatch_shared::{LoginCredentials, UserPatch, UserProfile, is_placeholder_token};

// =========================================================
// Session state
// =========================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub is_loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    Verifying,
    Authenticated,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_authenticated() {
            SessionPhase::Authenticated
        } else if self.is_loading && self.token.is_some() {
            SessionPhase::Verifying
        } else {
            SessionPhase::Unauthenticated
        }
    }

    fn clear(&mut self) {
        self.user = None;
        self.token = None;
    }
}

type Observer = Rc<dyn Fn(&Session)>;

/// Session plus the observers notified after every change.
#[derive(Default)]
struct SessionCell {
    state: RefCell<Session>,
    observers: RefCell<Vec<Observer>>,
}

impl SessionCell {
    fn update(&self, f: impl FnOnce(&mut Session)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            f(&mut state);
            state.clone()
        };
        let observers: Vec<Observer> = self.observers.borrow().clone();
        for observer in observers {
            observer(&snapshot);
        }
    }
}

// =========================================================
// Controller
// =========================================================

pub struct SessionController<C: HttpClient> {
    api: FloodWatchApi<C>,
    strategy: Rc<dyn LoginStrategy>,
    cell: Rc<SessionCell>,
    subscription: Cell<Option<ListenerId>>,
}

impl<C: HttpClient> SessionController<C> {
    /// Builds a controller with the login strategy for the client's build mode.
    pub fn new(api: FloodWatchApi<C>) -> Self {
        let strategy = strategy_for(api.client().config().mode);
        Self::with_strategy(api, strategy)
    }

    pub fn with_strategy(api: FloodWatchApi<C>, strategy: Rc<dyn LoginStrategy>) -> Self {
        let token = api.client().tokens().load();
        let cell = Rc::new(SessionCell {
            state: RefCell::new(Session {
                user: None,
                is_loading: token.is_some(),
                token,
            }),
            observers: RefCell::new(Vec::new()),
        });

        let weak: Weak<SessionCell> = Rc::downgrade(&cell);
        let id = api.client().events().subscribe(move |event| {
            let Some(cell) = weak.upgrade() else {
                return;
            };
            match event {
                AuthEvent::Invalidated { status, url } => {
                    log_warn!("Session invalidated by {} from {}", status, url);
                    cell.update(Session::clear);
                }
            }
        });

        Self {
            api,
            strategy,
            cell,
            subscription: Cell::new(Some(id)),
        }
    }

    pub fn api(&self) -> &FloodWatchApi<C> {
        &self.api
    }

    pub fn snapshot(&self) -> Session {
        self.cell.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.cell.state.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.cell.state.borrow().user.clone()
    }

    /// Registers a callback run with a fresh snapshot after every change.
    ///
    /// Observers run after the state borrow is released, so they may read
    /// the controller again.
    pub fn observe(&self, observer: impl Fn(&Session) + 'static) {
        self.cell.observers.borrow_mut().push(Rc::new(observer));
    }

    fn tokens(&self) -> &Rc<dyn TokenStore> {
        self.api.client().tokens()
    }

    /// Drops both the persisted and in-memory credential.
    fn reset(&self) {
        self.tokens().clear();
        self.cell.update(|s| {
            s.clear();
            s.is_loading = false;
        });
    }

    // --- Lifecycle ---

    /// Verifies the persisted token, if any, and settles the session.
    ///
    /// Placeholder tokens are never sent to the backend; the strategy decides
    /// whether they are kept. A 401/403 from the profile endpoint always
    /// clears the token.
    ///
    /// # Returns
    /// The settled session; `is_loading` is false.
    pub async fn init(&self) -> Session {
        let Some(token) = self.tokens().load() else {
            self.cell.update(|s| {
                s.clear();
                s.is_loading = false;
            });
            return self.snapshot();
        };

        self.cell.update(|s| {
            s.token = Some(token.clone());
            s.is_loading = true;
        });

        if is_placeholder_token(&token) {
            match self.strategy.on_placeholder_token() {
                Some(user) => self.settle(user),
                None => {
                    log_warn!("Discarding placeholder token found at startup");
                    self.reset();
                }
            }
            return self.snapshot();
        }

        match self.api.get_profile().await {
            Ok(user) => self.settle(user),
            Err(e) if e.kind().is_auth_rejection() => {
                log_info!("Stored token rejected, signing out");
                self.reset();
            }
            Err(e) => match self.strategy.on_verification_error(&e) {
                Some(user) => self.settle(user),
                None => {
                    log_error!("Token verification failed: {}", e);
                    self.reset();
                }
            },
        }

        self.snapshot()
    }

    /// Marks the current token as verified for `user`.
    fn settle(&self, user: UserProfile) {
        self.cell.update(|s| {
            s.user = Some(user);
            s.is_loading = false;
        });
    }

    /// Signs in and persists the token.
    ///
    /// # Arguments
    /// * `credentials` - email (or username) and password from the form
    ///
    /// # Returns
    /// The signed-in user. A reply without a user yields one synthesized from
    /// the submitted identifier.
    ///
    /// # Errors
    /// Whatever the strategy does not absorb, with a `session.login` span
    /// naming the identifier. The session stays signed out.
    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<UserProfile> {
        self.cell.update(|s| s.is_loading = true);

        let outcome = match self.authenticate(credentials).await {
            Ok((token, user)) => self
                .tokens()
                .save(&token)
                .map(|_| (token, user)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((token, user)) => {
                log_info!("Signed in as {}", user.display_name());
                self.cell.update(|s| {
                    s.token = Some(token);
                    s.user = Some(user.clone());
                    s.is_loading = false;
                });
                Ok(user)
            }
            Err(e) => {
                self.cell.update(|s| s.is_loading = false);
                Err(e.in_op_with("session.login", credentials.email.clone()))
            }
        }
    }

    async fn authenticate(&self, credentials: &LoginCredentials) -> ApiResult<(String, UserProfile)> {
        let grant = match self.api.login(credentials).await {
            Ok(grant) => grant,
            Err(e) => self.strategy.on_login_error(credentials, e)?,
        };

        let token = match grant.token {
            Some(token) => token,
            None => self.strategy.on_missing_token(credentials)?,
        };
        let user = grant
            .user
            .unwrap_or_else(|| UserProfile::from_credential(&credentials.email));

        Ok((token, user))
    }

    /// Ends the session. The backend is told only for server-issued tokens
    /// and its failure does not stop the local sign-out.
    pub async fn logout(&self) {
        let token = self
            .tokens()
            .load()
            .or_else(|| self.cell.state.borrow().token.clone());
        self.cell.update(|s| s.is_loading = true);

        match token {
            Some(token) if !is_placeholder_token(&token) => {
                if let Err(e) = self.api.logout().await {
                    log_warn!("Logout request failed: {}", e);
                }
            }
            _ => {}
        }

        self.reset();
        log_info!("Signed out");
    }

    /// Merges `patch` into the current user, creating one if absent.
    /// Memory only.
    pub fn update_user(&self, patch: UserPatch) -> UserProfile {
        let current = self.cell.state.borrow().user.clone();
        let user = match current {
            Some(mut user) => {
                user.apply(patch);
                user
            }
            None => UserProfile::from(patch),
        };
        self.cell.update(|s| s.user = Some(user.clone()));
        user
    }

    /// Detaches from the invalidation signal. Idempotent.
    pub fn dispose(&self) {
        if let Some(id) = self.subscription.take() {
            self.api.client().events().unsubscribe(id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.subscription.get().is_none()
    }
}

impl<C: HttpClient> Drop for SessionController<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests;
