//! Route table.
//!
//! Pure data: no DOM access. The router service consults these methods for
//! its guard decisions.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    #[default]
    Login,
    /// Requires a session.
    Dashboard,
    NotFound,
}

impl AppRoute {
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "" | "/login" => Self::Login,
            "/dashboard" => Self::Dashboard,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::NotFound => "/404",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Dashboard)
    }

    /// Signed-in users are bounced off the login screen.
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login)
    }

    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    pub fn auth_success_redirect() -> Self {
        Self::Dashboard
    }

    /// Where a navigation to `self` actually lands given the session state.
    pub fn guard(self, is_authenticated: bool) -> Self {
        if self.requires_auth() && !is_authenticated {
            Self::auth_failure_redirect()
        } else if self.should_redirect_when_authenticated() && is_authenticated {
            Self::auth_success_redirect()
        } else {
            self
        }
    }
}

impl AppRoute {
    /// Redirect owed after the session changed while `self` is shown.
    ///
    /// This is the only navigation a successful login triggers; the login
    /// form itself does not navigate.
    ///
    /// # Returns
    /// - `None` while the stored token is still being verified
    /// - `None` if `self` is still allowed
    /// - `Some(target)` otherwise
    pub fn after_session_change(self, is_authenticated: bool, is_pending: bool) -> Option<Self> {
        if is_pending {
            return None;
        }
        let landed = self.guard(is_authenticated);
        (landed != self).then_some(landed)
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}
