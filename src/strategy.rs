//! Login fallback policy.
//!
//! Chosen once from [`BuildMode`] when the session controller is built.
//! Production never fabricates a session; development substitutes a
//! placeholder session so the dashboard stays usable without a backend.

use std::rc::Rc;

use crate::config::BuildMode;
use crate::error::{ApiError, ApiResult};
use floodwatch_shared::{AuthGrant, LoginCredentials, UserProfile, placeholder_token};

pub trait LoginStrategy {
    /// Called when the login call itself failed.
    fn on_login_error(&self, credentials: &LoginCredentials, error: ApiError) -> ApiResult<AuthGrant>;

    /// Called when the backend accepted the login but sent no token.
    fn on_missing_token(&self, credentials: &LoginCredentials) -> ApiResult<String>;

    /// Stand-in user for a placeholder token found at startup. `None`
    /// rejects the token.
    fn on_placeholder_token(&self) -> Option<UserProfile>;

    /// Stand-in user when profile verification failed for a reason other
    /// than 401/403. `None` clears the token.
    fn on_verification_error(&self, error: &ApiError) -> Option<UserProfile>;

    fn name(&self) -> &'static str;
}

/// Propagates every failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictLogin;

impl LoginStrategy for StrictLogin {
    fn on_login_error(&self, _credentials: &LoginCredentials, error: ApiError) -> ApiResult<AuthGrant> {
        Err(error)
    }

    fn on_missing_token(&self, _credentials: &LoginCredentials) -> ApiResult<String> {
        Err(ApiError::decode("Login response did not include a token"))
    }

    fn on_placeholder_token(&self) -> Option<UserProfile> {
        None
    }

    fn on_verification_error(&self, _error: &ApiError) -> Option<UserProfile> {
        None
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

/// Development convenience: substitutes a placeholder session.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevelopmentFallback;

impl LoginStrategy for DevelopmentFallback {
    fn on_login_error(&self, credentials: &LoginCredentials, error: ApiError) -> ApiResult<AuthGrant> {
        log_warn!(
            "Login failed ({}), continuing with a placeholder session",
            error
        );
        Ok(AuthGrant {
            token: Some(placeholder_token()),
            user: Some(UserProfile::from_credential(&credentials.email)),
        })
    }

    fn on_missing_token(&self, _credentials: &LoginCredentials) -> ApiResult<String> {
        log_warn!("Login response had no token, minting a placeholder");
        Ok(placeholder_token())
    }

    fn on_placeholder_token(&self) -> Option<UserProfile> {
        Some(UserProfile::placeholder())
    }

    fn on_verification_error(&self, error: &ApiError) -> Option<UserProfile> {
        log_warn!("Profile verification failed ({}), keeping token", error);
        Some(UserProfile::placeholder())
    }

    fn name(&self) -> &'static str {
        "development"
    }
}

/// The login strategy for a build mode: [`DevelopmentFallback`] in
/// development, [`StrictLogin`] otherwise.
pub fn strategy_for(mode: BuildMode) -> Rc<dyn LoginStrategy> {
    match mode {
        BuildMode::Development => Rc::new(DevelopmentFallback),
        BuildMode::Production => Rc::new(StrictLogin),
    }
}
