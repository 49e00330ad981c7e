//! `localStorage` token store.
//!
//! The token is stored as the plain bearer string, the same value other
//! tools reading `auth-token` expect. `gloo_storage`'s typed `get`/`set`
//! would JSON-quote it, so the raw `web_sys::Storage` handle is used.

use gloo_storage::{LocalStorage, Storage};

use floodwatch_client::error::{ApiError, ApiResult};
use floodwatch_client::storage::TokenStore;
use floodwatch_shared::TOKEN_STORAGE_KEY;

/// Persists the bearer token under the `auth-token` key.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTokenStore;

/// Turns a stored value back into a token.
///
/// # Arguments
/// * `raw` - the string found under `auth-token`
///
/// # Returns
/// - `None` for an empty value
/// - the unquoted token if an earlier build left it JSON-quoted
/// - `raw` unchanged otherwise
fn decode_stored_token(raw: &str) -> Option<String> {
    let token = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    (!token.is_empty()).then(|| token.to_string())
}

impl TokenStore for LocalTokenStore {
    /// # Returns
    /// - `Some(token)` if the key holds a non-empty value
    /// - `None` if it is missing or storage is unavailable
    fn load(&self) -> Option<String> {
        let raw = LocalStorage::raw().get_item(TOKEN_STORAGE_KEY).ok()??;
        decode_stored_token(&raw)
    }

    /// # Errors
    /// `Storage` when the browser refuses the write (quota, private mode).
    fn save(&self, token: &str) -> ApiResult<()> {
        LocalStorage::raw()
            .set_item(TOKEN_STORAGE_KEY, token)
            .map_err(|e| ApiError::storage(format!("Could not persist token: {:?}", e)))
    }

    fn clear(&self) {
        let _ = LocalStorage::raw().remove_item(TOKEN_STORAGE_KEY);
    }
}
