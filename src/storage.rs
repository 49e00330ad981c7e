//! Token persistence seam.
//!
//! The bearer token is the only durable client state. The browser front end
//! backs this with `localStorage`; native callers and tests use
//! [`MemoryTokenStore`].

use std::cell::RefCell;

use crate::error::ApiResult;

pub trait TokenStore {
    /// Currently persisted token, if any.
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> ApiResult<()>;
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: RefCell<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: RefCell::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    fn save(&self, token: &str) -> ApiResult<()> {
        *self.slot.borrow_mut() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        self.slot.borrow_mut().take();
    }
}
