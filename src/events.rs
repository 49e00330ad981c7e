//! Session invalidation signal.
//!
//! The API client publishes here when the backend rejects the credential;
//! the session controller and the UI subscribe.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A 401/403 reply cleared the persisted token.
    Invalidated { status: u16, url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&AuthEvent)>;

#[derive(Default)]
pub struct AuthEventBus {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
}

impl AuthEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Returns
    /// The id to pass to [`Self::unsubscribe`].
    pub fn subscribe(&self, listener: impl Fn(&AuthEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Calls listeners in subscription order. Listeners may subscribe or
    /// unsubscribe while being notified.
    pub fn emit(&self, event: &AuthEvent) {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }
}
