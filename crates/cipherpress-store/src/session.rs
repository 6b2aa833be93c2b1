use std::cell::RefCell;
use std::rc::Rc;

use crate::auth::{AuthProvider, ListenerId, User};

/// Session state mirrored from the auth provider.
///
/// A `Session` is an explicit context value handed to the components that
/// need the signed-in user; there is no process-wide singleton. Attaching
/// subscribes to the provider and keeps the mirrored user current;
/// [`Session::detach`] ends the subscription when the owning component
/// goes away.
pub struct Session {
    state: Rc<RefCell<Option<User>>>,
    listener: Option<ListenerId>,
}

impl Session {
    /// Subscribe to a provider and mirror its session state.
    pub fn attach(provider: &mut dyn AuthProvider) -> Self {
        let state = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&state);
        // The provider fires the listener immediately, seeding the mirror
        // with the current user.
        let listener = provider.subscribe(Box::new(move |user| {
            *sink.borrow_mut() = user.cloned();
        }));
        Session {
            state,
            listener: Some(listener),
        }
    }

    /// The mirrored user, if somebody is signed in.
    pub fn user(&self) -> Option<User> {
        self.state.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Stop mirroring. The session keeps its last-seen user but no longer
    /// follows provider changes.
    pub fn detach(&mut self, provider: &mut dyn AuthProvider) {
        if let Some(id) = self.listener.take() {
            provider.unsubscribe(id);
        }
    }
}
