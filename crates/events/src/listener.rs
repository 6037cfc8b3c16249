//! Listener records.
//!
//! A listener pairs a callback with the exact event name it was registered
//! for, plus an active flag that is cleared the moment it is removed.

use alloc::boxed::Box;
use alloc::string::String;
use core::cell::Cell;

/// Unique identifier for a listener on one bus.
pub type ListenerId = u64;

/// Callback type for event handlers. Receives the trigger arguments.
pub type Callback<A> = Box<dyn Fn(&[A])>;

/// A handler registered on an event bus.
pub struct Listener<A> {
    /// Unique identifier
    id: ListenerId,
    /// Event name this listener matches exactly
    event: String,
    /// Callback to invoke on trigger
    callback: Callback<A>,
    /// Cleared on removal; inactive listeners never fire
    active: Cell<bool>,
}

impl<A> Listener<A> {
    /// Creates a new listener.
    pub fn new<F>(id: ListenerId, event: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&[A]) + 'static,
    {
        Self {
            id,
            event: event.into(),
            callback: Box::new(callback),
            active: Cell::new(true),
        }
    }

    /// Returns the listener ID.
    #[inline]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Returns the event name this listener is bound to.
    #[inline]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Returns whether this listener is active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Deactivates this listener.
    ///
    /// Takes `&self` so a listener can be switched off while a dispatch
    /// snapshot still holds a reference to it.
    #[inline]
    pub fn deactivate(&self) {
        self.active.set(false);
    }

    /// Invokes the callback if the listener is still active.
    pub fn notify(&self, args: &[A]) {
        if self.active.get() {
            (self.callback)(args);
        }
    }
}

impl<A> core::fmt::Debug for Listener<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("active", &self.active.get())
            .finish()
    }
}
