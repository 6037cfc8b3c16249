//! Event bus.
//!
//! This module provides `Events`, a shared handle to an ordered list of
//! listeners keyed by exact event name.

use crate::listener::{Listener, ListenerId};
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

pub(crate) struct EventsInner<A> {
    /// Listeners in registration order
    listeners: Vec<Rc<Listener<A>>>,
    /// Next listener ID to assign
    next_id: ListenerId,
}

/// A shared, single-threaded event bus.
///
/// Cloning an `Events` creates a new handle to the **same** listener list.
///
/// # Dispatch
///
/// `trigger` snapshots the matching listeners before calling any of them, so
/// handlers may freely call `on`, `off` or `trigger` on the same bus. A
/// listener removed while a dispatch is in flight is deactivated first and
/// is never invoked after its removal.
///
/// # Example
///
/// ```rust
/// use trellis_events::Events;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let events: Events<i64> = Events::new();
/// let total = Rc::new(Cell::new(0));
/// let t = total.clone();
/// events.on("add", move |args| t.set(t.get() + args[0]));
///
/// events.trigger("add", &[5]);
/// assert_eq!(total.get(), 5);
/// ```
pub struct Events<A> {
    inner: Rc<RefCell<EventsInner<A>>>,
}

impl<A> Clone for Events<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> Default for Events<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> core::fmt::Debug for Events<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Events")
            .field("listener_count", &inner.listeners.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}

impl<A> Events<A> {
    /// Creates a new, empty event bus.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(EventsInner {
                listeners: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Registers `callback` for the exact event name `event`.
    ///
    /// Returns the listener ID that can be used with `off`.
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&[A]) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push(Rc::new(Listener::new(id, event, callback)));
        id
    }

    /// Removes a listener by ID.
    ///
    /// Returns true if the listener was found and removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.listeners.iter().position(|l| l.id() == id) {
            Some(pos) => {
                let listener = inner.listeners.remove(pos);
                listener.deactivate();
                true
            }
            None => false,
        }
    }

    /// Removes every listener bound to `event`.
    ///
    /// Returns the number of listeners removed.
    pub fn off_event(&self, event: &str) -> usize {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|l| {
            if l.event() == event {
                l.deactivate();
                false
            } else {
                true
            }
        });
        before - inner.listeners.len()
    }

    /// Removes all listeners.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        for listener in inner.listeners.drain(..) {
            listener.deactivate();
        }
    }

    /// Invokes every active listener bound to `event`, in registration order.
    ///
    /// Returns the number of listeners invoked.
    pub fn trigger(&self, event: &str, args: &[A]) -> usize {
        let matching: Vec<Rc<Listener<A>>> = {
            let inner = self.inner.borrow();
            inner
                .listeners
                .iter()
                .filter(|l| l.event() == event)
                .cloned()
                .collect()
        };

        if matching.is_empty() {
            return 0;
        }

        tracing::trace!(event, listeners = matching.len(), "trigger");

        let mut fired = 0;
        for listener in &matching {
            if listener.is_active() {
                listener.notify(args);
                fired += 1;
            }
        }
        fired
    }

    /// Returns the number of registered listeners.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Returns true if no listeners are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().listeners.is_empty()
    }

    /// Returns the number of listeners bound to `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.event() == event)
            .count()
    }

    /// Returns true if both handles point at the same bus.
    #[inline]
    pub fn ptr_eq(&self, other: &Events<A>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns a weak handle that does not keep the bus alive.
    pub fn downgrade(&self) -> WeakEvents<A> {
        WeakEvents {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// A non-owning handle to an `Events` bus.
pub struct WeakEvents<A> {
    inner: Weak<RefCell<EventsInner<A>>>,
}

impl<A> Clone for WeakEvents<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<A> WeakEvents<A> {
    /// Upgrades to a strong handle if the bus is still alive.
    pub fn upgrade(&self) -> Option<Events<A>> {
        self.inner.upgrade().map(|inner| Events { inner })
    }

    /// Returns true if this handle points at `events`.
    pub fn points_to(&self, events: &Events<A>) -> bool {
        core::ptr::eq(self.inner.as_ptr(), Rc::as_ptr(&events.inner))
    }
}
