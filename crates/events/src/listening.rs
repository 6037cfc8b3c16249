//! The listening side of inter-entity subscriptions.
//!
//! An entity that subscribes to another entity's bus records the
//! `(bus, listener)` pair in its own `Listening` so it can detach every
//! subscription it made in one call, without the source having to know
//! who is listening.

use crate::bus::{Events, WeakEvents};
use crate::listener::ListenerId;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

/// Subscriptions one entity holds on other entities' buses.
pub struct Listening<A> {
    entries: RefCell<Vec<(WeakEvents<A>, ListenerId)>>,
}

impl<A> Default for Listening<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Listening<A> {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Subscribes to `event` on `source` and records the subscription.
    pub fn listen_to<F>(&self, source: &Events<A>, event: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&[A]) + 'static,
    {
        let id = source.on(event, callback);
        self.entries.borrow_mut().push((source.downgrade(), id));
        id
    }

    /// Detaches every recorded subscription.
    ///
    /// Returns the number of listeners removed from buses that are still alive.
    pub fn stop_listening(&self) -> usize {
        let entries = core::mem::take(&mut *self.entries.borrow_mut());
        entries
            .into_iter()
            .filter(|(bus, id)| bus.upgrade().map(|events| events.off(*id)).unwrap_or(false))
            .count()
    }

    /// Returns the number of recorded subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns true if nothing is recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
