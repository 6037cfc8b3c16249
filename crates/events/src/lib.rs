//! Trellis Events - Change-notification bus for Trellis models and collections.
//!
//! This crate implements the notification contract the model layer is built
//! on: subscribe (`on`), unsubscribe (`off`), subscribe-to-another-entity
//! (`Listening::listen_to`) and `trigger`.
//!
//! # Core Concepts
//!
//! - `Events`: A shared bus of listeners keyed by exact event name
//! - `Listener`: A callback plus the name it matches and an active flag
//! - `Listening`: The subscriptions an entity made on other entities' buses
//!
//! Listeners fire synchronously, in registration order, on the same turn as
//! the `trigger` call.

#![no_std]

extern crate alloc;

pub mod bus;
pub mod listener;
pub mod listening;

pub use bus::{Events, WeakEvents};
pub use listener::{Callback, Listener, ListenerId};
pub use listening::Listening;
