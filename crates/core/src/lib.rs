//! Trellis Core - Core value and error types for the Trellis model layer.
//!
//! This crate provides the foundational types shared by every Trellis crate:
//!
//! - `Value`: Plain attribute values (Null, Boolean, Int64, Float64, String, List, Map)
//! - `Error`: Error types for declarations, rendering and reconciliation
//! - `event`: Reserved, key-namespaced event names (`change:<key>` and friends)
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{event, Value};
//!
//! let name = Value::from("Jane");
//! assert_eq!(name.as_str(), Some("Jane"));
//! assert_eq!(event::change("first"), "change:first");
//! ```

#![no_std]

extern crate alloc;

mod error;
pub mod event;
mod value;

pub use error::{Error, Result};
pub use value::Value;
