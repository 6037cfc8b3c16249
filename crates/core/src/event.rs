//! Reserved event names.
//!
//! Attribute-level notifications are namespaced by key: `change:<key>` for
//! direct value changes, `update:<key>` and `reset:<key>` for nested
//! collections stored under that key.

use alloc::format;
use alloc::string::String;

/// Emitted once after any attribute changed.
pub const CHANGE: &str = "change";
/// Emitted by a collection after an add or remove.
pub const UPDATE: &str = "update";
/// Emitted by a collection after its contents were replaced.
pub const RESET: &str = "reset";
/// Emitted by a model or collection when it is destroyed.
pub const DESTROY: &str = "destroy";

/// `change:<key>`
pub fn change(key: &str) -> String {
    format!("{}:{}", CHANGE, key)
}

/// `update:<key>`
pub fn update(key: &str) -> String {
    format!("{}:{}", UPDATE, key)
}

/// `reset:<key>`
pub fn reset(key: &str) -> String {
    format!("{}:{}", RESET, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(change("first"), "change:first");
        assert_eq!(update("items"), "update:items");
        assert_eq!(reset("items"), "reset:items");
    }
}
