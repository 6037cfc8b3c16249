//! The reuse decision made when a component widget is diffed against the
//! widget that occupied the same position in the previous pass.

use crate::view::Constructor;

/// What to do with the previous pass's live view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// Same constructor: move the live view over and update it
    Reuse,
    /// Different constructor: destroy the live view and build a new one
    Replace,
    /// No live view to reconcile against: build a new one
    Fresh,
}

/// Decides how to treat the previous live view.
///
/// `previous` is the constructor of the previous widget's live view, or None
/// if it has none. Constructor identity is the only compatibility test.
pub fn reconcile(previous: Option<&Constructor>, next: &Constructor) -> Reconciliation {
    match previous {
        Some(previous) if previous == next => Reconciliation::Reuse,
        Some(_) => Reconciliation::Replace,
        None => Reconciliation::Fresh,
    }
}
