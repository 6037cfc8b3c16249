//! Trellis VDOM - Model-backed component widgets for a virtual DOM.
//!
//! The diff/patch algorithm itself lives outside this crate. What lives here
//! is one node type that plugs into it: `ComponentWidget`, which wraps a view
//! constructor, a model and a template so a whole child view can be diffed as
//! a single node and reused across renders.
//!
//! # Reconciliation
//!
//! When the diff algorithm pairs a new widget with the one that rendered the
//! same position last pass, `reconcile` picks one of three outcomes:
//!
//! - `Reuse`: same view constructor. The live view moves to the new widget,
//!   is rebound to the node and updated with the new model.
//! - `Replace`: different constructor. The old view's render tree is kept as
//!   a diffing hint, the old view is destroyed, and a new one is built.
//! - `Fresh`: no live view to compare with. A new view is built.
//!
//! # Example
//!
//! ```rust
//! use trellis_model::{Model, Schema};
//! use trellis_vdom::{template, ComponentWidget, Constructor, TemplateView, VNode, VTree};
//!
//! let model = Model::new(&Schema::anonymous(), [("text", "hello")]);
//! let label = template(|m: &Model| {
//!     Ok(VTree::element("span").child(VTree::text(m.value("text").to_string())))
//! });
//!
//! let first = ComponentWidget::new(Constructor::of::<TemplateView>(), model.clone(), label.clone());
//! let node = first.init().unwrap();
//! assert_eq!(node.text_content(), "hello");
//!
//! // Next render pass: same constructor, so the view is reused
//! model.set("text", "bye");
//! let second = ComponentWidget::new(Constructor::of::<TemplateView>(), model, label);
//! let node = second.update(&first, &node).unwrap();
//! assert_eq!(node.text_content(), "bye");
//! assert!(!first.has_view());
//! ```

#![no_std]

extern crate alloc;

pub mod dom;
pub mod reconcile;
pub mod view;
pub mod vtree;
pub mod widget;

pub use dom::DomNode;
pub use reconcile::{reconcile, Reconciliation};
pub use view::{template, Construct, Constructor, Template, TemplateView, View, ViewArgs};
pub use vtree::VTree;
pub use widget::{ComponentWidget, VNode};
