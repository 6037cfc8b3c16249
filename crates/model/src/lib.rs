//! Trellis Model - Reactive models for the Trellis UI core.
//!
//! A `Model` is an attribute map with change notification. Its `Schema`
//! declares, once per model type:
//!
//! - **Relations**: keys holding a child `Model` or a nested `Collection`
//! - **Derived attributes**: keys recomputed synchronously from other keys
//! - **Exposed events**: events a parent re-triggers when this model is
//!   embedded in it as a component
//! - **on_initialized**: a hook run after construction finishes
//!
//! Derived declarations form a `DependencyGraph` that is checked for cycles
//! when the schema is built, so a cyclic declaration is an `Err` rather than
//! unbounded recursion at runtime.
//!
//! # Example
//!
//! ```rust
//! use trellis_model::{Collection, Model, Relation, Schema};
//!
//! let cart = Schema::builder("Cart")
//!     .relation("items", Relation::many())
//!     .derived("count", ["items"], |m: &Model| {
//!         m.get("items")
//!             .and_then(|a| a.as_collection().map(Collection::len))
//!             .unwrap_or(0) as i64
//!     })
//!     .build()
//!     .unwrap();
//!
//! let model = Model::new(&cart, Vec::<(String, trellis_model::Attr)>::new());
//! let items = model.get("items").and_then(|a| a.as_collection().cloned()).unwrap();
//!
//! items.add(Model::new(&Schema::anonymous(), [("sku", "A1")]));
//! assert_eq!(model.value("count").as_i64(), Some(1));
//! ```

#![no_std]

extern crate alloc;

pub mod attr;
pub mod bubbling;
pub mod collection;
mod derived;
pub mod graph;
pub mod model;
mod relations;
pub mod schema;

pub use attr::{Attr, Embed, WIDGET_TYPE_TAG};
pub use bubbling::component_model;
pub use collection::Collection;
pub use graph::DependencyGraph;
pub use model::{Model, WeakModel};
pub use schema::{ComputeFn, DerivedSpec, InitHook, Relation, RelationKind, Schema, SchemaBuilder};
pub use trellis_core::{Error, Result, Value};
