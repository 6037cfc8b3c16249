//! Nested collections.
//!
//! A `Collection` is an ordered, shared list of models with its own event
//! bus. Adds and removes emit `update`; wholesale replacement emits `reset`.
//! When a collection sits under a relation key, its owning model re-emits
//! those as `update:<key>` / `reset:<key>`.

use crate::attr::Attr;
use crate::model::Model;
use crate::schema::Schema;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use trellis_core::{event, Value};
use trellis_events::{Events, ListenerId};

struct CollectionInner {
    /// Current contents
    models: RefCell<Vec<Model>>,
    /// Bus for add/remove/update/reset
    events: Events<Attr>,
    /// Schema for models built from raw data
    schema: Option<Rc<Schema>>,
}

/// An ordered, shared list of models.
///
/// Cloning a `Collection` creates a new handle to the **same** list; identity
/// is preserved across `reset`.
pub struct Collection {
    inner: Rc<CollectionInner>,
}

impl Clone for Collection {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("len", &self.len())
            .field("schema", &self.inner.schema.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl Collection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::build(Vec::new(), None)
    }

    /// Creates an empty collection that builds raw entries with `schema`.
    pub fn with_schema(schema: &Rc<Schema>) -> Self {
        Self::build(Vec::new(), Some(Rc::clone(schema)))
    }

    /// Creates a collection holding `models`.
    pub fn from_models(models: Vec<Model>) -> Self {
        Self::build(models, None)
    }

    /// Creates a collection from raw entries, one model per map.
    ///
    /// Entries that are not maps are skipped.
    pub fn from_values(schema: Option<&Rc<Schema>>, values: &[Value]) -> Self {
        let schema = schema.cloned();
        let models = models_from_values(schema.as_ref(), values);
        Self::build(models, schema)
    }

    fn build(models: Vec<Model>, schema: Option<Rc<Schema>>) -> Self {
        Self {
            inner: Rc::new(CollectionInner {
                models: RefCell::new(models),
                events: Events::new(),
                schema,
            }),
        }
    }

    /// Returns the number of models.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.models.borrow().len()
    }

    /// Returns true if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.models.borrow().is_empty()
    }

    /// Returns the model at `index`.
    pub fn get(&self, index: usize) -> Option<Model> {
        self.inner.models.borrow().get(index).cloned()
    }

    /// Returns a snapshot of the current models.
    pub fn models(&self) -> Vec<Model> {
        self.inner.models.borrow().clone()
    }

    /// Returns true if `model` is in the collection.
    pub fn contains(&self, model: &Model) -> bool {
        self.inner.models.borrow().iter().any(|m| m.ptr_eq(model))
    }

    /// Returns the schema used for raw entries, if any.
    #[inline]
    pub fn schema(&self) -> Option<&Rc<Schema>> {
        self.inner.schema.as_ref()
    }

    /// Appends a model, emitting `add` then `update`.
    pub fn add(&self, model: Model) {
        self.inner.models.borrow_mut().push(model.clone());
        self.inner.events.trigger("add", &[Attr::Model(model)]);
        self.inner.events.trigger(event::UPDATE, &[]);
    }

    /// Removes a model, emitting `remove` then `update`.
    ///
    /// Returns true if the model was found and removed.
    pub fn remove(&self, model: &Model) -> bool {
        let removed = {
            let mut models = self.inner.models.borrow_mut();
            models
                .iter()
                .position(|m| m.ptr_eq(model))
                .map(|pos| models.remove(pos))
        };
        match removed {
            Some(model) => {
                self.inner.events.trigger("remove", &[Attr::Model(model)]);
                self.inner.events.trigger(event::UPDATE, &[]);
                true
            }
            None => false,
        }
    }

    /// Replaces the contents in place, emitting `reset`.
    pub fn reset(&self, models: Vec<Model>) {
        *self.inner.models.borrow_mut() = models;
        self.inner.events.trigger(event::RESET, &[]);
    }

    /// Replaces the contents from a computed attribute.
    ///
    /// Accepts another collection (its models are copied), a single model,
    /// a list of raw maps, or null (clears). Returns false, leaving the
    /// contents untouched, for any other shape.
    pub fn reset_from(&self, value: &Attr) -> bool {
        let models = match value {
            Attr::Collection(other) if other.ptr_eq(self) => return true,
            Attr::Collection(other) => other.models(),
            Attr::Model(model) => alloc::vec![model.clone()],
            Attr::Value(Value::List(items)) => models_from_values(self.schema(), items),
            Attr::Value(Value::Null) => Vec::new(),
            _ => return false,
        };
        self.reset(models);
        true
    }

    /// Returns the collection's event bus.
    #[inline]
    pub fn events(&self) -> &Events<Attr> {
        &self.inner.events
    }

    /// Registers a listener on the collection's bus.
    pub fn on<F>(&self, name: &str, callback: F) -> ListenerId
    where
        F: Fn(&[Attr]) + 'static,
    {
        self.inner.events.on(name, callback)
    }

    /// Returns true if both handles point at the same collection.
    #[inline]
    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Builds one model per map entry; non-map entries are skipped.
fn models_from_values(schema: Option<&Rc<Schema>>, values: &[Value]) -> Vec<Model> {
    values
        .iter()
        .filter_map(|value| match value {
            Value::Map(map) => {
                let schema = schema.cloned().unwrap_or_else(Schema::anonymous);
                Some(Model::from_map(&schema, map))
            }
            other => {
                tracing::warn!(kind = other.kind(), "skipping non-map collection entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use core::cell::Cell;

    fn model(name: &str) -> Model {
        Model::new(&Schema::anonymous(), [("name", name)])
    }

    fn raw(name: &str) -> Value {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::from(name));
        Value::Map(map)
    }

    fn names(collection: &Collection) -> Vec<String> {
        collection
            .models()
            .iter()
            .map(|m| m.value("name").to_string())
            .collect()
    }

    #[test]
    fn test_collection_new() {
        let c = Collection::new();
        assert!(c.is_empty());
        assert!(c.get(0).is_none());
    }

    #[test]
    fn test_collection_add_emits_update() {
        let c = Collection::new();
        let updates = Rc::new(Cell::new(0));
        let u = updates.clone();
        c.on(event::UPDATE, move |_| u.set(u.get() + 1));

        c.add(model("a"));
        c.add(model("b"));

        assert_eq!(c.len(), 2);
        assert_eq!(updates.get(), 2);
        assert_eq!(names(&c), vec!["a", "b"]);
    }

    #[test]
    fn test_collection_remove() {
        let c = Collection::new();
        let a = model("a");
        c.add(a.clone());

        let updates = Rc::new(Cell::new(0));
        let u = updates.clone();
        c.on(event::UPDATE, move |_| u.set(u.get() + 1));

        assert!(c.remove(&a));
        assert!(!c.remove(&a)); // Already removed
        assert!(c.is_empty());
        assert_eq!(updates.get(), 1);
    }

    #[test]
    fn test_collection_reset_preserves_identity() {
        let c = Collection::from_models(vec![model("a")]);
        let handle = c.clone();

        let resets = Rc::new(Cell::new(0));
        let r = resets.clone();
        c.on(event::RESET, move |_| r.set(r.get() + 1));

        c.reset(vec![model("x"), model("y")]);

        assert!(handle.ptr_eq(&c));
        assert_eq!(names(&handle), vec!["x", "y"]);
        assert_eq!(resets.get(), 1);
    }

    #[test]
    fn test_collection_from_values() {
        let item = Schema::builder("Item").build().unwrap();
        let c = Collection::from_values(Some(&item), &[raw("a"), Value::Int64(1), raw("b")]);

        assert_eq!(names(&c), vec!["a", "b"]);
        assert_eq!(c.get(0).map(|m| m.schema().name().to_string()), Some("Item".to_string()));
    }

    #[test]
    fn test_collection_reset_from_shapes() {
        let c = Collection::new();

        assert!(c.reset_from(&Attr::from(vec![raw("a"), raw("b")])));
        assert_eq!(names(&c), vec!["a", "b"]);

        let other = Collection::from_models(vec![model("z")]);
        assert!(c.reset_from(&Attr::Collection(other.clone())));
        assert_eq!(names(&c), vec!["z"]);
        assert!(!c.ptr_eq(&other));

        assert!(c.reset_from(&Attr::Model(model("m"))));
        assert_eq!(names(&c), vec!["m"]);

        assert!(c.reset_from(&Attr::Value(Value::Null)));
        assert!(c.is_empty());
    }

    #[test]
    fn test_collection_reset_from_rejects_scalars() {
        let c = Collection::from_models(vec![model("a")]);
        assert!(!c.reset_from(&Attr::from(42i64)));
        assert_eq!(names(&c), vec!["a"]);
    }
}
