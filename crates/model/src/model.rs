//! The base model.
//!
//! A `Model` owns an attribute map and an event bus. Construction runs a
//! fixed sequence that cannot be overridden:
//!
//! 1. Initial attributes are stored; raw relation data becomes child
//!    entities and absent collection relations are created empty.
//! 2. The derived-attribute engine wires its listeners and computes every
//!    initial value.
//! 3. Exposed events of embedded components are bubbled to this model.
//! 4. The schema's `on_initialized` hook runs.
//!
//! # Failure Modes
//!
//! - **Panicking compute function**: the panic unwinds out of whichever call
//!   triggered the recompute (`new`, `set`, a collection mutation).
//! - **Re-entrant borrow**: none. No internal borrow is held while listeners,
//!   compute functions or hooks run.

use crate::attr::Attr;
use crate::schema::{RelationKind, Schema};
use crate::{bubbling, derived, relations};
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::HashMap;
use trellis_core::{event, Value};
use trellis_events::{Events, ListenerId, Listening, WeakEvents};

static NEXT_CID: AtomicU64 = AtomicU64::new(1);

fn next_cid() -> String {
    format!("c{}", NEXT_CID.fetch_add(1, Ordering::Relaxed))
}

pub(crate) struct ModelInner {
    /// Client id, unique per process
    cid: String,
    /// Declaration shared by every model of this type
    schema: Rc<Schema>,
    /// Current attribute values
    pub(crate) attributes: RefCell<HashMap<String, Attr>>,
    /// This model's bus
    pub(crate) events: Events<Attr>,
    /// Subscriptions this model holds on other entities
    pub(crate) listening: Listening<Attr>,
    /// Relation key -> forwarding listeners on the nested collection
    pub(crate) forwarding: RefCell<HashMap<String, (WeakEvents<Attr>, Vec<ListenerId>)>>,
    destroyed: Cell<bool>,
}

/// A model: an attribute map with change notification, relations and
/// derived attributes.
///
/// Cloning a `Model` creates a new handle to the **same** model.
pub struct Model {
    inner: Rc<ModelInner>,
}

/// A non-owning handle to a `Model`.
#[derive(Clone)]
pub struct WeakModel {
    inner: Weak<ModelInner>,
}

impl WeakModel {
    /// Upgrades to a strong handle if the model is still alive.
    pub fn upgrade(&self) -> Option<Model> {
        self.inner.upgrade().map(|inner| Model { inner })
    }
}

impl Clone for Model {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("cid", &self.inner.cid)
            .field("schema", &self.inner.schema.name())
            .field("attributes", &self.inner.attributes.borrow().len())
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

impl Model {
    /// Creates and initializes a model of type `schema`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use trellis_model::{Model, Schema};
    ///
    /// let person = Schema::builder("Person")
    ///     .derived("full_name", ["first", "last"], |m: &Model| {
    ///         format!("{} {}", m.value("first"), m.value("last"))
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// let jane = Model::new(&person, [("first", "Jane"), ("last", "Doe")]);
    /// assert_eq!(jane.value("full_name").as_str(), Some("Jane Doe"));
    ///
    /// jane.set("last", "Smith");
    /// assert_eq!(jane.value("full_name").as_str(), Some("Jane Smith"));
    /// ```
    pub fn new<I, K, V>(schema: &Rc<Schema>, attrs: I) -> Model
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Attr>,
    {
        let model = Model {
            inner: Rc::new(ModelInner {
                cid: next_cid(),
                schema: Rc::clone(schema),
                attributes: RefCell::new(HashMap::new()),
                events: Events::new(),
                listening: Listening::new(),
                forwarding: RefCell::new(HashMap::new()),
                destroyed: Cell::new(false),
            }),
        };

        for (key, value) in attrs {
            let key = key.into();
            let value = relations::materialize(schema, &key, value.into());
            relations::forward(&model, &key, Some(&value));
            model.inner.attributes.borrow_mut().insert(key, value);
        }
        relations::fill_collections(&model);

        derived::install(&model);
        bubbling::install(&model);

        if let Some(hook) = schema.on_initialized() {
            hook(&model);
        }

        tracing::debug!(cid = %model.inner.cid, schema = schema.name(), "model initialized");
        model
    }

    /// Creates a model from a raw attribute map.
    pub fn from_map(schema: &Rc<Schema>, map: &BTreeMap<String, Value>) -> Model {
        Model::new(
            schema,
            map.iter().map(|(k, v)| (k.clone(), Attr::Value(v.clone()))),
        )
    }

    /// Returns the client id.
    #[inline]
    pub fn cid(&self) -> &str {
        &self.inner.cid
    }

    /// Returns the model's schema.
    #[inline]
    pub fn schema(&self) -> &Rc<Schema> {
        &self.inner.schema
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Attr> {
        self.inner.attributes.borrow().get(key).cloned()
    }

    /// Returns the plain value stored under `key`, or Null for missing keys
    /// and entity values.
    pub fn value(&self, key: &str) -> Value {
        match self.inner.attributes.borrow().get(key) {
            Some(Attr::Value(v)) => v.clone(),
            _ => Value::Null,
        }
    }

    /// Returns true if `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.inner.attributes.borrow().contains_key(key)
    }

    /// Returns the present attribute keys (unordered).
    pub fn keys(&self) -> Vec<String> {
        self.inner.attributes.borrow().keys().cloned().collect()
    }

    /// Returns a snapshot of the present attribute values (unordered).
    pub fn values(&self) -> Vec<Attr> {
        self.inner.attributes.borrow().values().cloned().collect()
    }

    /// Stores `value` under `key`.
    ///
    /// Raw data under a relation key is turned into the declared entity; a
    /// raw list assigned to an existing collection relation resets that
    /// collection in place instead of replacing it. When the stored value
    /// differs from the previous one, `change:<key>` fires with the new value,
    /// then `change`.
    pub fn set(&self, key: &str, value: impl Into<Attr>) {
        let value = value.into();
        if self.inner.schema.graph().is_derived(key) {
            tracing::warn!(
                cid = %self.inner.cid,
                key,
                "assigning a derived attribute; it is overwritten on the next recompute"
            );
        }

        if let (Some(RelationKind::Collection), Attr::Value(Value::List(_))) =
            (self.inner.schema.relation_kind(key), &value)
        {
            if let Some(Attr::Collection(existing)) = self.get(key) {
                existing.reset_from(&value);
                return;
            }
        }

        let value = relations::materialize(&self.inner.schema, key, value);
        self.write(key, value);
    }

    /// Stores an already-materialized value and emits change events.
    pub(crate) fn write(&self, key: &str, value: Attr) {
        let changed = {
            let mut attrs = self.inner.attributes.borrow_mut();
            match attrs.get(key) {
                Some(previous) if *previous == value => false,
                _ => {
                    attrs.insert(key.to_string(), value.clone());
                    true
                }
            }
        };
        if !changed {
            return;
        }

        relations::forward(self, key, Some(&value));
        self.inner.events.trigger(&event::change(key), &[value]);
        self.inner.events.trigger(event::CHANGE, &[]);
    }

    /// Removes `key`, emitting `change:<key>` with Null, then `change`.
    ///
    /// Returns the removed value.
    pub fn unset(&self, key: &str) -> Option<Attr> {
        let removed = self.inner.attributes.borrow_mut().remove(key);
        if removed.is_some() {
            relations::forward(self, key, None);
            self.inner
                .events
                .trigger(&event::change(key), &[Attr::Value(Value::Null)]);
            self.inner.events.trigger(event::CHANGE, &[]);
        }
        removed
    }

    /// Returns the current value of every declared relation key that is
    /// present, in declaration order.
    pub fn get_children(&self) -> Vec<Attr> {
        relations::children(self)
    }

    /// Registers a listener on this model's bus.
    pub fn on<F>(&self, name: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&[Attr]) + 'static,
    {
        self.inner.events.on(name, callback)
    }

    /// Removes a listener from this model's bus.
    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.events.off(id)
    }

    /// Triggers `name` on this model's bus.
    ///
    /// Returns the number of listeners invoked.
    pub fn trigger(&self, name: &str, args: &[Attr]) -> usize {
        self.inner.events.trigger(name, args)
    }

    /// Subscribes this model to `name` on `source`.
    ///
    /// The subscription is detached by `stop_listening` or `destroy`.
    pub fn listen_to<F>(&self, source: &Events<Attr>, name: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&[Attr]) + 'static,
    {
        self.inner.listening.listen_to(source, name, callback)
    }

    /// Detaches every subscription this model made on other entities.
    pub fn stop_listening(&self) -> usize {
        self.inner.listening.stop_listening()
    }

    /// Returns the model's bus.
    #[inline]
    pub fn events(&self) -> &Events<Attr> {
        &self.inner.events
    }

    /// Tears the model down: fires `destroy`, then detaches every listener on
    /// its bus (derived-attribute wiring included), every subscription it
    /// holds on other entities and every nested forwarding. Idempotent.
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        self.inner.events.trigger(event::DESTROY, &[]);
        self.inner.events.clear();
        self.inner.listening.stop_listening();
        relations::unforward_all(self);
        tracing::debug!(cid = %self.inner.cid, "model destroyed");
    }

    /// Returns true once `destroy` has run.
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Returns a weak handle.
    pub fn downgrade(&self) -> WeakModel {
        WeakModel {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns true if both handles point at the same model.
    #[inline]
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn inner(&self) -> &ModelInner {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::schema::Relation;
    use alloc::vec;

    fn empty() -> Model {
        Model::new(&Schema::anonymous(), Vec::<(String, Attr)>::new())
    }

    #[test]
    fn test_model_new_stores_attributes() {
        let m = Model::new(&Schema::anonymous(), [("a", Attr::from(1i64)), ("b", Attr::from("x"))]);

        assert_eq!(m.value("a"), Value::Int64(1));
        assert_eq!(m.value("b").as_str(), Some("x"));
        assert!(m.has("a"));
        assert!(!m.has("c"));
        assert_eq!(m.value("c"), Value::Null);
    }

    #[test]
    fn test_model_cids_are_unique() {
        let a = empty();
        let b = empty();
        assert_ne!(a.cid(), b.cid());
        assert!(a.cid().starts_with('c'));
    }

    #[test]
    fn test_model_set_emits_change() {
        let m = empty();
        let seen = Rc::new(RefCell::new(vec![]));

        let s = seen.clone();
        m.on(event::change("name"), move |args| s.borrow_mut().push(args[0].clone()));
        let s = seen.clone();
        m.on(event::CHANGE, move |_| s.borrow_mut().push(Attr::from("*")));

        m.set("name", "Ada");

        assert_eq!(*seen.borrow(), vec![Attr::from("Ada"), Attr::from("*")]);
    }

    #[test]
    fn test_model_set_same_value_is_silent() {
        let m = Model::new(&Schema::anonymous(), [("name", "Ada")]);
        let count = Rc::new(Cell::new(0));

        let c = count.clone();
        m.on(event::change("name"), move |_| c.set(c.get() + 1));

        m.set("name", "Ada");
        assert_eq!(count.get(), 0);

        m.set("name", "Grace");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_model_unset() {
        let m = Model::new(&Schema::anonymous(), [("name", "Ada")]);
        let seen = Rc::new(RefCell::new(None));

        let s = seen.clone();
        m.on(event::change("name"), move |args| *s.borrow_mut() = Some(args[0].clone()));

        assert_eq!(m.unset("name"), Some(Attr::from("Ada")));
        assert!(!m.has("name"));
        assert_eq!(*seen.borrow(), Some(Attr::Value(Value::Null)));
        assert_eq!(m.unset("name"), None);
    }

    #[test]
    fn test_model_raw_relation_data_is_materialized() {
        let address = Schema::builder("Address").build().unwrap();
        let schema = Schema::builder("Person")
            .relation("address", Relation::one().of(&address))
            .relation("tags", Relation::many())
            .build()
            .unwrap();

        let mut raw = BTreeMap::new();
        raw.insert("city".to_string(), Value::from("Oslo"));
        let m = Model::new(&schema, [("address", Attr::Value(Value::Map(raw)))]);

        let child = m.get("address").and_then(|a| a.as_model().cloned()).unwrap();
        assert_eq!(child.schema().name(), "Address");
        assert_eq!(child.value("city").as_str(), Some("Oslo"));

        // Absent collection relations are created empty
        let tags = m.get("tags").and_then(|a| a.as_collection().cloned()).unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_model_set_raw_list_resets_collection_in_place() {
        let schema = Schema::builder("List")
            .relation("items", Relation::many())
            .build()
            .unwrap();
        let m = Model::new(&schema, Vec::<(String, Attr)>::new());
        let before = m.get("items").and_then(|a| a.as_collection().cloned()).unwrap();

        let mut raw = BTreeMap::new();
        raw.insert("n".to_string(), Value::Int64(1));
        m.set("items", vec![Value::Map(raw)]);

        let after = m.get("items").and_then(|a| a.as_collection().cloned()).unwrap();
        assert!(before.ptr_eq(&after));
        assert_eq!(after.len(), 1);
    }

    #[test]
    fn test_model_listen_to_and_stop_listening() {
        let a = empty();
        let b = empty();
        let count = Rc::new(Cell::new(0));

        let c = count.clone();
        a.listen_to(b.events(), "ping", move |_| c.set(c.get() + 1));

        b.trigger("ping", &[]);
        assert_eq!(count.get(), 1);

        assert_eq!(a.stop_listening(), 1);
        b.trigger("ping", &[]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_model_destroy_is_idempotent() {
        let m = empty();
        let destroyed = Rc::new(Cell::new(0));

        let d = destroyed.clone();
        m.on(event::DESTROY, move |_| d.set(d.get() + 1));
        m.on("other", |_| {});

        m.destroy();
        m.destroy();

        assert!(m.is_destroyed());
        assert_eq!(destroyed.get(), 1);
        assert!(m.events().is_empty());
    }

    #[test]
    fn test_model_destroy_detaches_outgoing_subscriptions() {
        let a = empty();
        let b = empty();
        a.listen_to(b.events(), "ping", |_| {});

        a.destroy();
        assert_eq!(b.events().listener_count("ping"), 0);
    }

    #[test]
    fn test_weak_model() {
        let m = empty();
        let weak = m.downgrade();
        assert!(weak.upgrade().map(|u| u.ptr_eq(&m)).unwrap_or(false));

        drop(m);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_on_initialized_runs_after_derived_values() {
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        let schema = Schema::builder("Greeter")
            .derived("greeting", ["name"], |m: &Model| format!("Hi {}", m.value("name")))
            .on_initialized(move |m| *s.borrow_mut() = Some(m.value("greeting")))
            .build()
            .unwrap();

        let _m = Model::new(&schema, [("name", "Ada")]);
        assert_eq!(*seen.borrow(), Some(Value::from("Hi Ada")));
    }

    #[test]
    fn test_model_holds_collection_by_reference() {
        let shared = Collection::new();
        let m = Model::new(&Schema::anonymous(), [("list", Attr::from(shared.clone()))]);

        let stored = m.get("list").and_then(|a| a.as_collection().cloned()).unwrap();
        assert!(stored.ptr_eq(&shared));
    }
}
