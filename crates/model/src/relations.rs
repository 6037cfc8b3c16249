//! Relation keys: materialization, nested forwarding and traversal.
//!
//! A relation key holds a child entity. Raw data assigned to it is turned
//! into that entity, and a collection stored under key `k` has its `update`
//! and `reset` events re-emitted on the owning model as `update:k` and
//! `reset:k`, which is what lets derived attributes depend on collection
//! contents.

use crate::attr::Attr;
use crate::collection::Collection;
use crate::model::Model;
use crate::schema::{RelationKind, Schema};
use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec::Vec;
use trellis_core::{event, Value};

/// Turns raw data under a relation key into the declared entity.
///
/// Values under undeclared keys, entities, and shapes that do not match the
/// relation kind pass through unchanged.
pub(crate) fn materialize(schema: &Rc<Schema>, key: &str, value: Attr) -> Attr {
    let relation = match schema.relation(key) {
        Some(relation) => relation,
        None => return value,
    };

    match (relation.kind(), value) {
        (RelationKind::Model, Attr::Value(Value::Map(map))) => {
            Attr::Model(Model::from_map(&relation.schema_or_anonymous(), &map))
        }
        (RelationKind::Collection, Attr::Value(Value::List(items))) => {
            Attr::Collection(Collection::from_values(relation.schema(), &items))
        }
        (RelationKind::Collection, Attr::Model(model)) => {
            Attr::Collection(Collection::from_models(alloc::vec![model]))
        }
        (_, other) => other,
    }
}

/// Creates an empty collection for every collection relation that is absent.
///
/// Runs during construction, before any listener exists, so no change events
/// are emitted.
pub(crate) fn fill_collections(model: &Model) {
    let schema = Rc::clone(model.schema());
    for (key, relation) in schema.relations() {
        if relation.kind() != RelationKind::Collection || model.has(key) {
            continue;
        }
        let collection = match relation.schema() {
            Some(child) => Collection::with_schema(child),
            None => Collection::new(),
        };
        let value = Attr::Collection(collection);
        forward(model, key, Some(&value));
        model
            .inner()
            .attributes
            .borrow_mut()
            .insert(key.clone(), value);
    }
}

/// Points the forwarding for `key` at `value`.
///
/// Any forwarding from a previous collection under `key` is detached unless
/// `value` is that same collection.
pub(crate) fn forward(model: &Model, key: &str, value: Option<&Attr>) {
    let collection = value.and_then(Attr::as_collection);

    if let (Some(collection), Some((source, _))) =
        (collection, model.inner().forwarding.borrow().get(key))
    {
        if source.points_to(collection.events()) {
            return;
        }
    }

    unforward(model, key);

    let collection = match collection {
        Some(collection) => collection,
        None => return,
    };

    let mut ids = Vec::with_capacity(2);
    for (kind, forwarded) in [
        (event::UPDATE, event::update(key)),
        (event::RESET, event::reset(key)),
    ] {
        let owner = model.downgrade();
        ids.push(collection.on(kind, move |args| {
            if let Some(owner) = owner.upgrade() {
                owner.trigger(&forwarded, args);
            }
        }));
    }

    model
        .inner()
        .forwarding
        .borrow_mut()
        .insert(key.to_string(), (collection.events().downgrade(), ids));
}

/// Detaches the forwarding for `key`, if any.
pub(crate) fn unforward(model: &Model, key: &str) {
    let entry = model.inner().forwarding.borrow_mut().remove(key);
    if let Some((source, ids)) = entry {
        if let Some(events) = source.upgrade() {
            for id in ids {
                events.off(id);
            }
        }
    }
}

/// Detaches every forwarding the model holds.
pub(crate) fn unforward_all(model: &Model) {
    let entries: Vec<_> = model.inner().forwarding.borrow_mut().drain().collect();
    for (_, (source, ids)) in entries {
        if let Some(events) = source.upgrade() {
            for id in ids {
                events.off(id);
            }
        }
    }
}

/// Current values of the declared relation keys that are present.
pub(crate) fn children(model: &Model) -> Vec<Attr> {
    model
        .schema()
        .relations()
        .iter()
        .filter_map(|(key, _)| model.get(key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Relation;
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use core::cell::Cell;

    fn schema() -> Rc<Schema> {
        Schema::builder("Order")
            .relation("customer", Relation::one())
            .relation("lines", Relation::many())
            .relation("notes", Relation::many())
            .build()
            .unwrap()
    }

    #[test]
    fn test_get_children_skips_absent_relations() {
        let order = Model::new(&schema(), Vec::<(String, Attr)>::new());

        // Collections are created empty, single models stay absent
        let children = order.get_children();
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c.as_collection().is_some()));

        order.unset("notes");
        assert_eq!(order.get_children().len(), 1);
    }

    #[test]
    fn test_get_children_reflects_current_values() {
        let order = Model::new(&schema(), Vec::<(String, Attr)>::new());
        let alice = Model::new(&Schema::anonymous(), [("name", "Alice")]);
        let bob = Model::new(&Schema::anonymous(), [("name", "Bob")]);

        order.set("customer", alice);
        order.set("customer", bob.clone());

        let children = order.get_children();
        assert_eq!(children.len(), 3);
        // Declaration order: customer, lines, notes
        assert_eq!(children[0], Attr::Model(bob));
    }

    #[test]
    fn test_materialize_raw_map() {
        let mut raw = BTreeMap::new();
        raw.insert("name".to_string(), Value::from("Alice"));

        let attr = materialize(&schema(), "customer", Attr::Value(Value::Map(raw.clone())));
        assert_eq!(
            attr.as_model().map(|m| m.value("name")),
            Some(Value::from("Alice"))
        );

        // Undeclared keys keep raw data
        let attr = materialize(&schema(), "meta", Attr::Value(Value::Map(raw)));
        assert!(attr.as_value().is_some());
    }

    #[test]
    fn test_collection_events_are_forwarded() {
        let order = Model::new(&schema(), Vec::<(String, Attr)>::new());
        let lines = order.get("lines").and_then(|a| a.as_collection().cloned()).unwrap();

        let updates = Rc::new(Cell::new(0));
        let resets = Rc::new(Cell::new(0));
        let u = updates.clone();
        order.on(event::update("lines"), move |_| u.set(u.get() + 1));
        let r = resets.clone();
        order.on(event::reset("lines"), move |_| r.set(r.get() + 1));

        lines.add(Model::new(&Schema::anonymous(), [("sku", "A1")]));
        lines.reset(Vec::new());

        assert_eq!(updates.get(), 1);
        assert_eq!(resets.get(), 1);
    }

    #[test]
    fn test_replacing_collection_detaches_forwarding() {
        let order = Model::new(&schema(), Vec::<(String, Attr)>::new());
        let old = order.get("lines").and_then(|a| a.as_collection().cloned()).unwrap();
        let replacement = Collection::new();

        let updates = Rc::new(Cell::new(0));
        let u = updates.clone();
        order.on(event::update("lines"), move |_| u.set(u.get() + 1));

        order.set("lines", replacement.clone());
        assert!(old.events().is_empty());

        old.add(Model::new(&Schema::anonymous(), [("sku", "A1")]));
        assert_eq!(updates.get(), 0);

        replacement.add(Model::new(&Schema::anonymous(), [("sku", "B2")]));
        assert_eq!(updates.get(), 1);
    }

    #[test]
    fn test_destroy_detaches_all_forwarding() {
        let order = Model::new(&schema(), Vec::<(String, Attr)>::new());
        let lines = order.get("lines").and_then(|a| a.as_collection().cloned()).unwrap();

        order.destroy();
        assert!(lines.events().is_empty());
    }
}
