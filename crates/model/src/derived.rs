//! Derived-attribute engine.
//!
//! Every well-formed derived declaration with dependencies gets three
//! listeners per dependency key on the owning model: `change:<dep>`,
//! `update:<dep>` and `reset:<dep>`. Each one recomputes the target
//! synchronously. Nothing is batched: a diamond (two paths from one source
//! to the same target) recomputes the target once per incoming edge.
//!
//! A target declared as a collection relation keeps its identity; the
//! computed result replaces the collection's contents in place.

use crate::attr::Attr;
use crate::model::Model;
use crate::relations;
use crate::schema::{DerivedSpec, RelationKind};
use alloc::rc::Rc;
use alloc::string::String;

/// Wires the derived listeners of `model` and computes every initial value.
pub(crate) fn install(model: &Model) {
    let schema = Rc::clone(model.schema());

    for (target, spec) in schema.derived() {
        if !spec.is_well_formed() {
            continue;
        }
        for dep in schema.graph().dependencies_of(target) {
            for name in [
                trellis_core::event::change(dep),
                trellis_core::event::update(dep),
                trellis_core::event::reset(dep),
            ] {
                let weak = model.downgrade();
                let target: String = target.clone();
                model.on(name, move |_| {
                    if let Some(model) = weak.upgrade() {
                        recompute(&model, &target);
                    }
                });
            }
        }
    }

    for target in schema.initial_order() {
        recompute(model, target);
    }
}

/// Recomputes `target` and stores the result.
pub(crate) fn recompute(model: &Model, target: &str) {
    if model.is_destroyed() {
        return;
    }
    let compute = match model
        .schema()
        .derived_spec(target)
        .and_then(DerivedSpec::compute)
    {
        Some(compute) => Rc::clone(compute),
        None => return,
    };

    tracing::trace!(cid = %model.cid(), key = target, "recomputing derived attribute");
    let value = compute(model);

    if model.schema().relation_kind(target) == Some(RelationKind::Collection) {
        if let Some(Attr::Collection(existing)) = model.get(target) {
            if !existing.reset_from(&value) {
                tracing::warn!(
                    cid = %model.cid(),
                    key = target,
                    value = ?value,
                    "derived collection produced an unsupported shape; keeping contents"
                );
            }
            return;
        }
    }

    let value = relations::materialize(model.schema(), target, value);
    model.write(target, value);
}
