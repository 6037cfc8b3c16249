//! Event bubbling from embedded components.
//!
//! When a model is constructed, every attribute holding a component widget
//! whose model exposes events gets those events re-triggered on the parent
//! under the same name with the same arguments.

use crate::attr::{Attr, WIDGET_TYPE_TAG};
use crate::model::Model;
use alloc::string::String;
use alloc::vec::Vec;

/// Returns the model of a component widget attribute.
///
/// Only `Attr::Widget` values whose type tag is `WIDGET_TYPE_TAG` and that
/// carry a model are components; everything else yields None.
pub fn component_model(attr: &Attr) -> Option<Model> {
    match attr {
        Attr::Widget(widget) if widget.type_tag() == WIDGET_TYPE_TAG => widget.model(),
        _ => None,
    }
}

/// Subscribes `model` to the exposed events of its embedded components.
pub(crate) fn install(model: &Model) {
    let mut keys = model.keys();
    keys.sort();

    for key in keys {
        let child = match model.get(&key).as_ref().and_then(component_model) {
            Some(child) => child,
            None => continue,
        };
        let exposed: Vec<String> = match child.schema().exposed_events() {
            Some(events) => events.to_vec(),
            None => continue,
        };

        tracing::debug!(
            parent = %model.cid(),
            child = %child.cid(),
            key = %key,
            events = exposed.len(),
            "bubbling component events"
        );
        for name in exposed {
            let parent = model.downgrade();
            let forwarded = name.clone();
            model.listen_to(child.events(), name, move |args| {
                if let Some(parent) = parent.upgrade() {
                    parent.trigger(&forwarded, args);
                }
            });
        }
    }
}
