//! Component widgets.
//!
//! A `ComponentWidget` lets a model-backed child view sit in a virtual tree
//! as one opaque node. The diff algorithm creates a fresh widget every pass
//! and drives it through the `VNode` lifecycle:
//!
//! - `init` on first mount
//! - `attach` when binding to nodes that already exist
//! - `update` against the widget that held the same position last pass
//! - `destroy` on removal
//!
//! The live view *moves* between widgets on reuse, so at most one widget owns
//! the view rendered into a given node.

use crate::dom::DomNode;
use crate::reconcile::{reconcile, Reconciliation};
use crate::view::{Constructor, Template, View, ViewArgs};
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::any::Any;
use core::cell::RefCell;
use core::fmt;
use trellis_core::Result;
use trellis_model::{Embed, Model, WIDGET_TYPE_TAG};

/// The node protocol the virtual-DOM diff algorithm drives.
pub trait VNode {
    /// Node type tag.
    fn type_tag(&self) -> &str;

    /// Stable identity within the parent's children.
    fn key(&self) -> &str;

    /// For downcasting the previous node in `update`.
    fn as_any(&self) -> &dyn Any;

    /// First mount: builds the node and returns it.
    fn init(&self) -> Result<DomNode>;

    /// Binds to an existing node without rendering from scratch.
    fn attach(&self, node: &DomNode) -> Result<()>;

    /// Reconciles against `previous`, which rendered `node` last pass.
    /// Returns the node now representing this widget.
    fn update(&self, previous: &dyn VNode, node: &DomNode) -> Result<DomNode>;

    /// Tears down. Idempotent.
    fn destroy(&self);
}

/// A virtual node wrapping a view constructor, a model and a template.
pub struct ComponentWidget {
    ctor: Constructor,
    model: Model,
    template: Template,
    key: String,
    view: RefCell<Option<Box<dyn View>>>,
}

impl ComponentWidget {
    /// Creates a widget keyed by the model's cid.
    pub fn new(ctor: Constructor, model: Model, template: Template) -> Self {
        let key = model.cid().to_string();
        Self {
            ctor,
            model,
            template,
            key,
            view: RefCell::new(None),
        }
    }

    /// Overrides the identity key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// The view constructor.
    #[inline]
    pub fn constructor(&self) -> &Constructor {
        &self.ctor
    }

    /// The model the view renders.
    #[inline]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns true while the widget owns a live view.
    pub fn has_view(&self) -> bool {
        self.view.borrow().is_some()
    }

    /// Runs `f` against the live view, if any.
    pub fn with_view<R>(&self, f: impl FnOnce(&dyn View) -> R) -> Option<R> {
        let view = self.view.borrow();
        match view.as_deref() {
            Some(view) => Some(f(view)),
            None => None,
        }
    }

    /// The live view's root node, if any.
    pub fn el(&self) -> Option<DomNode> {
        self.with_view(|view| view.el())
    }

    fn args(&self) -> ViewArgs {
        ViewArgs::new(self.model.clone(), self.template.clone())
    }

    /// Stores `view` as the live view, tearing down one left over from an
    /// earlier call.
    fn install(&self, view: Box<dyn View>) {
        let stale = self.view.borrow_mut().replace(view);
        if let Some(stale) = stale {
            stale.destroy();
        }
    }

    /// Takes the live view out, leaving the widget without one.
    fn take_view(&self) -> Option<Box<dyn View>> {
        self.view.borrow_mut().take()
    }

    /// The constructor of the live view, if any.
    fn live_constructor(&self) -> Option<Constructor> {
        if self.has_view() {
            Some(self.ctor)
        } else {
            None
        }
    }
}

impl VNode for ComponentWidget {
    fn type_tag(&self) -> &str {
        WIDGET_TYPE_TAG
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn init(&self) -> Result<DomNode> {
        let view = self.ctor.build(self.args())?;
        let el = view.el();
        self.install(view);
        tracing::debug!(key = %self.key, view = self.ctor.name(), "component initialized");
        Ok(el)
    }

    fn attach(&self, node: &DomNode) -> Result<()> {
        let view = self.ctor.build(self.args().with_el(node.clone()).hydrating())?;
        self.install(view);
        tracing::debug!(key = %self.key, view = self.ctor.name(), "component attached");
        Ok(())
    }

    fn update(&self, previous: &dyn VNode, node: &DomNode) -> Result<DomNode> {
        let previous = previous.as_any().downcast_ref::<ComponentWidget>();
        let previous_ctor = previous.and_then(ComponentWidget::live_constructor);
        let decision = reconcile(previous_ctor.as_ref(), &self.ctor);
        tracing::debug!(key = %self.key, view = self.ctor.name(), ?decision, "reconciling component");

        let reused = match (decision, previous) {
            (Reconciliation::Reuse, Some(previous)) => previous.take_view(),
            (Reconciliation::Replace, Some(previous)) => {
                let prior_tree = previous.take_view().and_then(|stale| {
                    let tree = stale.render_tree();
                    stale.destroy();
                    tree
                });
                let view = self.ctor.build(
                    self.args()
                        .with_el(node.clone())
                        .with_prior_tree(prior_tree),
                )?;
                let el = view.el();
                self.install(view);
                return Ok(el);
            }
            _ => None,
        };

        match reused {
            Some(view) => {
                view.set_element(node.clone());
                let result = view.update(&self.model);
                let el = view.el();
                self.install(view);
                result.map(|_| el)
            }
            None => {
                let view = self.ctor.build(self.args().with_el(node.clone()))?;
                let el = view.el();
                self.install(view);
                Ok(el)
            }
        }
    }

    fn destroy(&self) {
        if let Some(view) = self.take_view() {
            view.destroy();
            tracing::debug!(key = %self.key, "component destroyed");
        }
    }
}

impl Embed for ComponentWidget {
    fn type_tag(&self) -> &str {
        WIDGET_TYPE_TAG
    }

    fn model(&self) -> Option<Model> {
        Some(self.model.clone())
    }
}

impl fmt::Debug for ComponentWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentWidget")
            .field("ctor", &self.ctor)
            .field("key", &self.key)
            .field("model", &self.model.cid())
            .field("live", &self.has_view())
            .finish()
    }
}
