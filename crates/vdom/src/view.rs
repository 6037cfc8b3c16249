//! Views and view constructors.
//!
//! A `View` binds a model to a root `DomNode` through a template. Views are
//! created through a `Constructor`, whose identity (the view's type) is the
//! only thing reconciliation compares.

use crate::dom::DomNode;
use crate::vtree::VTree;
use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::any::{type_name, Any, TypeId};
use core::cell::{Cell, RefCell};
use core::fmt;
use trellis_core::{event, Error, Result};
use trellis_events::ListenerId;
use trellis_model::Model;

/// Renders a model into a virtual tree.
pub type Template = Rc<dyn Fn(&Model) -> Result<VTree>>;

/// Wraps a closure as a `Template`.
pub fn template<F>(f: F) -> Template
where
    F: Fn(&Model) -> Result<VTree> + 'static,
{
    Rc::new(f)
}

/// A live child view.
pub trait View {
    /// The view's root node.
    fn el(&self) -> DomNode;

    /// Rebinds the view to another root node.
    fn set_element(&self, el: DomNode);

    /// Switches to `model` (if different) and re-renders incrementally.
    ///
    /// Also reports a failed re-render the view ran on its own since the
    /// last call.
    fn update(&self, model: &Model) -> Result<()>;

    /// The last rendered tree, used as a diffing hint by a replacement view.
    fn render_tree(&self) -> Option<VTree>;

    /// Detaches every listener the view holds. Idempotent.
    fn destroy(&self);

    /// For downcasting in callers that know the concrete view type.
    fn as_any(&self) -> &dyn Any;
}

/// Everything a constructor receives.
pub struct ViewArgs {
    /// The model the view renders
    pub model: Model,
    /// The template the view renders with
    pub template: Template,
    /// Existing root node to bind to; None renders a fresh one
    pub el: Option<DomNode>,
    /// Tree currently displayed in `el`, left by a destroyed view
    pub prior_tree: Option<VTree>,
    /// Bind to `el` as-is without rendering into it
    pub hydrate: bool,
}

impl ViewArgs {
    /// Arguments for a freshly rendered view.
    pub fn new(model: Model, template: Template) -> Self {
        Self {
            model,
            template,
            el: None,
            prior_tree: None,
            hydrate: false,
        }
    }

    /// Binds to an existing node.
    pub fn with_el(mut self, el: DomNode) -> Self {
        self.el = Some(el);
        self
    }

    /// Supplies the tree currently displayed in the node.
    pub fn with_prior_tree(mut self, tree: Option<VTree>) -> Self {
        self.prior_tree = tree;
        self
    }

    /// Adopts the node without rendering into it.
    pub fn hydrating(mut self) -> Self {
        self.hydrate = true;
        self
    }
}

/// A view type that can be built by a `Constructor`.
pub trait Construct: View + Sized + 'static {
    /// Builds the view. Must synchronously produce a root node.
    fn construct(args: ViewArgs) -> Result<Self>;
}

fn build_view<V: Construct>(args: ViewArgs) -> Result<Box<dyn View>> {
    V::construct(args).map(|view| Box::new(view) as Box<dyn View>)
}

/// A view constructor. Two constructors are equal when they build the same
/// view type.
#[derive(Clone, Copy)]
pub struct Constructor {
    id: TypeId,
    name: &'static str,
    build: fn(ViewArgs) -> Result<Box<dyn View>>,
}

impl Constructor {
    /// The constructor of view type `V`.
    pub fn of<V: Construct>() -> Self {
        Self {
            id: TypeId::of::<V>(),
            name: type_name::<V>(),
            build: build_view::<V>,
        }
    }

    /// The view type's name, for logs.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Builds a view.
    pub fn build(&self, args: ViewArgs) -> Result<Box<dyn View>> {
        (self.build)(args)
    }
}

impl PartialEq for Constructor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Constructor {}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constructor").field(&self.name).finish()
    }
}

struct TemplateViewInner {
    model: RefCell<Model>,
    template: Template,
    el: RefCell<DomNode>,
    tree: RefCell<Option<VTree>>,
    /// `change` listener on the current model
    listener: Cell<Option<ListenerId>>,
    /// Error from a re-render run by the `change` listener, held for `update`
    failure: Cell<Option<Error>>,
    renders: Cell<usize>,
    destroyed: Cell<bool>,
}

/// The stock view: renders `template(model)` and re-renders whenever the
/// model emits `change`.
pub struct TemplateView {
    inner: Rc<TemplateViewInner>,
}

impl TemplateView {
    /// Number of times the view wrote a tree into its node.
    #[inline]
    pub fn renders(&self) -> usize {
        self.inner.renders.get()
    }

    /// The model the view currently renders.
    pub fn model(&self) -> Model {
        self.inner.model.borrow().clone()
    }

    /// Returns true once `destroy` has run.
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    fn listen(inner: &Rc<TemplateViewInner>) {
        let weak: Weak<TemplateViewInner> = Rc::downgrade(inner);
        let model = inner.model.borrow().clone();
        let id = model.on(event::CHANGE, move |_| {
            if let Some(inner) = weak.upgrade() {
                if let Err(err) = render(&inner) {
                    tracing::warn!(error = %err, "re-render after model change failed");
                    inner.failure.set(Some(err));
                }
            }
        });
        inner.listener.set(Some(id));
    }

    fn unlisten(inner: &TemplateViewInner) {
        if let Some(id) = inner.listener.take() {
            let model = inner.model.borrow().clone();
            model.off(id);
        }
    }
}

/// Renders the current model and patches the root node if the tree changed.
///
/// A tree whose root does not fit the current node gets a new root node.
fn render(inner: &TemplateViewInner) -> Result<()> {
    if inner.destroyed.get() {
        return Ok(());
    }
    let model = inner.model.borrow().clone();
    let next = (inner.template)(&model)?;

    if inner.tree.borrow().as_ref() == Some(&next) {
        tracing::trace!(cid = %model.cid(), "tree unchanged; skipping patch");
        return Ok(());
    }

    let el = inner.el.borrow().clone();
    let patched = next.patch_or_replace(&el);
    if !patched.ptr_eq(&el) {
        tracing::debug!(cid = %model.cid(), "root changed; replacing node");
        *inner.el.borrow_mut() = patched;
    }
    *inner.tree.borrow_mut() = Some(next);
    inner.renders.set(inner.renders.get() + 1);
    Ok(())
}

impl Construct for TemplateView {
    fn construct(args: ViewArgs) -> Result<Self> {
        let tree = (args.template)(&args.model)?;

        let (el, renders) = match args.el {
            None => (tree.materialize(), 1),
            Some(el) if args.hydrate => (el, 0),
            Some(el) => {
                if args.prior_tree.as_ref() == Some(&tree) {
                    (el, 0)
                } else {
                    (tree.patch_or_replace(&el), 1)
                }
            }
        };

        let inner = Rc::new(TemplateViewInner {
            model: RefCell::new(args.model),
            template: args.template,
            el: RefCell::new(el),
            tree: RefCell::new(Some(tree)),
            listener: Cell::new(None),
            failure: Cell::new(None),
            renders: Cell::new(renders),
            destroyed: Cell::new(false),
        });
        Self::listen(&inner);

        tracing::debug!(
            cid = %inner.model.borrow().cid(),
            hydrated = args.hydrate,
            "template view constructed"
        );
        Ok(Self { inner })
    }
}

impl View for TemplateView {
    fn el(&self) -> DomNode {
        self.inner.el.borrow().clone()
    }

    fn set_element(&self, el: DomNode) {
        let moved = !self.inner.el.borrow().ptr_eq(&el);
        if moved {
            // The new node shows nothing we rendered
            *self.inner.tree.borrow_mut() = None;
            *self.inner.el.borrow_mut() = el;
        }
    }

    fn update(&self, model: &Model) -> Result<()> {
        if self.inner.destroyed.get() {
            return Ok(());
        }
        let same = self.inner.model.borrow().ptr_eq(model);
        if !same {
            Self::unlisten(&self.inner);
            *self.inner.model.borrow_mut() = model.clone();
            Self::listen(&self.inner);
        }
        let pending = self.inner.failure.take();
        render(&self.inner)?;
        pending.map_or(Ok(()), Err)
    }

    fn render_tree(&self) -> Option<VTree> {
        self.inner.tree.borrow().clone()
    }

    fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        Self::unlisten(&self.inner);
        tracing::debug!(cid = %self.inner.model.borrow().cid(), "template view destroyed");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use trellis_core::Error;
    use trellis_model::Schema;

    fn label() -> Template {
        template(|m: &Model| Ok(VTree::element("span").child(VTree::text(format!("{}", m.value("text"))))))
    }

    fn model(text: &str) -> Model {
        Model::new(&Schema::anonymous(), [("text", text)])
    }

    #[test]
    fn test_construct_renders_fresh_node() {
        let view = TemplateView::construct(ViewArgs::new(model("hi"), label())).unwrap();

        assert_eq!(view.el().text_content(), "hi");
        assert_eq!(view.renders(), 1);
    }

    #[test]
    fn test_rerenders_on_model_change() {
        let m = model("hi");
        let view = TemplateView::construct(ViewArgs::new(m.clone(), label())).unwrap();
        let el = view.el();

        m.set("text", "bye");
        assert_eq!(el.text_content(), "bye");
        assert!(view.el().ptr_eq(&el));
        assert_eq!(view.renders(), 2);

        // A change that leaves the tree alone does not patch
        m.set("other", 1i64);
        assert_eq!(view.renders(), 2);
    }

    #[test]
    fn test_destroy_stops_rerendering() {
        let m = model("hi");
        let view = TemplateView::construct(ViewArgs::new(m.clone(), label())).unwrap();

        view.destroy();
        view.destroy();
        m.set("text", "bye");

        assert!(view.is_destroyed());
        assert_eq!(view.el().text_content(), "hi");
        assert_eq!(m.events().listener_count(event::CHANGE), 0);
    }

    #[test]
    fn test_hydration_keeps_existing_content() {
        let existing = DomNode::element("span");
        existing.append_child(DomNode::text("server"));

        let args = ViewArgs::new(model("client"), label())
            .with_el(existing.clone())
            .hydrating();
        let view = TemplateView::construct(args).unwrap();

        assert!(view.el().ptr_eq(&existing));
        assert_eq!(existing.text_content(), "server");
        assert_eq!(view.renders(), 0);
    }

    #[test]
    fn test_prior_tree_skips_identical_patch() {
        let m = model("same");
        let prior = label()(&m).unwrap();
        let el = prior.materialize();

        let args = ViewArgs::new(m, label())
            .with_el(el.clone())
            .with_prior_tree(Some(prior));
        let view = TemplateView::construct(args).unwrap();

        assert_eq!(view.renders(), 0);
        assert!(view.el().ptr_eq(&el));
    }

    #[test]
    fn test_update_switches_model() {
        let a = model("a");
        let b = model("b");
        let view = TemplateView::construct(ViewArgs::new(a.clone(), label())).unwrap();

        view.update(&b).unwrap();
        assert_eq!(view.el().text_content(), "b");
        assert_eq!(a.events().listener_count(event::CHANGE), 0);

        b.set("text", "b2");
        assert_eq!(view.el().text_content(), "b2");
    }

    #[test]
    fn test_template_error_propagates() {
        let failing = template(|_: &Model| Err(Error::render("boom")));
        let result = TemplateView::construct(ViewArgs::new(model("x"), failing));
        assert!(matches!(result, Err(Error::Render { .. })));
    }

    #[test]
    fn test_set_element_repaints_new_node() {
        let m = model("hi");
        let view = TemplateView::construct(ViewArgs::new(m.clone(), label())).unwrap();
        let fresh = DomNode::element("span");

        view.set_element(fresh.clone());
        view.update(&m).unwrap();

        assert!(view.el().ptr_eq(&fresh));
        assert_eq!(fresh.text_content(), "hi");
        assert_eq!(view.renders(), 2);

        // Same node again is a no-op
        view.set_element(fresh.clone());
        view.update(&m).unwrap();
        assert_eq!(view.renders(), 2);
    }

    #[test]
    fn test_root_change_replaces_node() {
        let m = model("inline");
        let shape = template(|m: &Model| {
            let tag = if m.value("block").as_bool().unwrap_or(false) { "div" } else { "span" };
            Ok(VTree::element(tag).child(VTree::text(format!("{}", m.value("text")))))
        });
        let view = TemplateView::construct(ViewArgs::new(m.clone(), shape)).unwrap();
        let before = view.el();

        m.set("block", true);

        assert!(!view.el().ptr_eq(&before));
        assert_eq!(view.el().tag().as_deref(), Some("div"));
        assert_eq!(view.el().text_content(), "inline");
    }

    #[test]
    fn test_failed_rerender_reported_by_next_update() {
        let m = model("ok");
        let strict = template(|m: &Model| {
            if m.value("text").as_str() == Some("bad") {
                return Err(Error::render("bad text"));
            }
            Ok(VTree::element("span").child(VTree::text(format!("{}", m.value("text")))))
        });
        let view = TemplateView::construct(ViewArgs::new(m.clone(), strict)).unwrap();

        m.set("text", "bad");
        assert_eq!(view.el().text_content(), "ok");

        m.set("text", "good");
        let err = view.update(&m).unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
        assert_eq!(view.el().text_content(), "good");

        // Reported once
        assert!(view.update(&m).is_ok());
    }

    #[test]
    fn test_constructor_identity() {
        struct Other;
        impl View for Other {
            fn el(&self) -> DomNode {
                DomNode::element("div")
            }
            fn set_element(&self, _: DomNode) {}
            fn update(&self, _: &Model) -> Result<()> {
                Ok(())
            }
            fn render_tree(&self) -> Option<VTree> {
                None
            }
            fn destroy(&self) {}
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
        impl Construct for Other {
            fn construct(_: ViewArgs) -> Result<Self> {
                Ok(Other)
            }
        }

        assert_eq!(Constructor::of::<TemplateView>(), Constructor::of::<TemplateView>());
        assert_ne!(Constructor::of::<TemplateView>(), Constructor::of::<Other>());

        let built = Constructor::of::<Other>()
            .build(ViewArgs::new(model("x"), label()))
            .unwrap();
        assert!(built.as_any().is::<Other>());
    }
}
