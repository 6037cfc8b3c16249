//! Attribute values.
//!
//! Every slot of a model's attribute map holds an `Attr`: either plain data
//! or a shared entity (child model, collection, embedded component widget).
//! Entity variants compare by identity, plain data by value.

use crate::collection::Collection;
use crate::model::Model;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use trellis_core::Value;

/// Type tag carried by embeddable component widgets.
pub const WIDGET_TYPE_TAG: &str = "Widget";

/// An embeddable, model-backed component stored as an attribute.
///
/// Implemented by the virtual-DOM component widget; the model layer only
/// needs its type tag and the model it carries.
pub trait Embed {
    /// Node type tag. Component widgets report `WIDGET_TYPE_TAG`.
    fn type_tag(&self) -> &str;

    /// The model backing the component, if any.
    fn model(&self) -> Option<Model>;
}

/// A value stored in a model's attribute map.
#[derive(Clone)]
pub enum Attr {
    /// Plain data
    Value(Value),
    /// A child model (shared)
    Model(Model),
    /// A nested collection (shared)
    Collection(Collection),
    /// An embedded component widget (shared)
    Widget(Rc<dyn Embed>),
}

impl Attr {
    /// Returns the plain value if this is a Value, None otherwise.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Attr::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the model if this is a Model, None otherwise.
    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Attr::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the collection if this is a Collection, None otherwise.
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Attr::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the widget if this is a Widget, None otherwise.
    pub fn as_widget(&self) -> Option<&Rc<dyn Embed>> {
        match self {
            Attr::Widget(w) => Some(w),
            _ => None,
        }
    }

    /// Returns true for child models and collections.
    #[inline]
    pub fn is_entity(&self) -> bool {
        matches!(self, Attr::Model(_) | Attr::Collection(_))
    }
}

impl Default for Attr {
    fn default() -> Self {
        Attr::Value(Value::Null)
    }
}

impl PartialEq for Attr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Attr::Value(a), Attr::Value(b)) => a == b,
            (Attr::Model(a), Attr::Model(b)) => a.ptr_eq(b),
            (Attr::Collection(a), Attr::Collection(b)) => a.ptr_eq(b),
            (Attr::Widget(a), Attr::Widget(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Attr::Model(m) => f.debug_tuple("Model").field(&m.cid()).finish(),
            Attr::Collection(c) => f.debug_tuple("Collection").field(&c.len()).finish(),
            Attr::Widget(w) => f.debug_tuple("Widget").field(&w.type_tag()).finish(),
        }
    }
}

impl From<Value> for Attr {
    fn from(v: Value) -> Self {
        Attr::Value(v)
    }
}

impl From<bool> for Attr {
    fn from(v: bool) -> Self {
        Attr::Value(v.into())
    }
}

impl From<i32> for Attr {
    fn from(v: i32) -> Self {
        Attr::Value(v.into())
    }
}

impl From<i64> for Attr {
    fn from(v: i64) -> Self {
        Attr::Value(v.into())
    }
}

impl From<f64> for Attr {
    fn from(v: f64) -> Self {
        Attr::Value(v.into())
    }
}

impl From<&str> for Attr {
    fn from(v: &str) -> Self {
        Attr::Value(v.into())
    }
}

impl From<String> for Attr {
    fn from(v: String) -> Self {
        Attr::Value(v.into())
    }
}

impl From<Vec<Value>> for Attr {
    fn from(v: Vec<Value>) -> Self {
        Attr::Value(Value::List(v))
    }
}

impl From<Model> for Attr {
    fn from(m: Model) -> Self {
        Attr::Model(m)
    }
}

impl From<Collection> for Attr {
    fn from(c: Collection) -> Self {
        Attr::Collection(c)
    }
}

impl From<Rc<dyn Embed>> for Attr {
    fn from(w: Rc<dyn Embed>) -> Self {
        Attr::Widget(w)
    }
}
