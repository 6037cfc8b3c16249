//! In-memory document nodes.
//!
//! `DomNode` is the materialized side of a `VTree`: a shared, mutable node
//! with identity. Views own a root node and patch it in place, so a node
//! handed to a view keeps its identity across renders.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

#[derive(Debug)]
enum NodeData {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<DomNode>,
    },
    Text(String),
}

/// A document node. Cloning creates a new handle to the **same** node.
#[derive(Clone)]
pub struct DomNode {
    inner: Rc<RefCell<NodeData>>,
}

impl DomNode {
    /// Creates an element with no attributes or children.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::from_data(NodeData::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        })
    }

    /// Creates a text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self::from_data(NodeData::Text(content.into()))
    }

    fn from_data(data: NodeData) -> Self {
        Self {
            inner: Rc::new(RefCell::new(data)),
        }
    }

    /// Returns the tag name, or None for text nodes.
    pub fn tag(&self) -> Option<String> {
        match &*self.inner.borrow() {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            NodeData::Text(_) => None,
        }
    }

    /// Returns true for text nodes.
    pub fn is_text(&self) -> bool {
        matches!(&*self.inner.borrow(), NodeData::Text(_))
    }

    /// Returns the concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match &*self.inner.borrow() {
            NodeData::Text(text) => text.clone(),
            NodeData::Element { children, .. } => {
                children.iter().map(DomNode::text_content).collect()
            }
        }
    }

    /// Replaces the content of a text node. Ignored on elements.
    pub fn set_text(&self, content: impl Into<String>) {
        if let NodeData::Text(text) = &mut *self.inner.borrow_mut() {
            *text = content.into();
        }
    }

    /// Returns an attribute value.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match &*self.inner.borrow() {
            NodeData::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeData::Text(_) => None,
        }
    }

    /// Returns all attributes, sorted by name.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        match &*self.inner.borrow() {
            NodeData::Element { attributes, .. } => attributes.clone(),
            NodeData::Text(_) => BTreeMap::new(),
        }
    }

    /// Replaces all attributes. Ignored on text nodes.
    pub fn set_attributes(&self, values: BTreeMap<String, String>) {
        if let NodeData::Element { attributes, .. } = &mut *self.inner.borrow_mut() {
            *attributes = values;
        }
    }

    /// Sets one attribute. Ignored on text nodes.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        if let NodeData::Element { attributes, .. } = &mut *self.inner.borrow_mut() {
            attributes.insert(name.into(), value.into());
        }
    }

    /// Returns handles to the children.
    pub fn children(&self) -> Vec<DomNode> {
        match &*self.inner.borrow() {
            NodeData::Element { children, .. } => children.clone(),
            NodeData::Text(_) => Vec::new(),
        }
    }

    /// Appends a child. Ignored on text nodes.
    pub fn append_child(&self, child: DomNode) {
        if let NodeData::Element { children, .. } = &mut *self.inner.borrow_mut() {
            children.push(child);
        }
    }

    /// Replaces all children. Ignored on text nodes.
    pub fn set_children(&self, nodes: Vec<DomNode>) {
        if let NodeData::Element { children, .. } = &mut *self.inner.borrow_mut() {
            *children = nodes;
        }
    }

    /// Returns true if both handles point at the same node.
    #[inline]
    pub fn ptr_eq(&self, other: &DomNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner.borrow(), f)
    }
}
