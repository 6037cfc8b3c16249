//! Virtual trees.
//!
//! A `VTree` is the immutable output of a template. It is materialized into
//! a `DomNode` on first render and patched into that same node afterwards.

use crate::dom::DomNode;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use trellis_core::{Error, Result};

/// A virtual node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VTree {
    /// An element with sorted attributes and ordered children
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<VTree>,
    },
    /// A text node
    Text(String),
}

impl VTree {
    /// Creates an element with no attributes or children.
    pub fn element(tag: impl Into<String>) -> Self {
        VTree::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Creates a text node.
    pub fn text(content: impl Into<String>) -> Self {
        VTree::Text(content.into())
    }

    /// Adds an attribute. No-op on text nodes.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let VTree::Element { attributes, .. } = &mut self {
            attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Appends a child. No-op on text nodes.
    pub fn child(mut self, node: VTree) -> Self {
        if let VTree::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    /// Returns the tag name, or None for text nodes.
    pub fn tag(&self) -> Option<&str> {
        match self {
            VTree::Element { tag, .. } => Some(tag.as_str()),
            VTree::Text(_) => None,
        }
    }

    /// Builds a fresh node tree.
    pub fn materialize(&self) -> DomNode {
        match self {
            VTree::Text(text) => DomNode::text(text.clone()),
            VTree::Element {
                tag,
                attributes,
                children,
            } => {
                let node = DomNode::element(tag.clone());
                node.set_attributes(attributes.clone());
                node.set_children(children.iter().map(VTree::materialize).collect());
                node
            }
        }
    }

    /// Writes this tree into `node`, keeping the root node's identity.
    ///
    /// Attributes are replaced and children rebuilt. Fails if the root kind
    /// or tag does not match, since the root cannot be swapped in place.
    pub fn patch_into(&self, node: &DomNode) -> Result<()> {
        match self {
            VTree::Text(text) if node.is_text() => {
                node.set_text(text.clone());
                Ok(())
            }
            VTree::Element {
                tag,
                attributes,
                children,
            } if node.tag().as_deref() == Some(tag.as_str()) => {
                node.set_attributes(attributes.clone());
                node.set_children(children.iter().map(VTree::materialize).collect());
                Ok(())
            }
            _ => Err(Error::render(alloc::format!(
                "cannot patch <{}> into {:?}",
                self.tag().unwrap_or("#text"),
                node.tag().unwrap_or_else(|| String::from("#text"))
            ))),
        }
    }

    /// Patches `node` when the roots match, otherwise builds a new root.
    ///
    /// Returns the node now showing this tree: `node` itself, or its
    /// replacement, which the caller swaps in.
    pub fn patch_or_replace(&self, node: &DomNode) -> DomNode {
        match self.patch_into(node) {
            Ok(()) => node.clone(),
            Err(_) => self.materialize(),
        }
    }
}
