//! Canonical virtual nodes.

use core::fmt;

use serde::Serialize;

use crate::{InstanceId, Map};

/// A canonical virtual node produced by the canonicalizer.
#[derive(Debug, Clone)]
pub struct VNode {
    /// Text or element payload.
    pub kind: VNodeKind,
    /// Explicit key used to match this node among its siblings.
    pub key: Option<String>,
    /// Component instances whose output this node is, outermost first.
    pub components: Vec<InstanceId>,
}

/// Payload of a [`VNode`].
#[derive(Debug, Clone)]
pub enum VNodeKind {
    /// A text node.
    Text(String),
    /// An element node.
    Element(Element),
}

/// An element with its attributes and children.
#[derive(Debug, Clone)]
pub struct Element {
    /// Element name.
    pub tag: String,
    /// Attributes, assigned as properties on the live node.
    pub attrs: Map,
    /// Child nodes in order.
    pub children: Vec<VNode>,
}

impl VNode {
    /// Creates a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: VNodeKind::Text(text.into()),
            key: None,
            components: Vec::new(),
        }
    }

    /// Creates an element node.
    pub fn element(tag: impl Into<String>, attrs: Map, children: Vec<Self>) -> Self {
        Self {
            kind: VNodeKind::Element(Element {
                tag: tag.into(),
                attrs,
                children,
            }),
            key: None,
            components: Vec::new(),
        }
    }

    /// Sets the key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Returns the element tag, or `None` for text nodes.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Element(element) => Some(&element.tag),
            VNodeKind::Text(_) => None,
        }
    }

    /// Returns the text payload, or `None` for elements.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Text(text) => Some(text),
            VNodeKind::Element(_) => None,
        }
    }

    /// Returns the element payload, or `None` for text nodes.
    #[must_use]
    pub const fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            VNodeKind::Element(element) => Some(element),
            VNodeKind::Text(_) => None,
        }
    }

    /// Slot key of this node when it sits at `index` among its siblings.
    #[must_use]
    pub fn slot_key(&self, index: usize) -> SlotKey {
        self.key
            .as_ref()
            .map_or(SlotKey::Index(index), |key| SlotKey::Key(key.clone()))
    }
}

/// Position of a child within its parent: an explicit key or an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum SlotKey {
    /// Explicit key.
    Key(String),
    /// Position among the siblings.
    Index(usize),
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key:?}"),
            Self::Index(index) => write!(f, "#{index}"),
        }
    }
}
