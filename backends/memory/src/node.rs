use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use tidal_core::{Map, Value};

use crate::html;

#[derive(Debug)]
pub(crate) enum Content {
    Element { tag: String },
    Text { text: String },
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) content: Content,
    pub(crate) properties: Map,
    pub(crate) children: Vec<MemoryNode>,
    pub(crate) parent: Weak<RefCell<NodeData>>,
}

/// A node of a [`MemoryDocument`](crate::MemoryDocument).
///
/// Clones share the node; equality is identity.
#[derive(Clone)]
pub struct MemoryNode(pub(crate) Rc<RefCell<NodeData>>);

impl MemoryNode {
    pub(crate) fn new(content: Content) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            content,
            properties: Map::new(),
            children: Vec::new(),
            parent: Weak::new(),
        })))
    }

    /// Element name, or `None` for text nodes.
    #[must_use]
    pub fn tag(&self) -> Option<String> {
        match &self.0.borrow().content {
            Content::Element { tag } => Some(tag.clone()),
            Content::Text { .. } => None,
        }
    }

    /// Text content of a text node, or `None` for elements.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match &self.0.borrow().content {
            Content::Text { text } => Some(text.clone()),
            Content::Element { .. } => None,
        }
    }

    /// Returns `true` for text nodes.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.0.borrow().content, Content::Text { .. })
    }

    /// Property previously assigned on this node.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.0.borrow().properties.get(name).cloned()
    }

    /// Direct children, in order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.0.borrow().children.clone()
    }

    /// Parent node, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.borrow().parent.upgrade().map(Self)
    }

    /// First descendant element named `tag`, in document order.
    #[must_use]
    pub fn query(&self, tag: &str) -> Option<Self> {
        self.find(&|node| node.tag().as_deref() == Some(tag))
    }

    /// First descendant element whose `className` contains `class`.
    #[must_use]
    pub fn query_class(&self, class: &str) -> Option<Self> {
        self.find(&|node| {
            node.attribute("className")
                .and_then(|value| value.to_text())
                .is_some_and(|classes| classes.split_whitespace().any(|name| name == class))
        })
    }

    fn find(&self, accept: &dyn Fn(&Self) -> bool) -> Option<Self> {
        for child in self.children() {
            if accept(&child) {
                return Some(child);
            }
            if let Some(found) = child.find(accept) {
                return Some(found);
            }
        }
        None
    }

    /// Serialized markup of this node.
    #[must_use]
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        html::write_node(&mut out, self);
        out
    }

    /// Serialized markup of the children of this node.
    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            html::write_node(&mut out, &child);
        }
        out
    }

    /// Short description used in the mutation log.
    pub(crate) fn label(&self) -> String {
        self.tag().unwrap_or_else(|| "#text".to_owned())
    }

    pub(crate) fn detach(&self) {
        let parent = self.0.borrow().parent.upgrade();
        if let Some(parent) = parent {
            parent
                .borrow_mut()
                .children
                .retain(|child| !Rc::ptr_eq(&child.0, &self.0));
        }
        self.0.borrow_mut().parent = Weak::new();
    }
}

impl PartialEq for MemoryNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MemoryNode").field(&self.outer_html()).finish()
    }
}
