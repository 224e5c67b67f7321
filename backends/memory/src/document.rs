use std::{cell::RefCell, rc::Rc};

use tidal_core::{Surface, Value, surface};
use tracing::trace;

use crate::node::{Content, MemoryNode};

/// A surface mutation recorded by [`MemoryDocument`].
///
/// Nodes are described by their tag, or `#text` for text nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// An element was created.
    CreateElement {
        /// Element name.
        tag: String,
    },
    /// A text node was created.
    CreateText {
        /// Initial text.
        text: String,
    },
    /// A property was assigned.
    SetProperty {
        /// Node the property was assigned on.
        node: String,
        /// Property name.
        name: String,
        /// String form of the value; `<object>` for non-primitives.
        value: String,
    },
    /// A node was appended, possibly moving it.
    Append {
        /// New parent.
        parent: String,
        /// Appended node.
        child: String,
    },
    /// A node was detached.
    Remove {
        /// Former parent.
        parent: String,
        /// Detached node.
        child: String,
    },
    /// A node took the place of another.
    Replace {
        /// Common parent.
        parent: String,
        /// Incoming node.
        new: String,
        /// Outgoing node.
        old: String,
    },
}

/// In-memory [`Surface`] with DOM-like semantics and a mutation log.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    log: Rc<RefCell<Vec<Mutation>>>,
}

impl MemoryDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutations recorded since creation or the last [`clear_log`](Self::clear_log).
    #[must_use]
    pub fn mutations(&self) -> Vec<Mutation> {
        self.log.borrow().clone()
    }

    /// Forgets the recorded mutations.
    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    fn record(&self, mutation: Mutation) {
        trace!(?mutation, "surface mutation");
        self.log.borrow_mut().push(mutation);
    }
}

impl Surface for MemoryDocument {
    type Node = MemoryNode;

    fn create_element(&self, tag: &str) -> MemoryNode {
        self.record(Mutation::CreateElement {
            tag: tag.to_owned(),
        });
        MemoryNode::new(Content::Element {
            tag: tag.to_owned(),
        })
    }

    fn create_text(&self, text: &str) -> MemoryNode {
        self.record(Mutation::CreateText {
            text: text.to_owned(),
        });
        MemoryNode::new(Content::Text {
            text: text.to_owned(),
        })
    }

    fn property(&self, node: &MemoryNode, name: &str) -> Option<Value> {
        match name {
            "nodeType" => Some(Value::Number(if node.is_text() {
                surface::TEXT_NODE
            } else {
                surface::ELEMENT_NODE
            })),
            "nodeValue" => node.text().map(Value::String),
            "innerHTML" => Some(Value::String(node.inner_html())),
            _ => node.attribute(name),
        }
    }

    fn set_property(&self, node: &MemoryNode, name: &str, value: &Value) {
        self.record(Mutation::SetProperty {
            node: node.label(),
            name: name.to_owned(),
            value: value.to_text().unwrap_or_else(|| "<object>".to_owned()),
        });
        match name {
            "nodeValue" => {
                let text = value.to_text().unwrap_or_default();
                if let Content::Text { text: current } = &mut node.0.borrow_mut().content {
                    *current = text;
                }
            }
            "innerHTML" => {
                for child in node.children() {
                    child.detach();
                }
                let markup = value.to_text().unwrap_or_default();
                if !markup.is_empty() {
                    let text = MemoryNode::new(Content::Text { text: markup });
                    attach(node, &text);
                }
            }
            _ => {
                node.0
                    .borrow_mut()
                    .properties
                    .insert(name.to_owned(), value.clone());
            }
        }
    }

    fn append_child(&self, parent: &MemoryNode, child: &MemoryNode) {
        self.record(Mutation::Append {
            parent: parent.label(),
            child: child.label(),
        });
        child.detach();
        attach(parent, child);
    }

    fn remove_child(&self, parent: &MemoryNode, child: &MemoryNode) {
        self.record(Mutation::Remove {
            parent: parent.label(),
            child: child.label(),
        });
        if child.parent().as_ref() == Some(parent) {
            child.detach();
        }
    }

    fn replace_child(&self, parent: &MemoryNode, new: &MemoryNode, old: &MemoryNode) {
        self.record(Mutation::Replace {
            parent: parent.label(),
            new: new.label(),
            old: old.label(),
        });
        new.detach();
        let position = parent
            .0
            .borrow()
            .children
            .iter()
            .position(|child| child == old);
        let Some(position) = position else {
            attach(parent, new);
            return;
        };
        parent.0.borrow_mut().children[position] = new.clone();
        new.0.borrow_mut().parent = Rc::downgrade(&parent.0);
        old.0.borrow_mut().parent = std::rc::Weak::new();
    }
}

fn attach(parent: &MemoryNode, child: &MemoryNode) {
    parent.0.borrow_mut().children.push(child.clone());
    child.0.borrow_mut().parent = Rc::downgrade(&parent.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_moves_attached_nodes() {
        let document = MemoryDocument::new();
        let root = document.create_element("div");
        let a = document.create_element("a");
        let b = document.create_element("b");
        document.append_child(&root, &a);
        document.append_child(&root, &b);
        document.append_child(&root, &a);

        assert_eq!(root.inner_html(), "<b></b><a></a>");
        assert_eq!(a.parent(), Some(root));
    }

    #[test]
    fn replace_keeps_position() {
        let document = MemoryDocument::new();
        let root = document.create_element("div");
        let a = document.create_element("a");
        let b = document.create_element("b");
        document.append_child(&root, &a);
        document.append_child(&root, &b);

        let text = document.create_text("x");
        document.replace_child(&root, &text, &a);

        assert_eq!(root.inner_html(), "x<b></b>");
        assert!(a.parent().is_none());
    }

    #[test]
    fn inner_html_clears_children() {
        let document = MemoryDocument::new();
        let root = document.create_element("div");
        document.append_child(&root, &document.create_element("p"));
        document.set_property(&root, "innerHTML", &Value::from(""));
        assert!(root.children().is_empty());
    }

    #[test]
    fn node_type_and_value() {
        let document = MemoryDocument::new();
        let text = document.create_text("a");
        assert!(!document.is_element(&text));
        assert!(document.is_element(&document.create_element("p")));

        document.set_property(&text, "nodeValue", &Value::from("b"));
        assert_eq!(text.text().as_deref(), Some("b"));
    }

    #[test]
    fn log_records_every_call() {
        let document = MemoryDocument::new();
        let root = document.create_element("div");
        document.set_property(&root, "id", &Value::from("x"));
        assert_eq!(
            document.mutations(),
            [
                Mutation::CreateElement { tag: "div".into() },
                Mutation::SetProperty {
                    node: "div".into(),
                    name: "id".into(),
                    value: "x".into(),
                },
            ]
        );
        document.clear_log();
        assert!(document.mutations().is_empty());
    }
}
