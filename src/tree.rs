//! Virtual tree arena.
//!
//! Rendered nodes live in slots addressed by [`SlotId`]. A slot owns its live
//! surface node and records its parent and its component stack. Replacing a
//! node overwrites the slot in place, so ids stay stable for as long as the
//! slot exists. Slots are freed only when the cleanup queue commits.

use indexmap::IndexMap;
use serde::Serialize;
use tidal_core::{InstanceId, Map, SlotKey};

/// Identifier of a slot stored inside the [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

impl SlotId {
    /// Returns the raw index backing this identifier.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Payload of a slot.
#[derive(Debug)]
pub(crate) enum SlotNode {
    Text(String),
    Element {
        tag: String,
        attrs: Map,
        children: IndexMap<SlotKey, SlotId>,
    },
}

impl SlotNode {
    /// Whether `other` can be edited into this payload instead of replacing it.
    pub(crate) fn same_kind(&self, tag: Option<&str>) -> bool {
        match (self, tag) {
            (Self::Text(_), None) => true,
            (Self::Element { tag: current, .. }, Some(tag)) => current == tag,
            _ => false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Slot<N> {
    pub(crate) node: SlotNode,
    pub(crate) live: N,
    pub(crate) parent: Option<SlotId>,
    pub(crate) components: Vec<InstanceId>,
}

/// Arena storing the rendered slots.
#[derive(Debug)]
pub(crate) struct Tree<N> {
    slots: Vec<Option<Slot<N>>>,
    free: Vec<usize>,
    root: Option<SlotId>,
}

impl<N> Default for Tree<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Tree<N> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    pub(crate) const fn root(&self) -> Option<SlotId> {
        self.root
    }

    pub(crate) const fn set_root(&mut self, root: SlotId) {
        self.root = Some(root);
    }

    /// Reserves an id whose slot is stored later with [`Tree::put`].
    pub(crate) fn reserve(&mut self) -> SlotId {
        if let Some(index) = self.free.pop() {
            return SlotId(index);
        }
        self.slots.push(None);
        SlotId(self.slots.len() - 1)
    }

    pub(crate) fn put(&mut self, id: SlotId, slot: Slot<N>) {
        self.slots[id.0] = Some(slot);
    }

    pub(crate) fn get(&self, id: SlotId) -> Option<&Slot<N>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: SlotId) -> Option<&mut Slot<N>> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn live(&self, id: SlotId) -> Option<&N> {
        self.get(id).map(|slot| &slot.live)
    }

    pub(crate) fn children(&self, id: SlotId) -> Option<&IndexMap<SlotKey, SlotId>> {
        match &self.get(id)?.node {
            SlotNode::Element { children, .. } => Some(children),
            SlotNode::Text(_) => None,
        }
    }

    pub(crate) fn children_mut(&mut self, id: SlotId) -> Option<&mut IndexMap<SlotKey, SlotId>> {
        match &mut self.get_mut(id)?.node {
            SlotNode::Element { children, .. } => Some(children),
            SlotNode::Text(_) => None,
        }
    }

    /// Frees `id` and every slot below it.
    pub(crate) fn release(&mut self, id: SlotId) -> usize {
        let Some(slot) = self.slots.get_mut(id.0).and_then(Option::take) else {
            return 0;
        };
        self.free.push(id.0);
        if self.root == Some(id) {
            self.root = None;
        }
        let mut released = 1;
        if let SlotNode::Element { children, .. } = slot.node {
            for child in children.into_values() {
                released += self.release(child);
            }
        }
        released
    }

    /// Component instances bound anywhere in the subtree rooted at `id`.
    pub(crate) fn instances(&self, id: SlotId) -> Vec<InstanceId> {
        let mut found = Vec::new();
        self.collect_instances(id, &mut found);
        found
    }

    fn collect_instances(&self, id: SlotId, found: &mut Vec<InstanceId>) {
        let Some(slot) = self.get(id) else {
            return;
        };
        found.extend_from_slice(&slot.components);
        if let SlotNode::Element { children, .. } = &slot.node {
            for child in children.values() {
                self.collect_instances(*child, found);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.root = None;
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub(crate) fn snapshot(&self, id: SlotId) -> Option<Snapshot> {
        let slot = self.get(id)?;
        let components = slot.components.iter().map(|id| id.raw()).collect();
        Some(match &slot.node {
            SlotNode::Text(text) => Snapshot::Text {
                text: text.clone(),
                components,
            },
            SlotNode::Element {
                tag,
                attrs,
                children,
            } => Snapshot::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: children
                    .iter()
                    .filter_map(|(key, child)| Some((key.clone(), self.snapshot(*child)?)))
                    .collect(),
                components,
            },
        })
    }
}

/// Serializable picture of the virtual tree.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Snapshot {
    /// A text node.
    Text {
        /// Text content.
        text: String,
        /// Raw ids of the component instances rendering this node.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        components: Vec<u64>,
    },
    /// An element node.
    Element {
        /// Element name.
        tag: String,
        /// Current attributes.
        attrs: Map,
        /// Children with their slot keys, in order.
        children: Vec<(SlotKey, Snapshot)>,
        /// Raw ids of the component instances rendering this node.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        components: Vec<u64>,
    },
}

impl Snapshot {
    /// Serializes the snapshot as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute cannot be represented in JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Slot keys of the children, in order. Empty for text nodes.
    #[must_use]
    pub fn child_keys(&self) -> Vec<SlotKey> {
        match self {
            Self::Text { .. } => Vec::new(),
            Self::Element { children, .. } => children.iter().map(|(key, _)| key.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(tree: &mut Tree<u32>, live: u32, parent: Option<SlotId>) -> SlotId {
        let id = tree.reserve();
        tree.put(
            id,
            Slot {
                node: SlotNode::Text(live.to_string()),
                live,
                parent,
                components: vec![InstanceId::new(u64::from(live))],
            },
        );
        id
    }

    fn element(tree: &mut Tree<u32>, live: u32, children: &[(SlotKey, SlotId)]) -> SlotId {
        let id = tree.reserve();
        tree.put(
            id,
            Slot {
                node: SlotNode::Element {
                    tag: "div".into(),
                    attrs: Map::new(),
                    children: children.iter().cloned().collect(),
                },
                live,
                parent: None,
                components: Vec::new(),
            },
        );
        id
    }

    #[test]
    fn release_frees_whole_subtree() {
        let mut tree = Tree::new();
        let a = text(&mut tree, 1, None);
        let b = text(&mut tree, 2, None);
        let root = element(&mut tree, 0, &[(SlotKey::Index(0), a), (SlotKey::Key("b".into()), b)]);
        tree.set_root(root);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.instances(root), [InstanceId::new(1), InstanceId::new(2)]);
        assert_eq!(tree.release(root), 3);
        assert_eq!(tree.len(), 0);
        assert!(tree.root().is_none());
    }

    #[test]
    fn freed_ids_are_reused() {
        let mut tree = Tree::new();
        let a = text(&mut tree, 1, None);
        tree.release(a);
        let b = text(&mut tree, 2, None);
        assert_eq!(a, b);
        assert_eq!(tree.live(b), Some(&2));
    }

    #[test]
    fn snapshot_serializes_keys_in_order() {
        let mut tree = Tree::new();
        let a = text(&mut tree, 1, None);
        let root = element(&mut tree, 0, &[(SlotKey::Key("a".into()), a)]);
        let json = tree.snapshot(root).unwrap().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"type":"element","tag":"div","attrs":{},"children":[["a",{"type":"text","text":"1","components":[1]}]]}"#
        );
    }
}
