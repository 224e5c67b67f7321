//! Materializes canonical nodes on the surface.
//!
//! Rendering is depth-first pre-order: an element is created and gets its
//! properties before its children are rendered and appended, in order.

use std::cell::RefCell;

use indexmap::IndexMap;
use tidal_core::{Element, InstanceId, SlotKey, Surface, VNode, VNodeKind};
use tracing::warn;

use crate::{
    registry::Registry,
    tree::{Slot, SlotId, SlotNode, Tree},
};

/// Renders `node` into a new slot below `parent` and returns its id.
///
/// The live node is left detached; attaching it is up to the caller.
pub(crate) fn render<S: Surface>(
    surface: &S,
    tree: &mut Tree<S::Node>,
    registry: &RefCell<Registry>,
    node: VNode,
    parent: Option<SlotId>,
) -> SlotId {
    let id = tree.reserve();
    let VNode {
        kind, components, ..
    } = node;
    let (payload, live) = build(surface, tree, registry, id, kind);
    bind(registry, &components, id);
    tree.put(
        id,
        Slot {
            node: payload,
            live,
            parent,
            components,
        },
    );
    id
}

/// Renders `node` fresh into the existing slot `id`, keeping its parent.
///
/// Returns the previous live node and payload, or `None` if the slot is gone.
pub(crate) fn fill<S: Surface>(
    surface: &S,
    tree: &mut Tree<S::Node>,
    registry: &RefCell<Registry>,
    id: SlotId,
    node: VNode,
) -> Option<(S::Node, SlotNode)> {
    tree.get(id)?;
    let VNode {
        kind, components, ..
    } = node;
    let (payload, live) = build(surface, tree, registry, id, kind);
    bind(registry, &components, id);
    let slot = tree.get_mut(id)?;
    slot.components = components;
    let live = std::mem::replace(&mut slot.live, live);
    let payload = std::mem::replace(&mut slot.node, payload);
    Some((live, payload))
}

fn build<S: Surface>(
    surface: &S,
    tree: &mut Tree<S::Node>,
    registry: &RefCell<Registry>,
    owner: SlotId,
    kind: VNodeKind,
) -> (SlotNode, S::Node) {
    match kind {
        VNodeKind::Text(text) => {
            let live = surface.create_text(&text);
            (SlotNode::Text(text), live)
        }
        VNodeKind::Element(Element {
            tag,
            attrs,
            children,
        }) => {
            let live = surface.create_element(&tag);
            for (name, value) in &attrs {
                surface.set_property(&live, name, value);
            }
            let mut slots = IndexMap::with_capacity(children.len());
            for (key, child) in keyed(children) {
                let child = render(surface, tree, registry, child, Some(owner));
                if let Some(child_live) = tree.live(child) {
                    surface.append_child(&live, child_live);
                }
                slots.insert(key, child);
            }
            (
                SlotNode::Element {
                    tag,
                    attrs,
                    children: slots,
                },
                live,
            )
        }
    }
}

fn bind(registry: &RefCell<Registry>, components: &[InstanceId], slot: SlotId) {
    let mut registry = registry.borrow_mut();
    for id in components {
        registry.bind(*id, slot);
    }
}

/// Pairs children with their slot keys, dropping later duplicates of a key.
pub(crate) fn keyed(children: Vec<VNode>) -> IndexMap<SlotKey, VNode> {
    let mut keyed = IndexMap::with_capacity(children.len());
    for (index, child) in children.into_iter().enumerate() {
        let key = child.slot_key(index);
        if keyed.contains_key(&key) {
            warn!(%key, "duplicate child key, keeping the first occurrence");
            continue;
        }
        keyed.insert(key, child);
    }
    keyed
}

#[cfg(test)]
mod tests {
    use tidal_core::{attrs, list};
    use tidal_memory::MemoryDocument;

    use super::*;
    use crate::canonicalize;

    #[test]
    fn renders_pre_order() {
        let document = MemoryDocument::new();
        let mut tree = Tree::new();
        let registry = RefCell::new(Registry::default());
        let node = canonicalize(list![
            "ul#list",
            attrs! {},
            list![list!["li", attrs! { "key" => "a" }, list!["one"]], "two"],
        ])
        .unwrap();

        let root = render(&document, &mut tree, &registry, node, None);
        let live = tree.live(root).unwrap();
        assert_eq!(live.outer_html(), r#"<ul id="list"><li>one</li>two</ul>"#);
        assert_eq!(
            tree.children(root).unwrap().keys().cloned().collect::<Vec<_>>(),
            [SlotKey::Key("a".into()), SlotKey::Index(1)]
        );
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn duplicate_keys_keep_first() {
        let node = canonicalize(list![
            "div",
            attrs! {},
            list![
                list!["a", attrs! { "key" => "x" }],
                list!["b", attrs! { "key" => "x" }],
            ],
        ])
        .unwrap();
        let children = node.as_element().unwrap().children.clone();
        let keyed = keyed(children);
        assert_eq!(keyed.len(), 1);
        assert_eq!(keyed[0].tag(), Some("a"));
    }

    #[test]
    fn fill_overwrites_in_place() {
        let document = MemoryDocument::new();
        let mut tree = Tree::new();
        let registry = RefCell::new(Registry::default());
        let root = render(&document, &mut tree, &registry, VNode::text("old"), None);
        let next = canonicalize(list!["p"]).unwrap();
        let (old_live, old) = fill(&document, &mut tree, &registry, root, next).unwrap();

        assert!(matches!(old, SlotNode::Text(ref text) if text == "old"));

        assert_eq!(old_live.outer_html(), "old");
        assert_eq!(tree.live(root).unwrap().outer_html(), "<p></p>");
    }
}
