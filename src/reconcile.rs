//! Keyed reconciliation of the virtual tree against a new canonical tree.
//!
//! One synchronous traversal decides, per slot, between ADD, REMOVE, REPLACE
//! and EDIT, and applies the matching surface mutations right away. Structural
//! changes to the virtual tree are deferred to the [`CleanupQueue`].

use std::cell::RefCell;

use tidal_core::{Element, InstanceId, Map, SlotKey, Surface, VNode, VNodeKind, Value};
use tracing::{trace, warn};

use crate::{
    cleanup::{CleanupQueue, Step},
    registry::Registry,
    render::{fill, keyed, render},
    tree::{SlotId, SlotNode, Tree},
};

pub(crate) struct Reconciler<'a, S: Surface> {
    surface: &'a S,
    tree: &'a mut Tree<S::Node>,
    registry: &'a RefCell<Registry>,
    cleanup: &'a mut CleanupQueue,
    /// Live parent of the root slot, present once the tree is attached.
    host: Option<&'a S::Node>,
}

impl<'a, S: Surface> Reconciler<'a, S> {
    pub(crate) fn new(
        surface: &'a S,
        tree: &'a mut Tree<S::Node>,
        registry: &'a RefCell<Registry>,
        cleanup: &'a mut CleanupQueue,
        host: Option<&'a S::Node>,
    ) -> Self {
        Self {
            surface,
            tree,
            registry,
            cleanup,
            host,
        }
    }

    /// Brings `slot` in line with `next`.
    ///
    /// The first `keep` entries of the component stack belong to the
    /// instances driving this pass and are left untouched.
    pub(crate) fn update(&mut self, slot: SlotId, next: VNode, keep: usize) {
        let Some(current) = self.tree.get(slot) else {
            warn!(slot = slot.index(), "reconciling a released slot");
            return;
        };
        let previous = current.components.clone();
        let same_kind = current.node.same_kind(next.tag());

        self.adopt(slot, &previous, &next.components, keep);

        if !same_kind {
            self.replace(slot, next);
            return;
        }

        let VNode {
            kind, components, ..
        } = next;
        if let Some(current) = self.tree.get_mut(slot) {
            current.components = components;
        }
        match kind {
            VNodeKind::Text(text) => self.edit_text(slot, text),
            VNodeKind::Element(Element {
                attrs, children, ..
            }) => {
                self.edit_attrs(slot, attrs);
                self.edit_children(slot, children);
            }
        }
    }

    /// Matches the old component stack of `slot` against the new one.
    fn adopt(&self, slot: SlotId, previous: &[InstanceId], next: &[InstanceId], keep: usize) {
        let mut registry = self.registry.borrow_mut();
        let mut diverged = false;
        for depth in keep..previous.len().max(next.len()) {
            let old = previous.get(depth).copied();
            let new = next.get(depth).copied();
            match (old, new) {
                (Some(old), Some(new)) if old == new => {}
                (Some(old), Some(new)) if !diverged && registry.same_component(old, new) => {
                    trace!(%old, %new, depth, "forwarding component handles");
                    registry.forward(old, new);
                }
                (old, _) => {
                    diverged = true;
                    if let Some(old) = old {
                        trace!(instance = %old, depth, "component lost its slot");
                        registry.invalidate(old);
                    }
                }
            }
        }
        for id in next {
            registry.bind(*id, slot);
        }
    }

    fn replace(&mut self, slot: SlotId, next: VNode) {
        let parent = self.tree.get(slot).and_then(|current| current.parent);
        let Some((old_live, old_node)) = fill(self.surface, self.tree, self.registry, slot, next)
        else {
            return;
        };
        trace!(slot = slot.index(), "replace");

        let parent_live = match parent {
            Some(parent) => self.tree.live(parent),
            None => self.host,
        };
        if let (Some(parent_live), Some(new_live)) = (parent_live, self.tree.live(slot)) {
            self.surface.replace_child(parent_live, new_live, &old_live);
        }

        if let SlotNode::Element { children, .. } = old_node {
            let orphans: Vec<SlotId> = children.into_values().collect();
            self.invalidate_subtrees(&orphans);
            if !orphans.is_empty() {
                self.cleanup.push(Step::Release(orphans));
            }
        }
    }

    fn edit_text(&mut self, slot: SlotId, text: String) {
        let Some(current) = self.tree.get_mut(slot) else {
            return;
        };
        if let SlotNode::Text(existing) = &mut current.node {
            if *existing != text {
                self.surface
                    .set_property(&current.live, "nodeValue", &Value::from(text.as_str()));
                *existing = text;
            }
        }
    }

    fn edit_attrs(&mut self, slot: SlotId, next: Map) {
        let Some(current) = self.tree.get_mut(slot) else {
            return;
        };
        let SlotNode::Element { attrs, .. } = &mut current.node else {
            return;
        };
        let live = &current.live;
        for (name, old) in attrs.iter() {
            match next.get(name) {
                Some(new) if old.strict_eq(new) => {}
                Some(new) => self.surface.set_property(live, name, new),
                None => self.surface.set_property(live, name, &Value::Null),
            }
        }
        for (name, new) in &next {
            if !attrs.contains_key(name) {
                self.surface.set_property(live, name, new);
            }
        }
        *attrs = next;
    }

    fn edit_children(&mut self, slot: SlotId, children: Vec<VNode>) {
        let previous: Vec<(SlotKey, SlotId)> = match self.tree.children(slot) {
            Some(map) => map.iter().map(|(key, id)| (key.clone(), *id)).collect(),
            None => return,
        };
        let mut desired = keyed(children);
        let order: Vec<SlotKey> = desired.keys().cloned().collect();

        let mut removed = Vec::new();
        for (key, child) in &previous {
            match desired.swap_remove(key) {
                Some(next) => self.update(*child, next, 0),
                None => {
                    self.remove(slot, key.clone(), *child);
                    removed.push(key.clone());
                }
            }
        }
        for key in &order {
            if let Some(next) = desired.swap_remove(key) {
                self.add(slot, key.clone(), next);
            }
        }

        self.restore_order(slot, &order, &removed);
    }

    fn add(&mut self, parent: SlotId, key: SlotKey, next: VNode) {
        trace!(parent = parent.index(), %key, "add");
        let child = render(self.surface, self.tree, self.registry, next, Some(parent));
        if let (Some(parent_live), Some(child_live)) = (self.tree.live(parent), self.tree.live(child)) {
            self.surface.append_child(parent_live, child_live);
        }
        if let Some(children) = self.tree.children_mut(parent) {
            children.insert(key, child);
        }
    }

    fn remove(&mut self, parent: SlotId, key: SlotKey, child: SlotId) {
        trace!(parent = parent.index(), %key, "remove");
        if let (Some(parent_live), Some(child_live)) = (self.tree.live(parent), self.tree.live(child)) {
            self.surface.remove_child(parent_live, child_live);
        }
        self.invalidate_subtrees(&[child]);
        self.cleanup.push(Step::Remove {
            parent,
            key,
            slot: child,
        });
    }

    /// Moves live children of `parent` so they follow `order`.
    ///
    /// The live order is the child map order minus the removed keys, since
    /// additions are appended to both. Nodes from the first mismatch onward
    /// are re-appended.
    fn restore_order(&mut self, parent: SlotId, order: &[SlotKey], removed: &[SlotKey]) {
        let Some(children) = self.tree.children(parent) else {
            return;
        };
        let live_order: Vec<&SlotKey> = children.keys().filter(|key| !removed.contains(key)).collect();
        let Some(first) = order
            .iter()
            .zip(&live_order)
            .position(|(want, have)| want != *have)
        else {
            return;
        };
        let Some(parent_live) = self.tree.live(parent) else {
            return;
        };
        for key in &order[first..] {
            let Some(live) = children.get(key).and_then(|child| self.tree.live(*child)) else {
                continue;
            };
            trace!(parent = parent.index(), %key, "move");
            self.surface.append_child(parent_live, live);
        }
        self.cleanup.push(Step::Reorder {
            parent,
            order: order.to_vec(),
        });
    }

    fn invalidate_subtrees(&self, roots: &[SlotId]) {
        let mut registry = self.registry.borrow_mut();
        for root in roots {
            for id in self.tree.instances(*root) {
                registry.invalidate(id);
            }
        }
    }
}
