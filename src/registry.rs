//! Component instance registry.
//!
//! Every component instance the canonicalizer creates gets a record here. The
//! record ties the instance to its render stage, to the slot it is bound to
//! and to the update handles that route to it.

use std::{
    any::TypeId,
    cell::RefCell,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;
use tidal_core::{ComponentRef, InstanceHandle, InstanceId, Render};

use crate::tree::SlotId;

pub(crate) type SharedRender = Rc<RefCell<Box<dyn Render>>>;

struct Record {
    component: TypeId,
    name: &'static str,
    renderer: Option<SharedRender>,
    slot: Option<SlotId>,
    handles: Vec<Weak<InstanceHandle>>,
}

#[derive(Default)]
pub(crate) struct Registry {
    next: u64,
    records: IndexMap<InstanceId, Record>,
}

impl Registry {
    /// Creates a record for a new instance of `component`.
    pub(crate) fn allocate(&mut self, component: &ComponentRef) -> (InstanceId, Rc<InstanceHandle>) {
        self.next += 1;
        let id = InstanceId::new(self.next);
        let handle = Rc::new(InstanceHandle::new(id));
        self.records.insert(
            id,
            Record {
                component: component.identity(),
                name: component.name(),
                renderer: None,
                slot: None,
                handles: vec![Rc::downgrade(&handle)],
            },
        );
        (id, handle)
    }

    pub(crate) fn install(&mut self, id: InstanceId, renderer: SharedRender) {
        if let Some(record) = self.records.get_mut(&id) {
            record.renderer = Some(renderer);
        }
    }

    /// Binds `id` to `slot`. Unknown ids are ignored.
    pub(crate) fn bind(&mut self, id: InstanceId, slot: SlotId) {
        if let Some(record) = self.records.get_mut(&id) {
            record.slot = Some(slot);
        }
    }

    pub(crate) fn slot(&self, id: InstanceId) -> Option<SlotId> {
        self.records.get(&id)?.slot
    }

    pub(crate) fn renderer(&self, id: InstanceId) -> Option<SharedRender> {
        self.records.get(&id)?.renderer.clone()
    }

    pub(crate) fn name(&self, id: InstanceId) -> &'static str {
        self.records.get(&id).map_or("<gone>", |record| record.name)
    }

    pub(crate) fn contains(&self, id: InstanceId) -> bool {
        self.records.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether both instances were created from the same component definition.
    pub(crate) fn same_component(&self, a: InstanceId, b: InstanceId) -> bool {
        match (self.records.get(&a), self.records.get(&b)) {
            (Some(a), Some(b)) => a.component == b.component,
            _ => false,
        }
    }

    /// Hands the handles of `old` over to `new` and drops `old`.
    pub(crate) fn forward(&mut self, old: InstanceId, new: InstanceId) {
        let Some(previous) = self.records.shift_remove(&old) else {
            return;
        };
        let Some(record) = self.records.get_mut(&new) else {
            Self::retire(&previous.handles);
            return;
        };
        for handle in previous.handles {
            if let Some(live) = handle.upgrade() {
                live.retarget(Some(new));
                record.handles.push(handle);
            }
        }
    }

    /// Drops `id` and makes every handle routing to it stale.
    pub(crate) fn invalidate(&mut self, id: InstanceId) {
        if let Some(record) = self.records.shift_remove(&id) {
            Self::retire(&record.handles);
        }
    }

    /// Invalidates the instances in `created` that never got a slot.
    pub(crate) fn sweep(&mut self, created: &[InstanceId]) -> usize {
        let unbound: Vec<_> = created
            .iter()
            .copied()
            .filter(|id| self.records.get(id).is_some_and(|record| record.slot.is_none()))
            .collect();
        for id in &unbound {
            self.invalidate(*id);
        }
        unbound.len()
    }

    fn retire(handles: &[Weak<InstanceHandle>]) {
        for handle in handles.iter().filter_map(Weak::upgrade) {
            handle.retarget(None);
        }
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(
                self.records
                    .iter()
                    .map(|(id, record)| (id, (record.name, record.slot))),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tidal_core::{Value, component};

    use super::*;

    fn counter() -> ComponentRef {
        component(|_, _| |_: &[Value]| Value::Null)
    }

    #[test]
    fn forward_retargets_handles() {
        let counter = counter();
        let mut registry = Registry::default();
        let (old, old_handle) = registry.allocate(&counter);
        let (new, new_handle) = registry.allocate(&counter);

        assert!(registry.same_component(old, new));
        registry.forward(old, new);

        assert!(!registry.contains(old));
        assert_eq!(old_handle.current(), Some(new));
        assert_eq!(new_handle.current(), Some(new));

        registry.invalidate(new);
        assert!(old_handle.is_stale());
        assert!(new_handle.is_stale());
    }

    #[test]
    fn different_components_do_not_match() {
        let mut registry = Registry::default();
        let (a, _) = registry.allocate(&counter());
        let (b, _) = registry.allocate(&component(|_, _| |_: &[Value]| Value::from(1)));
        assert!(!registry.same_component(a, b));
    }

    #[test]
    fn sweep_invalidates_unbound_instances() {
        let counter = counter();
        let mut registry = Registry::default();
        let (bound, bound_handle) = registry.allocate(&counter);
        let (loose, loose_handle) = registry.allocate(&counter);
        let mut tree = crate::tree::Tree::<()>::new();
        registry.bind(bound, tree.reserve());

        assert_eq!(registry.sweep(&[bound, loose]), 1);
        assert!(!bound_handle.is_stale());
        assert!(loose_handle.is_stale());
        assert_eq!(registry.len(), 1);
    }
}
