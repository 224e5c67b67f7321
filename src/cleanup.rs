//! Deferred structural edits.
//!
//! The reconciler marks structural changes to the virtual tree while it
//! walks, and the queue commits them one at a time, in order, once the walk
//! is over. The walk therefore never sees a child map change under it.

use std::collections::VecDeque;

use tidal_core::SlotKey;
use tracing::trace;

use crate::tree::{SlotId, Tree};

/// A structural edit waiting for the end of the traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// Drop the child entry `key` of `parent` and free the subtree at `slot`.
    Remove {
        parent: SlotId,
        key: SlotKey,
        slot: SlotId,
    },
    /// Free detached subtrees left behind by a replacement.
    Release(Vec<SlotId>),
    /// Rebuild the child map of `parent` in `order`.
    Reorder { parent: SlotId, order: Vec<SlotKey> },
}

#[derive(Debug, Default)]
pub(crate) struct CleanupQueue {
    steps: VecDeque<Step>,
}

impl CleanupQueue {
    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push_back(step);
    }

    pub(crate) fn len(&self) -> usize {
        self.steps.len()
    }

    pub(crate) fn clear(&mut self) {
        self.steps.clear();
    }

    /// Commits every pending step in FIFO order and returns how many ran.
    pub(crate) fn flush<N>(&mut self, tree: &mut Tree<N>) -> usize {
        let mut committed = 0;
        while let Some(step) = self.steps.pop_front() {
            commit(tree, step);
            committed += 1;
        }
        if committed > 0 {
            trace!(committed, "cleanup queue flushed");
        }
        committed
    }
}

fn commit<N>(tree: &mut Tree<N>, step: Step) {
    match step {
        Step::Remove { parent, key, slot } => {
            if let Some(children) = tree.children_mut(parent) {
                if children.get(&key) == Some(&slot) {
                    children.shift_remove(&key);
                }
            }
            tree.release(slot);
        }
        Step::Release(slots) => {
            for slot in slots {
                tree.release(slot);
            }
        }
        Step::Reorder { parent, order } => {
            if let Some(children) = tree.children_mut(parent) {
                let reordered = order
                    .into_iter()
                    .filter_map(|key| {
                        let slot = children.get(&key).copied()?;
                        Some((key, slot))
                    })
                    .collect();
                *children = reordered;
            }
        }
    }
}
