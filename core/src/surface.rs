//! Host capabilities: the rendering surface and the frame scheduler.
//!
//! The surface follows DOM conventions. Properties are assigned with property
//! semantics (`className`, not `class`), the `nodeType` property reports `1`
//! for elements and `3` for text nodes, text content is updated through
//! `nodeValue`, and assigning `""` to `innerHTML` removes every child.

use core::fmt::Debug;

use crate::Value;

/// `nodeType` of element nodes.
pub const ELEMENT_NODE: f64 = 1.0;
/// `nodeType` of text nodes.
pub const TEXT_NODE: f64 = 3.0;

/// A live rendering surface.
pub trait Surface: 'static {
    /// Handle to a live node. Clones refer to the same node.
    type Node: Clone + PartialEq + Debug + 'static;

    /// Creates a detached element.
    fn create_element(&self, tag: &str) -> Self::Node;

    /// Creates a detached text node.
    fn create_text(&self, text: &str) -> Self::Node;

    /// Reads a property.
    fn property(&self, node: &Self::Node, name: &str) -> Option<Value>;

    /// Assigns a property.
    fn set_property(&self, node: &Self::Node, name: &str, value: &Value);

    /// Appends `child` as the last child of `parent`, moving it if it is
    /// already attached somewhere.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);

    /// Detaches `child` from `parent`.
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node);

    /// Puts `new` where `old` is among the children of `parent`.
    fn replace_child(&self, parent: &Self::Node, new: &Self::Node, old: &Self::Node);

    /// Returns `true` if `node` is an element, judged by its `nodeType`.
    fn is_element(&self, node: &Self::Node) -> bool {
        self.property(node, "nodeType")
            .and_then(|kind| kind.as_number())
            .is_some_and(|kind| (kind - ELEMENT_NODE).abs() < f64::EPSILON)
    }
}

/// Host hook that runs a callback on the next animation frame.
pub trait FrameScheduler: 'static {
    /// Schedules `callback` for the next frame.
    fn request_frame(&self, callback: Box<dyn FnOnce()>);
}
