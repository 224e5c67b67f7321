//! Function components and their update handles.
//!
//! A component is a two-stage capability:
//!
//! - [`Component::initialize`] runs once per instance with the props and an
//!   [`Updater`], and returns the render stage.
//! - [`Render::render`] runs on first render (with no arguments) and again for
//!   every update, producing builder output.
//!
//! Closures are turned into components with [`component`].

use alloc::rc::{Rc, Weak};
use core::{
    any::{TypeId, type_name},
    cell::Cell,
    fmt::{self, Debug, Display},
};

use crate::{Error, Map, Result, Value};

/// Identifier of a component instance, unique within a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared record behind an [`Updater`].
///
/// The handle points at the instance that currently owns the component's
/// slot. It is retargeted when the instance is succeeded by a fresh instance
/// of the same component, and cleared when the instance is invalidated.
#[derive(Debug)]
pub struct InstanceHandle {
    origin: InstanceId,
    target: Cell<Option<InstanceId>>,
}

impl InstanceHandle {
    /// Creates a handle pointing at `instance`.
    #[must_use]
    pub const fn new(instance: InstanceId) -> Self {
        Self {
            origin: instance,
            target: Cell::new(Some(instance)),
        }
    }

    /// The instance this handle was created for.
    #[must_use]
    pub const fn origin(&self) -> InstanceId {
        self.origin
    }

    /// The instance updates are routed to, or `None` once stale.
    #[must_use]
    pub fn current(&self) -> Option<InstanceId> {
        self.target.get()
    }

    /// Returns `true` if updates through this handle are rejected.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.target.get().is_none()
    }

    /// Points the handle at another instance, or makes it stale with `None`.
    pub fn retarget(&self, instance: Option<InstanceId>) {
        self.target.set(instance);
    }
}

/// Receiver of component update requests.
pub trait Dispatch {
    /// Schedules a re-render of the instance behind `handle` with `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale or the resulting pass fails.
    fn dispatch(&self, handle: &Rc<InstanceHandle>, args: Vec<Value>) -> Result<()>;
}

/// Update handle given to a component factory.
#[derive(Clone)]
pub struct Updater {
    handle: Rc<InstanceHandle>,
    sink: Weak<dyn Dispatch>,
}

impl Updater {
    /// Creates an updater routing through `sink`.
    #[must_use]
    pub fn new(handle: Rc<InstanceHandle>, sink: Weak<dyn Dispatch>) -> Self {
        Self { handle, sink }
    }

    /// Re-renders the component with `args`.
    ///
    /// Updates requested while another pass is running are queued and applied
    /// in order once it completes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleComponentUpdate`] if the component no longer owns
    /// a slot or its runtime is gone.
    pub fn update(&self, args: Vec<Value>) -> Result<()> {
        if self.handle.is_stale() {
            return Err(Error::stale(self.handle.origin()));
        }
        let Some(sink) = self.sink.upgrade() else {
            return Err(Error::stale(self.handle.origin()));
        };
        sink.dispatch(&self.handle, args)
    }

    /// Returns `true` if updates through this handle are rejected.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.handle.is_stale() || self.sink.strong_count() == 0
    }

    /// The underlying handle.
    #[must_use]
    pub const fn handle(&self) -> &Rc<InstanceHandle> {
        &self.handle
    }
}

impl Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("origin", &self.handle.origin())
            .field("current", &self.handle.current())
            .finish_non_exhaustive()
    }
}

/// Props passed to a component factory: its attributes plus `children`.
#[derive(Debug, Clone, Default)]
pub struct Props(Map);

impl Props {
    /// Wraps an attribute mapping.
    #[must_use]
    pub const fn new(map: Map) -> Self {
        Self(map)
    }

    /// Returns the prop called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Canonical children handed to the component.
    #[must_use]
    pub fn children(&self) -> &[Value] {
        match self.0.get("children") {
            Some(Value::List(children)) => children,
            _ => &[],
        }
    }

    /// Returns the underlying mapping.
    #[must_use]
    pub fn into_map(self) -> Map {
        self.0
    }
}

impl From<Map> for Props {
    fn from(map: Map) -> Self {
        Self(map)
    }
}

/// Render stage of a component.
pub trait Render {
    /// Produces builder output; `args` are the update arguments, empty on
    /// the first render.
    fn render(&mut self, args: &[Value]) -> Value;
}

impl<F> Render for F
where
    F: FnMut(&[Value]) -> Value,
{
    fn render(&mut self, args: &[Value]) -> Value {
        self(args)
    }
}

impl Debug for dyn Render {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(type_name::<Self>())
    }
}

/// Factory stage of a component.
pub trait Component: 'static {
    /// Creates the render stage of a new instance.
    fn initialize(&self, props: Props, updater: Updater) -> Box<dyn Render>;
}

struct FnComponent<F>(F);

impl<F, R> Component for FnComponent<F>
where
    F: Fn(Props, Updater) -> R + 'static,
    R: Render + 'static,
{
    fn initialize(&self, props: Props, updater: Updater) -> Box<dyn Render> {
        Box::new((self.0)(props, updater))
    }
}

/// Shareable reference to a component definition.
///
/// Two references denote the same component when they were built from the
/// same definition type.
#[derive(Clone)]
pub struct ComponentRef {
    identity: TypeId,
    name: &'static str,
    component: Rc<dyn Component>,
}

impl ComponentRef {
    /// Wraps a component definition.
    pub fn new<C: Component>(component: C) -> Self {
        Self {
            identity: TypeId::of::<C>(),
            name: type_name::<C>(),
            component: Rc::new(component),
        }
    }

    /// Replaces the display name used in logs.
    #[must_use]
    pub const fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Identity of the component definition.
    #[must_use]
    pub const fn identity(&self) -> TypeId {
        self.identity
    }

    /// Display name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the factory stage.
    #[must_use]
    pub fn initialize(&self, props: Props, updater: Updater) -> Box<dyn Render> {
        self.component.initialize(props, updater)
    }
}

impl Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentRef").field(&self.name).finish()
    }
}

/// Turns a closure factory into a component.
///
/// ```ignore
/// let counter = component(|props, updater| {
///     let mut count = 0;
///     move |args: &[Value]| {
///         count += 1;
///         list!["span", attrs! {}, list![count]]
///     }
/// });
/// ```
pub fn component<F, R>(factory: F) -> ComponentRef
where
    F: Fn(Props, Updater) -> R + 'static,
    R: FnMut(&[Value]) -> Value + 'static,
{
    ComponentRef::new(FnComponent(factory))
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use super::*;
    use crate::ErrorKind;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(InstanceId, Vec<Value>)>>,
    }

    impl Dispatch for Recorder {
        fn dispatch(&self, handle: &Rc<InstanceHandle>, args: Vec<Value>) -> Result<()> {
            let current = handle.current().ok_or_else(|| Error::stale(handle.origin()))?;
            self.calls.borrow_mut().push((current, args));
            Ok(())
        }
    }

    #[test]
    fn updater_routes_to_current_instance() {
        let recorder: Rc<Recorder> = Rc::default();
        let sink: Rc<dyn Dispatch> = recorder.clone();
        let handle = Rc::new(InstanceHandle::new(InstanceId::new(1)));
        let updater = Updater::new(handle.clone(), Rc::downgrade(&sink));

        updater.update(vec![Value::from(1)]).unwrap();
        handle.retarget(Some(InstanceId::new(2)));
        updater.update(vec![]).unwrap();

        let calls = recorder.calls.borrow();
        assert_eq!(calls[0].0, InstanceId::new(1));
        assert_eq!(calls[1].0, InstanceId::new(2));
    }

    #[test]
    fn stale_handle_is_rejected() {
        let sink: Rc<dyn Dispatch> = Rc::new(Recorder::default());
        let handle = Rc::new(InstanceHandle::new(InstanceId::new(4)));
        let updater = Updater::new(handle.clone(), Rc::downgrade(&sink));

        handle.retarget(None);
        let error = updater.update(vec![]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StaleComponentUpdate);
        assert!(updater.is_stale());
    }

    #[test]
    fn dropped_runtime_makes_handle_stale() {
        let sink: Rc<dyn Dispatch> = Rc::new(Recorder::default());
        let updater = Updater::new(
            Rc::new(InstanceHandle::new(InstanceId::new(5))),
            Rc::downgrade(&sink),
        );
        drop(sink);
        assert!(updater.update(vec![]).is_err());
    }

    #[test]
    fn closures_keep_distinct_identities() {
        let first = component(|_, _| |_: &[Value]| Value::Null);
        let second = component(|_, _| |_: &[Value]| Value::Null);
        assert_ne!(first.identity(), second.identity());
        assert_eq!(first.identity(), first.clone().identity());
    }

    #[test]
    fn props_expose_children() {
        let props = Props::new(attrs! { "children" => list!["a", "b"], "x" => 1 });
        assert_eq!(props.children().len(), 2);
        assert_eq!(props.get("x").and_then(Value::as_number), Some(1.0));
        assert!(Props::default().children().is_empty());
    }
}
