//! The view runtime.
//!
//! [`Dom`] owns the virtual tree, the live nodes it mirrors and the component
//! instances bound to it. Every entry point (mount, update, component update)
//! becomes a job. Jobs run one pass at a time: a job submitted while a pass is
//! running waits in a FIFO queue and runs right after, in order.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
};

use tidal_core::{
    Dispatch, Error, FrameScheduler, InstanceHandle, InstanceId, Result, Surface, VNode, Value,
};
use tracing::{debug, trace, warn};

use crate::{
    canonical::Canonicalizer,
    cleanup::CleanupQueue,
    config::Config,
    reconcile::Reconciler,
    registry::Registry,
    render,
    tree::{SlotId, Snapshot, Tree},
};

/// Handle to a view runtime rendering onto a surface of type `S`.
///
/// Clones share the runtime.
pub struct Dom<S: Surface> {
    inner: Rc<Inner<S>>,
}

impl<S: Surface> Clone for Dom<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Surface> Dom<S> {
    /// Creates a runtime with the default [`Config`].
    pub fn new(surface: S, scheduler: impl FrameScheduler) -> Self {
        Self::with_config(surface, scheduler, Config::default())
    }

    /// Creates a runtime with `config`.
    pub fn with_config(surface: S, scheduler: impl FrameScheduler, config: Config) -> Self {
        let inner = Rc::new_cyclic(|this| Inner {
            this: this.clone(),
            config,
            scheduler: Box::new(scheduler),
            engine: RefCell::new(Engine {
                surface,
                tree: Tree::new(),
                cleanup: CleanupQueue::default(),
                target: None,
                attached: false,
                retired: Vec::new(),
                generation: 0,
            }),
            registry: RefCell::default(),
            jobs: RefCell::default(),
            busy: Cell::new(false),
        });
        Self { inner }
    }

    /// Renders `view` from scratch for `target`.
    ///
    /// The tree is rendered right away but stays detached until the next
    /// animation frame, when the target is emptied and receives the rendered
    /// root. Until then the previously attached root stays where it is. A
    /// later mount supersedes an attach that has not happened yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTarget`] if `target` is not an element node,
    /// or the canonicalization error of a malformed `view`.
    pub fn mount(&self, target: S::Node, view: impl Into<Value>) -> Result<()> {
        self.inner.submit(Job::Mount {
            target,
            view: view.into(),
        })
    }

    /// Reconciles the mounted tree against `view`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTarget`] if nothing is mounted, or the
    /// canonicalization error of a malformed `view`.
    pub fn update(&self, view: impl Into<Value>) -> Result<()> {
        self.inner.submit(Job::Update(view.into()))
    }

    /// Live node of the root of the tree.
    #[must_use]
    pub fn root(&self) -> Option<S::Node> {
        let engine = self.inner.engine.borrow();
        let root = engine.tree.root()?;
        engine.tree.live(root).cloned()
    }

    /// The node the tree is mounted on.
    #[must_use]
    pub fn target(&self) -> Option<S::Node> {
        self.inner.engine.borrow().target.clone()
    }

    /// Whether a tree has been mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.inner.engine.borrow().tree.root().is_some()
    }

    /// Whether the rendered root has been attached to the target.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.engine.borrow().attached
    }

    /// Serializable picture of the virtual tree.
    #[must_use]
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.inner.snapshot()
    }

    /// The configuration this runtime was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    #[cfg(test)]
    pub(crate) fn instance_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.inner.engine.borrow().tree.len()
    }
}

impl<S: Surface> fmt::Debug for Dom<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom")
            .field("config", &self.inner.config)
            .field("busy", &self.inner.busy.get())
            .field("queued", &self.inner.jobs.try_borrow().map(|jobs| jobs.len()).ok())
            .finish_non_exhaustive()
    }
}

enum Job<N> {
    Mount { target: N, view: Value },
    Update(Value),
    Component {
        handle: Rc<InstanceHandle>,
        args: Vec<Value>,
    },
}

struct Engine<S: Surface> {
    surface: S,
    tree: Tree<S::Node>,
    cleanup: CleanupQueue,
    target: Option<S::Node>,
    attached: bool,
    /// Roots of earlier mounts still shown on their target, with that target.
    retired: Vec<(S::Node, S::Node)>,
    /// Bumped by every mount; a pending attach only fires for its own mount.
    generation: u64,
}

struct Inner<S: Surface> {
    this: Weak<Self>,
    config: Config,
    scheduler: Box<dyn FrameScheduler>,
    engine: RefCell<Engine<S>>,
    registry: RefCell<Registry>,
    jobs: RefCell<VecDeque<Job<S::Node>>>,
    busy: Cell<bool>,
}

/// Marks a pass as running for as long as it lives.
struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<S: Surface> Dispatch for Inner<S> {
    fn dispatch(&self, handle: &Rc<InstanceHandle>, args: Vec<Value>) -> Result<()> {
        if handle.is_stale() {
            return Err(Error::stale(handle.origin()));
        }
        self.submit(Job::Component {
            handle: handle.clone(),
            args,
        })
    }
}

impl<S: Surface> Inner<S> {
    fn submit(&self, job: Job<S::Node>) -> Result<()> {
        self.jobs.borrow_mut().push_back(job);
        if self.busy.get() {
            trace!("pass in flight, job queued");
            return Ok(());
        }
        self.drain()
    }

    /// Runs queued jobs until the queue is empty.
    ///
    /// A failed job does not stop the jobs queued behind it; the first
    /// failure is returned once the queue is empty.
    fn drain(&self) -> Result<()> {
        let _busy = BusyGuard::enter(&self.busy);
        let mut failure = None;
        loop {
            let next = self.jobs.borrow_mut().pop_front();
            let Some(job) = next else {
                break;
            };
            if let Err(error) = self.run(job) {
                warn!(%error, "pass failed, continuing with queued jobs");
                failure.get_or_insert(error);
            }
        }
        failure.map_or(Ok(()), Err)
    }

    fn run(&self, job: Job<S::Node>) -> Result<()> {
        match job {
            Job::Mount { target, view } => self.run_mount(target, view),
            Job::Update(view) => self.run_update(view),
            Job::Component { handle, args } => match handle.current() {
                Some(instance) => self.run_component(instance, &args),
                None => {
                    warn!(
                        instance = %handle.origin(),
                        "component lost its identity before its update ran, skipping"
                    );
                    Ok(())
                }
            },
        }
    }

    fn run_mount(&self, target: S::Node, view: Value) -> Result<()> {
        if !self.engine.borrow().surface.is_element(&target) {
            return Err(Error::invalid_target("the mount target is not an element node"));
        }
        let (node, created) = self.canonicalize(view)?;

        let generation = {
            let mut engine = self.engine.borrow_mut();
            let Engine {
                surface,
                tree,
                cleanup,
                target: host,
                attached,
                retired,
                generation,
            } = &mut *engine;

            if let Some(root) = tree.root() {
                if *attached {
                    if let (Some(host), Some(live)) = (host.clone(), tree.live(root)) {
                        retired.push((host, live.clone()));
                    }
                }
                let mut registry = self.registry.borrow_mut();
                for id in tree.instances(root) {
                    registry.invalidate(id);
                }
            }
            tree.clear();
            cleanup.clear();

            let root = render::render(&*surface, tree, &self.registry, node, None);
            tree.set_root(root);
            *host = Some(target);
            *attached = false;
            *generation += 1;
            *generation
        };

        debug!(generation, "tree rendered, waiting to attach");
        self.finish(&created, "mount");
        self.schedule_attach(generation);
        Ok(())
    }

    fn run_update(&self, view: Value) -> Result<()> {
        if self.engine.borrow().tree.root().is_none() {
            return Err(Error::invalid_target("nothing has been mounted yet"));
        }
        let (node, created) = self.canonicalize(view)?;
        self.reconcile(None, node, 0);
        self.finish(&created, "update");
        Ok(())
    }

    fn run_component(&self, instance: InstanceId, args: &[Value]) -> Result<()> {
        let (renderer, slot) = {
            let registry = self.registry.borrow();
            (registry.renderer(instance), registry.slot(instance))
        };
        let (Some(renderer), Some(slot)) = (renderer, slot) else {
            warn!(%instance, "component is not mounted, update skipped");
            return Ok(());
        };
        let prefix = {
            let engine = self.engine.borrow();
            engine.tree.get(slot).and_then(|current| {
                let depth = current.components.iter().position(|id| *id == instance)?;
                Some(current.components[..=depth].to_vec())
            })
        };
        let Some(mut components) = prefix else {
            warn!(%instance, "component is no longer on its slot, update skipped");
            return Ok(());
        };
        trace!(
            %instance,
            component = self.registry.borrow().name(instance),
            depth = components.len() - 1,
            "re-rendering component"
        );

        let output = renderer.borrow_mut().render(args);
        let (mut node, created) = self.canonicalize(output)?;
        let keep = components.len();
        components.append(&mut node.components);
        node.components = components;

        self.reconcile(Some(slot), node, keep);
        self.finish(&created, "component");
        Ok(())
    }

    fn canonicalize(&self, view: Value) -> Result<(VNode, Vec<InstanceId>)> {
        let sink: Weak<dyn Dispatch> = self.this.clone();
        let mut canonicalizer = Canonicalizer::new(&self.registry, sink);
        let result = canonicalizer.canonicalize(view);
        let created = canonicalizer.into_created();
        match result {
            Ok(node) => Ok((node, created)),
            Err(error) => {
                let mut registry = self.registry.borrow_mut();
                for id in created {
                    registry.invalidate(id);
                }
                debug!(%error, "canonicalization failed");
                Err(error)
            }
        }
    }

    /// Reconciles `slot` (the root when `None`) and commits the cleanup queue.
    fn reconcile(&self, slot: Option<SlotId>, node: VNode, keep: usize) {
        let mut engine = self.engine.borrow_mut();
        let Engine {
            surface,
            tree,
            cleanup,
            target,
            attached,
            ..
        } = &mut *engine;
        let Some(slot) = slot.or_else(|| tree.root()) else {
            return;
        };
        let host = if *attached { target.as_ref() } else { None };
        Reconciler::new(&*surface, tree, &self.registry, cleanup, host).update(slot, node, keep);
        let committed = cleanup.flush(tree);
        debug!(slot = slot.index(), committed, "reconciled");
    }

    /// End-of-pass bookkeeping.
    fn finish(&self, created: &[InstanceId], pass: &'static str) {
        let swept = self.registry.borrow_mut().sweep(created);
        if swept > 0 {
            debug!(swept, "dropped component instances that were never mounted");
        }
        if !self.config.trace_snapshots {
            return;
        }
        match self.snapshot().map(|snapshot| snapshot.to_json()) {
            Some(Ok(json)) => trace!(pass, %json, "tree snapshot"),
            Some(Err(error)) => warn!(pass, %error, "tree snapshot is not serializable"),
            None => {}
        }
    }

    fn snapshot(&self) -> Option<Snapshot> {
        let engine = self.engine.borrow();
        let root = engine.tree.root()?;
        engine.tree.snapshot(root)
    }

    fn schedule_attach(&self, generation: u64) {
        if !self.config.defer_initial_draw {
            self.attach(generation);
            return;
        }
        self.request_attach(generation);
    }

    fn request_attach(&self, generation: u64) {
        let this = self.this.clone();
        self.scheduler.request_frame(Box::new(move || {
            if let Some(inner) = this.upgrade() {
                inner.attach(generation);
            }
        }));
    }

    fn attach(&self, generation: u64) {
        let Ok(mut engine) = self.engine.try_borrow_mut() else {
            trace!(generation, "frame fired during a pass, attaching on the next one");
            self.request_attach(generation);
            return;
        };
        let Engine {
            surface,
            tree,
            target,
            attached,
            retired,
            generation: current,
            ..
        } = &mut *engine;
        if *current != generation || *attached {
            trace!(generation, "attach superseded");
            return;
        }
        let root = tree.root().and_then(|root| tree.live(root));
        let (Some(target), Some(root)) = (target.as_ref(), root) else {
            return;
        };
        for (host, live) in retired.drain(..) {
            surface.remove_child(&host, &live);
        }
        if self.config.clear_target {
            surface.set_property(target, "innerHTML", &Value::from(""));
        }
        surface.append_child(target, root);
        *attached = true;
        debug!(generation, "tree attached to its target");
    }
}
