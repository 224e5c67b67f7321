//! Target, builder and state wired to a [`Dom`].

use core::fmt;

use tidal_core::{Result, Surface, Value};
use tracing::trace;

use crate::Dom;

type Builder<T> = Box<dyn Fn(&T) -> Value>;

/// Redraws a view whenever its target, builder or state changes.
///
/// The first complete set of target, builder and state triggers a mount;
/// later builder and state changes reconcile the mounted tree. Setting a new
/// target always mounts again.
pub struct App<S: Surface, T> {
    dom: Dom<S>,
    target: Option<S::Node>,
    builder: Option<Builder<T>>,
    state: Option<T>,
    drawn: bool,
}

impl<S: Surface, T> App<S, T> {
    /// Creates an app drawing through `dom`.
    #[must_use]
    pub const fn new(dom: Dom<S>) -> Self {
        Self {
            dom,
            target: None,
            builder: None,
            state: None,
            drawn: false,
        }
    }

    /// Sets the node to draw into and draws from scratch.
    ///
    /// # Errors
    ///
    /// Returns the error of the resulting mount.
    pub fn set_target(&mut self, target: S::Node) -> Result<()> {
        self.target = Some(target);
        self.drawn = false;
        self.refresh()
    }

    /// Sets the function turning state into builder output.
    ///
    /// # Errors
    ///
    /// Returns the error of the resulting mount or update.
    pub fn set_builder(&mut self, builder: impl Fn(&T) -> Value + 'static) -> Result<()> {
        self.builder = Some(Box::new(builder));
        self.refresh()
    }

    /// Replaces the state.
    ///
    /// # Errors
    ///
    /// Returns the error of the resulting mount or update.
    pub fn set_state(&mut self, state: T) -> Result<()> {
        self.state = Some(state);
        self.refresh()
    }

    /// Runs the builder against the current state.
    ///
    /// Does nothing until target, builder and state are all present.
    ///
    /// # Errors
    ///
    /// Returns the error of the resulting mount or update.
    pub fn refresh(&mut self) -> Result<()> {
        let (Some(target), Some(builder), Some(state)) =
            (self.target.as_ref(), self.builder.as_ref(), self.state.as_ref())
        else {
            trace!("app is incomplete, nothing to draw");
            return Ok(());
        };
        let view = builder(state);
        if self.drawn {
            return self.dom.update(view);
        }
        self.dom.mount(target.clone(), view)?;
        self.drawn = true;
        Ok(())
    }

    /// The runtime this app draws through.
    #[must_use]
    pub const fn dom(&self) -> &Dom<S> {
        &self.dom
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> Option<&T> {
        self.state.as_ref()
    }
}

impl<S: Surface, T: fmt::Debug> fmt::Debug for App<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("dom", &self.dom)
            .field("target", &self.target)
            .field("state", &self.state)
            .field("drawn", &self.drawn)
            .finish_non_exhaustive()
    }
}
