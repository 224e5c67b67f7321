//! Core types of the tidal view layer.
//!
//! This crate holds everything a host or an application needs to talk to the
//! runtime without depending on it:
//!
//! - [`Value`], the builder output applications produce,
//! - [`VNode`], the canonical virtual node,
//! - the tag grammar ([`TagSpec`]) and `className` flattening,
//! - the component capability ([`Component`], [`Render`], [`Updater`]),
//! - the host capability ([`Surface`], [`FrameScheduler`]),
//! - the error taxonomy ([`Error`], [`ErrorKind`]).

extern crate alloc;

#[macro_use]
mod macros;

pub mod class;
pub mod component;
pub mod error;
pub mod surface;
pub mod tag;
pub mod value;
pub mod vnode;

pub use class::flatten_class;
pub use component::{
    Component, ComponentRef, Dispatch, InstanceHandle, InstanceId, Props, Render, Updater,
    component,
};
pub use error::{Error, ErrorKind, Result};
pub use surface::{FrameScheduler, Surface};
pub use tag::TagSpec;
pub use value::{Callback, Map, Value};
pub use vnode::{Element, SlotKey, VNode, VNodeKind};
