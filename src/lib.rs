#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

mod app;
mod canonical;
mod cleanup;
mod config;
mod dom;
pub mod logging;
mod reconcile;
mod registry;
mod render;
mod scheduler;
mod tree;


pub use app::App;
pub use canonical::canonicalize;
pub use config::{Config, ConfigError};
pub use dom::Dom;
pub use logging::install_tracing;
pub use scheduler::Immediate;
pub use tree::{SlotId, Snapshot};

#[doc(inline)]
pub use tidal_core::{
    Callback, Component, ComponentRef, Element, Error, ErrorKind, FrameScheduler, Map, Props,
    Render, Result, SlotKey, Surface, TagSpec, Updater, VNode, VNodeKind, Value, attrs, component,
    flatten_class, list,
};
pub use tidal_core;
