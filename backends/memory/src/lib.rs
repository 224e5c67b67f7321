//! In-memory rendering surface for `tidal`.
//!
//! [`MemoryDocument`] implements [`tidal_core::Surface`] over a tree of
//! reference-counted nodes, serializes it to markup and records every call in
//! a mutation log. [`ManualFrames`] is a frame scheduler the host drives by
//! hand. Together they run the view layer headless.

pub use crate::document::{MemoryDocument, Mutation};
pub use crate::frames::ManualFrames;
pub use crate::node::MemoryNode;

mod document;
mod frames;
mod html;
mod node;
