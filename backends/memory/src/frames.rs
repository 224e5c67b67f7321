use std::{cell::RefCell, collections::VecDeque, fmt, rc::Rc};

use tidal_core::FrameScheduler;

type FrameCallback = Box<dyn FnOnce()>;

/// Frame scheduler driven by hand.
///
/// Callbacks wait until [`run`](Self::run) is called. Clones share the queue,
/// so a host can keep one while the runtime owns another.
#[derive(Clone, Default)]
pub struct ManualFrames {
    pending: Rc<RefCell<VecDeque<FrameCallback>>>,
}

impl ManualFrames {
    /// Creates a scheduler with no pending frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Runs the callbacks requested so far and returns how many ran.
    ///
    /// Callbacks requested while running wait for the next call.
    pub fn run(&self) -> usize {
        let batch: Vec<_> = self.pending.borrow_mut().drain(..).collect();
        let count = batch.len();
        for callback in batch {
            callback();
        }
        count
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) {
        self.pending.borrow_mut().push_back(callback);
    }
}

impl fmt::Debug for ManualFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualFrames")
            .field("pending", &self.pending())
            .finish()
    }
}
