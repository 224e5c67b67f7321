use tidal_core::FrameScheduler;

/// Frame scheduler that runs callbacks right away.
///
/// Suits hosts without an animation frame loop, and makes the first draw
/// attach synchronously.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl FrameScheduler for Immediate {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) {
        callback();
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[test]
    fn runs_synchronously() {
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        Immediate.request_frame(Box::new(move || flag.set(true)));
        assert!(ran.get());
    }
}
