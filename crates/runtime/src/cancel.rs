use std::cell::Cell;
use std::rc::Rc;

/// Shared flag checked by a self-rescheduling task before each reschedule.
///
/// Clones observe the same flag. Single-threaded by construction (`Rc`), like
/// the UI thread that owns the animation loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}
