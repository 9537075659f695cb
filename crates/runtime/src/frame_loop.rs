use std::cell::Cell;
use std::rc::Rc;

use crate::cancel::CancelToken;

/// What a single tick of a [`FrameLoop`] did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame ran and the next one was requested.
    Rescheduled,
    /// The loop was cancelled before drawing.
    Skipped,
    /// The frame ran but the loop was cancelled during it; nothing was requested.
    Stopped,
}

/// Bookkeeping for a self-rescheduling frame callback.
///
/// `H` is the host's request handle (a `requestAnimationFrame` id in the
/// browser). The host supplies the actual request/revoke calls as closures,
/// so the ordering rules live here and run the same everywhere:
///
/// * a tick clears the pending handle, checks the token, draws, checks the
///   token again, and only then requests the next frame;
/// * cancel flips the token and revokes whatever request is still pending.
///
/// Clones share state, so the callback can hold one and the owner another.
#[derive(Debug)]
pub struct FrameLoop<H: Copy> {
    token: CancelToken,
    pending: Rc<Cell<Option<H>>>,
}

impl<H: Copy> Clone for FrameLoop<H> {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<H: Copy> Default for FrameLoop<H> {
    fn default() -> Self {
        Self {
            token: CancelToken::new(),
            pending: Rc::new(Cell::new(None)),
        }
    }
}

impl<H: Copy> FrameLoop<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the first request.
    pub fn start<E>(&self, request: impl FnOnce() -> Result<H, E>) -> Result<(), E> {
        if self.token.is_cancelled() {
            return Ok(());
        }
        let handle = request()?;
        self.pending.set(Some(handle));
        Ok(())
    }

    /// Runs one host callback.
    pub fn tick<E>(
        &self,
        on_frame: impl FnOnce(),
        request: impl FnOnce() -> Result<H, E>,
    ) -> Result<TickOutcome, E> {
        self.pending.set(None);
        if self.token.is_cancelled() {
            return Ok(TickOutcome::Skipped);
        }
        on_frame();
        if self.token.is_cancelled() {
            return Ok(TickOutcome::Stopped);
        }
        let handle = request()?;
        self.pending.set(Some(handle));
        Ok(TickOutcome::Rescheduled)
    }

    /// Stops the loop and revokes the pending request, if any.
    ///
    /// Returns `false` when the loop was already cancelled; `revoke` is not
    /// called in that case.
    pub fn cancel(&self, revoke: impl FnOnce(H)) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.token.cancel();
        if let Some(handle) = self.pending.take() {
            revoke(handle);
        }
        true
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn pending(&self) -> Option<H> {
        self.pending.get()
    }
}
