// Single-slot coalescing redraw notification
//
// A `RedrawSignal` is owned by exactly one generation. Widgets hold cheap
// `RedrawRequester` clones and the display coordinator holds the one
// `RedrawDrain`. Only the owner can close the slot and closing consumes it.
// Requests after closure are ignored.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct SlotState {
    pending: bool,
    closed: bool,
}

#[derive(Debug, Default)]
struct Slot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // A poisoned slot only means a producer panicked mid-request; the two
        // flags are still meaningful.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn request(&self) {
        let mut state = self.lock();
        if state.closed || state.pending {
            return;
        }
        state.pending = true;
        self.ready.notify_one();
    }
}

/// Result of waiting on a [`RedrawDrain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drained {
    /// At least one redraw was requested since the last drain.
    Repaint,
    /// The owning generation closed the signal; no further repaints.
    Closed,
}

/// Owner half of the redraw signal. Not `Clone`.
#[derive(Debug)]
pub struct RedrawSignal {
    slot: Arc<Slot>,
}

/// Producer half, handed to widgets and input handling.
#[derive(Debug, Clone)]
pub struct RedrawRequester {
    slot: Arc<Slot>,
}

/// Consumer half, handed to the single display coordinator loop.
#[derive(Debug)]
pub struct RedrawDrain {
    slot: Arc<Slot>,
}

impl RedrawSignal {
    pub fn new() -> (Self, RedrawDrain) {
        let slot = Arc::new(Slot::default());
        (
            Self {
                slot: Arc::clone(&slot),
            },
            RedrawDrain { slot },
        )
    }

    pub fn requester(&self) -> RedrawRequester {
        RedrawRequester {
            slot: Arc::clone(&self.slot),
        }
    }

    pub fn request_redraw(&self) {
        self.slot.request();
    }

    /// Close the signal. Any pending request is discarded and the drain
    /// reports `Closed` from now on.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for RedrawSignal {
    fn drop(&mut self) {
        let mut state = self.slot.lock();
        state.closed = true;
        state.pending = false;
        self.slot.ready.notify_all();
    }
}

impl RedrawRequester {
    /// Non-blocking. Coalesces with any request that is already pending.
    pub fn request_redraw(&self) {
        self.slot.request();
    }

    /// A requester wired to nothing, for widgets built outside a generation.
    pub fn detached() -> Self {
        let (signal, _drain) = RedrawSignal::new();
        signal.requester()
    }
}

impl RedrawDrain {
    /// Block until a redraw is pending or the signal is closed.
    pub fn drain(&self) -> Drained {
        let mut state = self.slot.lock();
        loop {
            if state.closed {
                return Drained::Closed;
            }
            if state.pending {
                state.pending = false;
                return Drained::Repaint;
            }
            state = self
                .slot
                .ready
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Non-blocking check, used by tests and shutdown paths.
    pub fn try_drain(&self) -> Option<Drained> {
        let mut state = self.slot.lock();
        if state.closed {
            Some(Drained::Closed)
        } else if state.pending {
            state.pending = false;
            Some(Drained::Repaint)
        } else {
            None
        }
    }
}
