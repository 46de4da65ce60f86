//! Delay handles - deferred and looping timed callbacks
//!
//! A delay handle fires its callback once its cycle elapses, optionally
//! looping, optionally following wall-clock time instead of scaled time,
//! and optionally bound to an owner whose disappearance cancels it.
//! Handles are advanced by the registry once per update tick.
//!
//! # Example
//!
//! ```ignore
//! use tickloop_core::{DelayFlags, DelayRegistry};
//!
//! let delays = DelayRegistry::new();
//!
//! // One-shot
//! let handle = delays.schedule(5.0, DelayFlags::empty(), || {
//!     tracing::info!("5 seconds passed");
//! });
//!
//! // Repeating, on wall-clock time
//! let ticker = delays.schedule(0.1, DelayFlags::LOOPED | DelayFlags::REAL_TIME, || {
//!     tracing::info!("tick");
//! });
//!
//! handle.cancel();
//! ```

mod handle;

use parking_lot::Mutex;

pub use handle::{DelayFlags, DelayHandle, DelayState};

use crate::lifetime::Lifetime;
use crate::time::TickDeltas;

/// Owns the live set of delay handles and advances it once per update tick.
///
/// Newly scheduled handles sit in a side buffer until the next sweep so that
/// scheduling from inside a callback never mutates the set being iterated.
pub struct DelayRegistry {
    live: Mutex<Vec<DelayHandle>>,
    to_add: Mutex<Vec<DelayHandle>>,
}

impl Default for DelayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayRegistry {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            live: Mutex::new(Vec::with_capacity(capacity)),
            to_add: Mutex::new(Vec::new()),
        }
    }

    /// Schedule a callback to run after `duration` seconds of scaled or real
    /// time, per `flags`. The returned handle is immediately usable - cancel,
    /// pause, and resume all work before the handle is promoted into the
    /// live set.
    ///
    /// A zero or negative duration is not rejected: the handle fires on the
    /// first sweep after promotion (once per sweep if looped).
    pub fn schedule<F>(&self, duration: f32, flags: DelayFlags, on_complete: F) -> DelayHandle
    where
        F: FnMut() + Send + 'static,
    {
        let handle = DelayHandle::new(duration, flags, on_complete, None);
        self.to_add.lock().push(handle.clone());
        handle
    }

    /// Like [`schedule`](Self::schedule), but bound to an owner: once
    /// `owner.is_alive()` turns false the handle is cancelled by the next
    /// sweep with no further callbacks.
    pub fn schedule_bound<F>(
        &self,
        owner: impl Lifetime + 'static,
        duration: f32,
        flags: DelayFlags,
        on_complete: F,
    ) -> DelayHandle
    where
        F: FnMut() + Send + 'static,
    {
        let handle = DelayHandle::new(duration, flags, on_complete, Some(Box::new(owner)));
        self.to_add.lock().push(handle.clone());
        handle
    }

    /// Advance all live handles by one tick. Main thread, once per update.
    ///
    /// Promotes the side buffer, advances a snapshot of the live set (so
    /// callbacks may schedule or cancel freely, including `cancel_all`),
    /// then prunes every handle that reached a terminal state.
    pub fn sweep(&self, deltas: TickDeltas) {
        {
            let mut to_add = self.to_add.lock();
            if !to_add.is_empty() {
                self.live.lock().append(&mut to_add);
            }
        }

        let snapshot: Vec<DelayHandle> = self.live.lock().clone();
        for handle in &snapshot {
            handle.advance(deltas);
        }

        self.live.lock().retain(|handle| !handle.is_done());
    }

    /// Cancel every live handle and discard the side buffer.
    ///
    /// Buffered handles are cancelled as well, so a caller still holding one
    /// observes `Cancelled` rather than a handle that never runs.
    pub fn cancel_all(&self) {
        {
            let mut to_add = self.to_add.lock();
            for handle in to_add.iter() {
                handle.cancel();
            }
            to_add.clear();
        }

        let live = self.live.lock();
        for handle in live.iter() {
            handle.cancel();
        }
        tracing::debug!("Cancelled {} live delay handles", live.len());
    }

    /// Pause every live handle
    pub fn pause_all(&self) {
        for handle in self.live.lock().iter() {
            handle.pause();
        }
    }

    /// Resume every live handle
    pub fn resume_all(&self) {
        for handle in self.live.lock().iter() {
            handle.resume();
        }
    }

    /// Number of handles currently in the live set
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    /// Number of handles waiting for promotion on the next sweep
    pub fn pending_count(&self) -> usize {
        self.to_add.lock().len()
    }
}
