//! Delay handle struct, state machine, and flags

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;

use crate::lifetime::Lifetime;
use crate::time::TickDeltas;
use crate::util::run_isolated;

bitflags! {
    /// Flags that control delay handle behavior
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DelayFlags: u32 {
        /// Restart the cycle after firing instead of completing
        const LOOPED = 0x01;
        /// Advance by the wall-clock delta, ignoring the time scale
        const REAL_TIME = 0x02;
    }
}

/// Lifecycle state of a delay handle
///
/// `Active ⇄ Paused` via pause/resume; `Active → Completed` on non-looped
/// expiry; `{Active, Paused} → Cancelled` on explicit cancel or owner death.
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DelayState {
    Active = 0,
    Paused = 1,
    Cancelled = 2,
    Completed = 3,
}

impl DelayState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Active,
            1 => Self::Paused,
            2 => Self::Cancelled,
            _ => Self::Completed,
        }
    }

    /// Terminal states never fire again and are pruned by the next sweep
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

struct Timing {
    /// Seconds a cycle lasts; mutable so a handle can be retargeted
    duration: f32,
    /// Seconds elapsed in the current cycle
    elapsed: f32,
}

struct Shared {
    flags: DelayFlags,
    state: AtomicU8,
    timing: Mutex<Timing>,
    on_complete: Mutex<Box<dyn FnMut() + Send>>,
    on_update: Mutex<Option<Box<dyn FnMut(f32) + Send>>>,
    owner: Option<Box<dyn Lifetime>>,
}

/// One schedulable unit of deferred or looping work.
///
/// Handles are shared: the registry keeps one clone in its live set and the
/// scheduling caller holds another. State mutation (`cancel`, `pause`,
/// `resume`) goes through an atomic, so unlike the advancement itself - which
/// only ever happens on the main thread - the three mutators are safe to call
/// from any thread.
#[derive(Clone)]
pub struct DelayHandle {
    shared: Arc<Shared>,
}

impl DelayHandle {
    pub(crate) fn new<F>(
        duration: f32,
        flags: DelayFlags,
        on_complete: F,
        owner: Option<Box<dyn Lifetime>>,
    ) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                flags,
                state: AtomicU8::new(DelayState::Active as u8),
                timing: Mutex::new(Timing { duration, elapsed: 0.0 }),
                on_complete: Mutex::new(Box::new(on_complete)),
                on_update: Mutex::new(None),
                owner,
            }),
        }
    }

    pub fn state(&self) -> DelayState {
        DelayState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Whether the handle has reached a terminal state
    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn is_looped(&self) -> bool {
        self.shared.flags.contains(DelayFlags::LOOPED)
    }

    pub fn uses_real_time(&self) -> bool {
        self.shared.flags.contains(DelayFlags::REAL_TIME)
    }

    /// Seconds elapsed in the current cycle
    pub fn elapsed(&self) -> f32 {
        self.shared.timing.lock().elapsed
    }

    pub fn duration(&self) -> f32 {
        self.shared.timing.lock().duration
    }

    /// Retarget the handle's cycle length. Takes effect on the next sweep;
    /// the current cycle's `elapsed` is kept.
    pub fn set_duration(&self, duration: f32) {
        self.shared.timing.lock().duration = duration;
    }

    /// Attach (or replace) the per-tick progress callback, invoked with the
    /// seconds elapsed in the current cycle.
    pub fn set_on_update<F>(&self, on_update: F)
    where
        F: FnMut(f32) + Send + 'static,
    {
        *self.shared.on_update.lock() = Some(Box::new(on_update));
    }

    /// Stop the handle permanently. Idempotent; cancelling a completed or
    /// already-cancelled handle is a no-op.
    pub fn cancel(&self) {
        self.transition(&[DelayState::Active, DelayState::Paused], DelayState::Cancelled);
    }

    /// Freeze the handle; `elapsed` stops advancing and nothing fires until
    /// [`resume`](Self::resume). No-op unless the handle is active.
    pub fn pause(&self) {
        self.transition(&[DelayState::Active], DelayState::Paused);
    }

    /// Undo a [`pause`](Self::pause). No-op unless the handle is paused.
    pub fn resume(&self) {
        self.transition(&[DelayState::Paused], DelayState::Active);
    }

    fn transition(&self, from: &[DelayState], to: DelayState) -> bool {
        let mut current = self.shared.state.load(Ordering::Acquire);
        loop {
            if !from.contains(&DelayState::from_u8(current)) {
                return false;
            }
            match self.shared.state.compare_exchange(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Advance one sweep. Main thread only; called by the registry.
    pub(crate) fn advance(&self, deltas: TickDeltas) {
        // A dead owner cancels the handle before any callback runs,
        // from Active or Paused alike.
        if let Some(owner) = &self.shared.owner {
            if !owner.is_alive() {
                if self.transition(&[DelayState::Active, DelayState::Paused], DelayState::Cancelled)
                {
                    tracing::debug!("delay handle cancelled: owner no longer alive");
                }
                return;
            }
        }

        if self.state() != DelayState::Active {
            return;
        }

        let delta = if self.uses_real_time() { deltas.real } else { deltas.scaled };
        let (elapsed, duration) = {
            let mut timing = self.shared.timing.lock();
            timing.elapsed += delta;
            (timing.elapsed, timing.duration)
        };

        {
            let mut on_update = self.shared.on_update.lock();
            if let Some(callback) = on_update.as_mut() {
                run_isolated("delay on_update", || callback(elapsed));
            }
        }

        if elapsed >= duration {
            {
                let mut on_complete = self.shared.on_complete.lock();
                run_isolated("delay on_complete", || (*on_complete)());
            }

            if self.is_looped() {
                // A new cycle starts from zero; overshoot is not carried over.
                self.shared.timing.lock().elapsed = 0.0;
            } else {
                // on_complete may have cancelled the handle; keep that.
                self.transition(&[DelayState::Active], DelayState::Completed);
            }
        }
    }
}
