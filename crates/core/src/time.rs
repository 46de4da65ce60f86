//! Time modes and per-tick delta bookkeeping
//!
//! The host loop reports one wall-clock delta per update tick. The scheduler
//! derives the simulation-time delta from it by applying the current time
//! scale, and hands both to consumers that care about the difference
//! (delay handles pick one via `DelayFlags::REAL_TIME`).

/// Which clock a time query or delay handle follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeMode {
    /// Simulation time - affected by the time scale (slow motion, pausing)
    #[default]
    Scaled,
    /// Wall-clock time - unaffected by the time scale
    Unscaled,
}

/// The pair of deltas computed once per update tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickDeltas {
    /// Delta with the time scale applied
    pub scaled: f32,
    /// Raw wall-clock delta as reported by the host
    pub real: f32,
}

impl TickDeltas {
    pub fn new(real: f32, time_scale: f32) -> Self {
        Self { scaled: real * time_scale, real }
    }

    /// Select the delta for the given mode
    pub fn for_mode(&self, mode: TimeMode) -> f32 {
        match mode {
            TimeMode::Scaled => self.scaled,
            TimeMode::Unscaled => self.real,
        }
    }
}
