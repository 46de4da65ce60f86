//! Pull-based countdown and stopwatch
//!
//! Unlike delay handles, these are never registered with the scheduler.
//! Whatever component owns one drives it by calling [`Countdown::tick`] /
//! [`Stopwatch::tick`] from its own update callback with whichever delta it
//! cares about.

type EdgeCallback = Box<dyn FnMut() + Send>;

/// Counts down from an initial value to zero, then stops itself.
pub struct Countdown {
    initial: f32,
    current: f32,
    running: bool,
    on_start: Option<EdgeCallback>,
    on_stop: Option<EdgeCallback>,
}

impl Countdown {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            current: initial,
            running: false,
            on_start: None,
            on_stop: None,
        }
    }

    /// Invoked on every Stopped -> Running transition
    pub fn set_on_start<F: FnMut() + Send + 'static>(&mut self, callback: F) {
        self.on_start = Some(Box::new(callback));
    }

    /// Invoked on every Running -> Stopped transition, including the
    /// automatic stop when the countdown reaches zero.
    pub fn set_on_stop<F: FnMut() + Send + 'static>(&mut self, callback: F) {
        self.on_stop = Some(Box::new(callback));
    }

    /// Rewind to the initial value and run. `on_start` fires only if the
    /// countdown was not already running; the rewind happens either way.
    pub fn start(&mut self) {
        self.current = self.initial;
        if !self.running {
            self.running = true;
            if let Some(callback) = self.on_start.as_mut() {
                callback();
            }
        }
    }

    /// Stop counting. Fires `on_stop` on an actual transition; stopping an
    /// already-stopped countdown is a no-op.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            if let Some(callback) = self.on_stop.as_mut() {
                callback();
            }
        }
    }

    /// Suspend without resetting and without firing callbacks
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Continue from the current value without firing callbacks
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Advance by `delta` seconds. Auto-stops (firing `on_stop`) the first
    /// tick the value reaches zero.
    pub fn tick(&mut self, delta: f32) {
        if !self.running {
            return;
        }
        self.current -= delta;
        if self.current <= 0.0 {
            self.current = 0.0;
            self.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self) -> f32 {
        self.current
    }

    /// Fraction of the countdown still remaining; only meaningful while the
    /// initial value is nonzero.
    pub fn progress(&self) -> f32 {
        if self.initial == 0.0 {
            0.0
        } else {
            self.current / self.initial
        }
    }
}

/// Counts up from zero until stopped.
pub struct Stopwatch {
    current: f32,
    running: bool,
    on_start: Option<EdgeCallback>,
    on_stop: Option<EdgeCallback>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            current: 0.0,
            running: false,
            on_start: None,
            on_stop: None,
        }
    }

    pub fn set_on_start<F: FnMut() + Send + 'static>(&mut self, callback: F) {
        self.on_start = Some(Box::new(callback));
    }

    pub fn set_on_stop<F: FnMut() + Send + 'static>(&mut self, callback: F) {
        self.on_stop = Some(Box::new(callback));
    }

    /// Reset to zero and run; `on_start` fires only on an actual transition.
    pub fn start(&mut self) {
        self.current = 0.0;
        if !self.running {
            self.running = true;
            if let Some(callback) = self.on_start.as_mut() {
                callback();
            }
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            if let Some(callback) = self.on_stop.as_mut() {
                callback();
            }
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn tick(&mut self, delta: f32) {
        if self.running {
            self.current += delta;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> f32 {
        self.current
    }
}
