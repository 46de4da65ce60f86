//! The scheduler instance composing the listener hub, the main-thread task
//! queue, and the delay handle registry
//!
//! The host loop owns the thread designated as main and calls the tick and
//! lifecycle entry points from it; everything else may be called from
//! anywhere. One update tick runs, in order: the update-phase listeners,
//! the delay sweep, the queued-task drain.
//!
//! A `Scheduler` is an explicit instance so tests and embedders can run
//! several side by side; the [`app`](crate::app) module keeps one
//! process-wide default for code that wants a static entry point.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use crate::config::RuntimeConfig;
use crate::delay::{DelayFlags, DelayHandle, DelayRegistry};
use crate::lifetime::Lifetime;
use crate::listeners::{EventHub, ListenerKey, Phase};
use crate::tasks::MainThreadQueue;
use crate::time::{TickDeltas, TimeMode};

pub struct Scheduler {
    hub: EventHub,
    queue: MainThreadQueue,
    delays: DelayRegistry,
    config: RuntimeConfig,

    /// f32 bits; applied to the host delta to produce the scaled delta
    time_scale: AtomicU32,
    /// Deltas of the most recent update tick
    last_deltas: Mutex<TickDeltas>,
    /// Delta of the most recent fixed-update tick (f32 bits)
    last_fixed_delta: AtomicU32,

    frame_count: AtomicU64,
    fixed_frame_count: AtomicU64,
    /// Duration of the last update tick in nanoseconds, for monitoring
    last_tick_ns: AtomicU64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            hub: EventHub::new(),
            queue: MainThreadQueue::with_capacity(config.queue_capacity),
            delays: DelayRegistry::with_capacity(config.delay_capacity),
            config,
            time_scale: AtomicU32::new(1.0_f32.to_bits()),
            last_deltas: Mutex::new(TickDeltas::default()),
            last_fixed_delta: AtomicU32::new(0.0_f32.to_bits()),
            frame_count: AtomicU64::new(0),
            fixed_frame_count: AtomicU64::new(0),
            last_tick_ns: AtomicU64::new(0),
        }
    }

    // === Tick entry points (main thread) ===

    /// One update tick. `delta` is the wall-clock seconds since the previous
    /// update tick, as measured by the host loop.
    pub fn update(&self, delta: f32) {
        let start = Instant::now();
        self.frame_count.fetch_add(1, Ordering::Relaxed);

        let deltas = TickDeltas::new(delta, self.time_scale());
        *self.last_deltas.lock() = deltas;

        self.hub.fire_phase(Phase::Update);
        self.delays.sweep(deltas);

        let drained = self.queue.drain();
        if drained > 0 {
            tracing::trace!("Processed {} queued tasks", drained);
        }

        let elapsed = start.elapsed().as_nanos() as u64;
        self.last_tick_ns.store(elapsed, Ordering::Relaxed);
        if elapsed > self.config.slow_tick_warn_ms * 1_000_000 {
            tracing::warn!(
                "Update tick took {}ms (frame {})",
                elapsed / 1_000_000,
                self.frame_count.load(Ordering::Relaxed)
            );
        }
    }

    /// One fixed-rate tick. Fires only the fixed-update listeners.
    pub fn fixed_update(&self, delta: f32) {
        self.fixed_frame_count.fetch_add(1, Ordering::Relaxed);
        self.last_fixed_delta.store(delta.to_bits(), Ordering::Relaxed);
        self.hub.fire_phase(Phase::FixedUpdate);
    }

    /// One post-update tick. Shares the update tick's deltas; the parameter
    /// exists for interface symmetry with the other phases.
    pub fn late_update(&self, _delta: f32) {
        self.hub.fire_phase(Phase::LateUpdate);
    }

    // === Lifecycle entry points (main thread) ===

    pub fn focus_changed(&self, has_focus: bool) {
        self.hub.fire_focus(has_focus);
    }

    pub fn pause_changed(&self, is_paused: bool) {
        self.hub.fire_pause(is_paused);
    }

    pub fn quit(&self) {
        self.hub.fire_quit();
    }

    pub fn low_memory(&self) {
        self.hub.fire_low_memory();
    }

    // === Listeners ===

    /// Subscribe to a tick phase; fired every tick of that phase in
    /// subscription order.
    pub fn add_listener<F>(&self, phase: Phase, callback: F) -> ListenerKey
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hub.subscribe(phase, callback)
    }

    /// Remove any listener by its key; unknown or stale keys are a no-op.
    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        self.hub.unsubscribe(key)
    }

    /// Run a callback once on the next tick of the phase.
    pub fn once<F>(&self, phase: Phase, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.hub.once(phase, callback);
    }

    pub fn add_pause_callback<F>(&self, callback: F) -> ListenerKey
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.hub.add_pause_callback(callback)
    }

    pub fn add_focus_callback<F>(&self, callback: F) -> ListenerKey
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.hub.add_focus_callback(callback)
    }

    pub fn add_quit_callback<F>(&self, callback: F) -> ListenerKey
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hub.add_quit_callback(callback)
    }

    pub fn add_low_memory_callback<F>(&self, callback: F) -> ListenerKey
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hub.add_low_memory_callback(callback)
    }

    // === Cross-thread dispatch ===

    /// Queue an action to run on the main thread during the next update tick.
    /// Safe from any thread.
    pub fn run_on_main_thread<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(action);
    }

    /// Convert a callback into one that marshals onto the main thread
    /// instead of running where it is invoked.
    pub fn to_main_thread<F>(&self, action: F) -> impl Fn() + Send + Sync + 'static
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.queue.wrap(action)
    }

    /// One-argument variant of [`to_main_thread`](Self::to_main_thread).
    pub fn to_main_thread_with<T, F>(&self, action: F) -> impl Fn(T) + Send + Sync + 'static
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.queue.wrap_with(action)
    }

    // === Delay handles ===

    /// Schedule a one-shot callback after `duration` seconds of scaled time.
    pub fn schedule<F>(&self, duration: f32, on_complete: F) -> DelayHandle
    where
        F: FnMut() + Send + 'static,
    {
        self.delays.schedule(duration, DelayFlags::empty(), on_complete)
    }

    /// Schedule a callback fired every `duration` seconds until cancelled.
    pub fn schedule_repeating<F>(&self, duration: f32, on_complete: F) -> DelayHandle
    where
        F: FnMut() + Send + 'static,
    {
        self.delays.schedule(duration, DelayFlags::LOOPED, on_complete)
    }

    /// Schedule with explicit behavior flags.
    pub fn schedule_with<F>(&self, duration: f32, flags: DelayFlags, on_complete: F) -> DelayHandle
    where
        F: FnMut() + Send + 'static,
    {
        self.delays.schedule(duration, flags, on_complete)
    }

    /// Schedule bound to an owner; the owner's disappearance cancels the
    /// handle without firing anything further.
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
        self.delays.schedule_bound(owner, duration, flags, on_complete)
    }

    pub fn cancel(&self, handle: &DelayHandle) {
        handle.cancel();
    }

    pub fn pause(&self, handle: &DelayHandle) {
        handle.pause();
    }

    pub fn resume(&self, handle: &DelayHandle) {
        handle.resume();
    }

    pub fn cancel_all(&self) {
        self.delays.cancel_all();
    }

    pub fn pause_all(&self) {
        self.delays.pause_all();
    }

    pub fn resume_all(&self) {
        self.delays.resume_all();
    }

    // === Time ===

    /// Scale applied to the host delta for everything on simulation time.
    /// `0.0` freezes simulation time while wall-clock consumers keep moving.
    pub fn set_time_scale(&self, scale: f32) {
        if scale < 0.0 {
            tracing::warn!("Ignoring negative time scale {}", scale);
            return;
        }
        self.time_scale.store(scale.to_bits(), Ordering::Relaxed);
    }

    pub fn time_scale(&self) -> f32 {
        f32::from_bits(self.time_scale.load(Ordering::Relaxed))
    }

    /// Delta of the most recent update tick, in the given time mode
    pub fn delta_time(&self, mode: TimeMode) -> f32 {
        self.last_deltas.lock().for_mode(mode)
    }

    /// Delta of the most recent fixed-update tick
    pub fn fixed_delta_time(&self) -> f32 {
        f32::from_bits(self.last_fixed_delta.load(Ordering::Relaxed))
    }

    /// Get the current update frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Get the current fixed-update frame count
    pub fn fixed_frame_count(&self) -> u64 {
        self.fixed_frame_count.load(Ordering::Relaxed)
    }

    /// Duration of the last update tick in nanoseconds
    pub fn last_tick_nanos(&self) -> u64 {
        self.last_tick_ns.load(Ordering::Relaxed)
    }

    /// Cancel every delay handle, drop every pending task, and clear every
    /// listener registry. The scheduler remains usable afterwards.
    pub fn teardown(&self) {
        tracing::info!("Scheduler tearing down");
        self.delays.cancel_all();
        self.queue.clear();
        self.hub.clear();
    }

    /// Number of live delay handles, for diagnostics
    pub fn live_delay_count(&self) -> usize {
        self.delays.live_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_update_runs_listeners_then_delays_then_tasks() {
        let scheduler = Scheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        {
            let order = Arc::clone(&order);
            scheduler.add_listener(Phase::Update, move || order.lock().push("listener"));
        }
        {
            let order = Arc::clone(&order);
            scheduler.schedule(0.0, move || order.lock().push("delay"));
        }
        {
            let order = Arc::clone(&order);
            scheduler.run_on_main_thread(move || order.lock().push("task"));
        }

        scheduler.update(0.016);
        assert_eq!(*order.lock(), vec!["listener", "delay", "task"]);
    }

    #[test]
    fn test_phases_fire_their_own_listeners() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for (phase, weight) in [(Phase::Update, 1), (Phase::FixedUpdate, 10), (Phase::LateUpdate, 100)] {
            let hits = Arc::clone(&hits);
            scheduler.add_listener(phase, move || {
                hits.fetch_add(weight, Ordering::SeqCst);
            });
        }

        scheduler.update(0.016);
        scheduler.fixed_update(0.02);
        scheduler.fixed_update(0.02);
        scheduler.late_update(0.016);

        assert_eq!(hits.load(Ordering::SeqCst), 121);
        assert_eq!(scheduler.frame_count(), 1);
        assert_eq!(scheduler.fixed_frame_count(), 2);
    }

    #[test]
    fn test_time_scale_shapes_the_scaled_delta() {
        let scheduler = Scheduler::new();
        scheduler.set_time_scale(0.5);

        scheduler.update(1.0);
        assert_eq!(scheduler.delta_time(TimeMode::Scaled), 0.5);
        assert_eq!(scheduler.delta_time(TimeMode::Unscaled), 1.0);

        // Negative scales are rejected
        scheduler.set_time_scale(-1.0);
        assert_eq!(scheduler.time_scale(), 0.5);
    }

    #[test]
    fn test_scaled_delays_freeze_with_the_simulation() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let hits = Arc::clone(&hits);
            scheduler.schedule(0.5, move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        scheduler.set_time_scale(0.0);
        scheduler.update(10.0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        scheduler.set_time_scale(1.0);
        scheduler.update(0.5);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cross_thread_work_lands_on_the_update_tick() {
        let scheduler = Arc::new(Scheduler::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let wrapped = {
            let hits = Arc::clone(&hits);
            scheduler.to_main_thread(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        std::thread::spawn(move || wrapped()).join().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        scheduler.update(0.016);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lifecycle_entry_points_reach_their_callbacks() {
        let scheduler = Scheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        {
            let log = Arc::clone(&log);
            scheduler.add_focus_callback(move |f| log.lock().push(format!("focus:{f}")));
        }
        {
            let log = Arc::clone(&log);
            scheduler.add_pause_callback(move |p| log.lock().push(format!("pause:{p}")));
        }
        {
            let log = Arc::clone(&log);
            scheduler.add_quit_callback(move || log.lock().push("quit".into()));
        }
        {
            let log = Arc::clone(&log);
            scheduler.add_low_memory_callback(move || log.lock().push("low_memory".into()));
        }

        scheduler.focus_changed(false);
        scheduler.pause_changed(true);
        scheduler.low_memory();
        scheduler.quit();

        assert_eq!(
            *log.lock(),
            vec!["focus:false", "pause:true", "low_memory", "quit"]
        );
    }

    #[test]
    fn test_teardown_clears_everything() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let hits = Arc::clone(&hits);
            scheduler.add_listener(Phase::Update, move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        {
            let hits = Arc::clone(&hits);
            scheduler.schedule(0.0, move || {
                hits.fetch_add(10, Ordering::SeqCst);
            });
        }
        {
            let hits = Arc::clone(&hits);
            scheduler.run_on_main_thread(move || {
                hits.fetch_add(100, Ordering::SeqCst);
            });
        }

        scheduler.teardown();
        scheduler.update(1.0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.live_delay_count(), 0);
    }

    #[test]
    fn test_once_listener_via_scheduler() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let hits = Arc::clone(&hits);
            scheduler.once(Phase::LateUpdate, move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        scheduler.late_update(0.016);
        scheduler.late_update(0.016);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
