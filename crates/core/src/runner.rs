//! Standalone host loop
//!
//! The scheduler core never ticks itself - it expects a host environment to
//! call the phase entry points. Embedded hosts (an engine, a UI framework)
//! do that from their own loop; standalone applications can use this module
//! instead: a [`Ticker`] thread paces frames over a bounded channel, and
//! [`run_loop`] consumes them on the calling thread, which thereby becomes
//! the main thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::config::RuntimeConfig;
use crate::scheduler::Scheduler;

/// A frame-pacing event
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// Monotonically increasing frame number
    pub frame: u64,
    /// Time since the ticker started
    pub elapsed: Duration,
}

/// Dedicated thread emitting a [`Tick`] at a fixed interval.
///
/// The channel is bounded at two entries; when the consumer falls behind,
/// ticks are skipped rather than queued, so a stall never causes a burst of
/// catch-up frames.
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    tick_rx: Receiver<Tick>,
}

impl Ticker {
    /// Spawn the pacing thread.
    ///
    /// # Panics
    /// Panics if the OS refuses to spawn a thread.
    pub fn spawn(interval: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tick_tx, tick_rx) = bounded(2);

        let handle = {
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("tickloop-ticker".to_string())
                .spawn(move || pace(&tick_tx, &shutdown, interval))
                .expect("failed to spawn ticker thread")
        };

        Self {
            handle: Some(handle),
            shutdown,
            tick_rx,
        }
    }

    pub fn receiver(&self) -> &Receiver<Tick> {
        &self.tick_rx
    }

    /// Ask the pacing thread to stop
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Stop and wait for the pacing thread
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn pace(tick_tx: &Sender<Tick>, shutdown: &AtomicBool, interval: Duration) {
    let start = Instant::now();
    let mut frame = 0u64;
    let mut next = start + interval;

    while !shutdown.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now < next {
            // Sleep in short slices so shutdown stays responsive
            thread::sleep((next - now).min(Duration::from_millis(1)));
            continue;
        }

        match tick_tx.try_send(Tick { frame, elapsed: now - start }) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }

        frame += 1;
        next += interval;
        if next < now {
            // Fell behind; restart the cadence from here instead of bursting
            next = now + interval;
        }
    }
}

/// Drive a scheduler until `should_exit` returns true.
///
/// Each frame runs zero or more fixed-update steps off an accumulator, then
/// one update and one late update with the measured wall-clock delta. The
/// calling thread is the main thread for everything the scheduler runs.
pub fn run_loop<F>(scheduler: &Scheduler, config: &RuntimeConfig, mut should_exit: F)
where
    F: FnMut() -> bool,
{
    let interval = Duration::from_secs_f64(1.0 / f64::from(config.target_frame_rate.max(1)));
    let ticker = Ticker::spawn(interval);
    tracing::info!(
        "Run loop started: {} fps target, {}s fixed step",
        config.target_frame_rate,
        config.fixed_timestep
    );

    let mut last = Instant::now();
    let mut accumulator = 0.0f32;

    while !should_exit() {
        if ticker.receiver().recv().is_err() {
            break;
        }
        let now = Instant::now();
        let delta = (now - last).as_secs_f32();
        last = now;

        accumulator += delta;
        let mut steps = 0u32;
        while accumulator >= config.fixed_timestep && steps < config.max_fixed_steps {
            scheduler.fixed_update(config.fixed_timestep);
            accumulator -= config.fixed_timestep;
            steps += 1;
        }
        if steps == config.max_fixed_steps {
            // A long stall would otherwise owe an unbounded backlog
            accumulator = 0.0;
        }

        scheduler.update(delta);
        scheduler.late_update(delta);
    }

    ticker.join();
    tracing::info!("Run loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listeners::Phase;
    use std::sync::atomic::AtomicUsize;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    #[test]
    fn test_ticker_emits_frames() {
        let ticker = Ticker::spawn(Duration::from_millis(2));

        let first = ticker.receiver().recv_timeout(Duration::from_millis(500));
        assert!(first.is_ok());
        assert_eq!(first.unwrap().frame, 0);

        let second = ticker.receiver().recv_timeout(Duration::from_millis(500));
        assert!(second.is_ok());

        ticker.join();
    }

    #[test]
    fn test_run_loop_drives_all_phases() {
        init_tracing();

        let mut config = RuntimeConfig::default();
        config.target_frame_rate = 250;
        config.fixed_timestep = 0.002;

        let scheduler = Scheduler::with_config(config.clone());
        let updates = Arc::new(AtomicUsize::new(0));
        let lates = Arc::new(AtomicUsize::new(0));

        {
            let updates = Arc::clone(&updates);
            scheduler.add_listener(Phase::Update, move || {
                updates.fetch_add(1, Ordering::SeqCst);
            });
        }
        {
            let lates = Arc::clone(&lates);
            scheduler.add_listener(Phase::LateUpdate, move || {
                lates.fetch_add(1, Ordering::SeqCst);
            });
        }

        run_loop(&scheduler, &config, || scheduler.frame_count() >= 3);

        assert!(scheduler.frame_count() >= 3);
        assert!(scheduler.fixed_frame_count() >= 1);
        assert_eq!(updates.load(Ordering::SeqCst) as u64, scheduler.frame_count());
        assert_eq!(lates.load(Ordering::SeqCst) as u64, scheduler.frame_count());
    }

    #[test]
    fn test_run_loop_can_exit_immediately() {
        let config = RuntimeConfig::default();
        let scheduler = Scheduler::with_config(config.clone());
        run_loop(&scheduler, &config, || true);
        assert_eq!(scheduler.frame_count(), 0);
    }
}
