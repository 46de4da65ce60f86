//! tickloop - Runtime Scheduling Core
//!
//! This crate is the tick-driven heart of an application framework:
//! per-tick lifecycle dispatch, marshalling of background-thread work onto
//! the main thread, and a registry of deferred/looping delay handles with
//! pause/resume/cancel and optional owner-liveness binding.
//!
//! # Architecture
//!
//! - [`Scheduler`] - an explicit instance composing the pieces below; the
//!   host loop feeds it `update`/`fixed_update`/`late_update` ticks and
//!   lifecycle notifications
//! - [`EventHub`] - per-phase and per-lifecycle listener registries
//! - [`MainThreadQueue`] - the cross-thread dispatcher
//! - [`DelayRegistry`] / [`DelayHandle`] - scheduled deferred work
//! - [`Countdown`] / [`Stopwatch`] - pull-based timers driven by their owner
//! - [`app`] - a process-wide default instance behind free functions
//! - [`runner`] - an optional standalone host loop for applications without
//!   an embedding engine

pub mod app;
pub mod clock;
pub mod config;
pub mod delay;
pub mod lifetime;
pub mod listeners;
pub mod runner;
pub mod scheduler;
pub mod tasks;
pub mod time;

mod util;

// Re-export commonly used items
pub use clock::{Countdown, Stopwatch};
pub use config::{ConfigError, ConfigResult, RuntimeConfig};
pub use delay::{DelayFlags, DelayHandle, DelayRegistry, DelayState};
pub use lifetime::Lifetime;
pub use listeners::{EventHub, ListenerKey, Phase};
pub use runner::{run_loop, Tick, Ticker};
pub use scheduler::Scheduler;
pub use tasks::MainThreadQueue;
pub use time::{TickDeltas, TimeMode};
