//! Process-wide default scheduler
//!
//! A thin static facade over one [`Scheduler`] instance for application code
//! that wants a global entry point instead of threading a reference around.
//! The host loop calls the `on_*` entry points; everything else is the
//! scheduler surface re-exported as free functions.
//!
//! All logic lives on [`Scheduler`]; embedders that need isolation (or more
//! than one driver loop) construct their own instances and skip this module
//! entirely.
//!
//! # Example
//!
//! ```ignore
//! use tickloop_core::{app, Phase};
//!
//! app::init();
//! app::add_listener(Phase::Update, || {
//!     tracing::debug!("tick");
//! });
//! let handle = app::schedule(3.0, || {
//!     tracing::info!("3 seconds passed");
//! });
//!
//! // Host loop, once per frame:
//! app::on_update(delta);
//! ```

use std::sync::LazyLock;

use crate::config::RuntimeConfig;
use crate::delay::{DelayFlags, DelayHandle};
use crate::lifetime::Lifetime;
use crate::listeners::{ListenerKey, Phase};
use crate::scheduler::Scheduler;
use crate::time::TimeMode;

static APP: LazyLock<Scheduler> = LazyLock::new(|| Scheduler::with_config(RuntimeConfig::default()));

/// The process-wide scheduler instance
pub fn instance() -> &'static Scheduler {
    &APP
}

/// Force creation of the default instance. Optional - any other call does
/// this implicitly - but calling it from the main thread at startup keeps
/// initialization out of the first tick.
pub fn init() {
    LazyLock::force(&APP);
    tracing::info!("tickloop initialized");
}

/// Cancel all delay handles, drop pending tasks, and clear every listener.
/// Called by the host at process end.
pub fn shutdown() {
    tracing::info!("tickloop shutting down...");
    APP.teardown();
}

// === Tick entry points, called by the host loop on the main thread ===

pub fn on_update(delta: f32) {
    APP.update(delta);
}

pub fn on_fixed_update(delta: f32) {
    APP.fixed_update(delta);
}

pub fn on_late_update(delta: f32) {
    APP.late_update(delta);
}

// === Lifecycle entry points ===

pub fn on_focus_changed(has_focus: bool) {
    APP.focus_changed(has_focus);
}

pub fn on_pause_changed(is_paused: bool) {
    APP.pause_changed(is_paused);
}

pub fn on_quit() {
    APP.quit();
}

pub fn on_low_memory() {
    APP.low_memory();
}

// === Listeners ===

pub fn add_listener<F>(phase: Phase, callback: F) -> ListenerKey
where
    F: Fn() + Send + Sync + 'static,
{
    APP.add_listener(phase, callback)
}

pub fn remove_listener(key: ListenerKey) -> bool {
    APP.remove_listener(key)
}

pub fn once<F>(phase: Phase, callback: F)
where
    F: FnOnce() + Send + 'static,
{
    APP.once(phase, callback);
}

pub fn add_pause_callback<F>(callback: F) -> ListenerKey
where
    F: Fn(bool) + Send + Sync + 'static,
{
    APP.add_pause_callback(callback)
}

pub fn add_focus_callback<F>(callback: F) -> ListenerKey
where
    F: Fn(bool) + Send + Sync + 'static,
{
    APP.add_focus_callback(callback)
}

pub fn add_quit_callback<F>(callback: F) -> ListenerKey
where
    F: Fn() + Send + Sync + 'static,
{
    APP.add_quit_callback(callback)
}

pub fn add_low_memory_callback<F>(callback: F) -> ListenerKey
where
    F: Fn() + Send + Sync + 'static,
{
    APP.add_low_memory_callback(callback)
}

// === Cross-thread dispatch ===

/// Queue an action to run on the main thread during the next update tick
pub fn run_on_main_thread<F>(action: F)
where
    F: FnOnce() + Send + 'static,
{
    APP.run_on_main_thread(action);
}

/// Convert a callback into a main-thread-marshalling one
pub fn to_main_thread<F>(action: F) -> impl Fn() + Send + Sync + 'static
where
    F: Fn() + Send + Sync + 'static,
{
    APP.to_main_thread(action)
}

pub fn to_main_thread_with<T, F>(action: F) -> impl Fn(T) + Send + Sync + 'static
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    APP.to_main_thread_with(action)
}

// === Delay handles ===

pub fn schedule<F>(duration: f32, on_complete: F) -> DelayHandle
where
    F: FnMut() + Send + 'static,
{
    APP.schedule(duration, on_complete)
}

pub fn schedule_repeating<F>(duration: f32, on_complete: F) -> DelayHandle
where
    F: FnMut() + Send + 'static,
{
    APP.schedule_repeating(duration, on_complete)
}

pub fn schedule_with<F>(duration: f32, flags: DelayFlags, on_complete: F) -> DelayHandle
where
    F: FnMut() + Send + 'static,
{
    APP.schedule_with(duration, flags, on_complete)
}

pub fn schedule_bound<F>(
    owner: impl Lifetime + 'static,
    duration: f32,
    flags: DelayFlags,
    on_complete: F,
) -> DelayHandle
where
    F: FnMut() + Send + 'static,
{
    APP.schedule_bound(owner, duration, flags, on_complete)
}

pub fn cancel(handle: &DelayHandle) {
    handle.cancel();
}

pub fn pause(handle: &DelayHandle) {
    handle.pause();
}

pub fn resume(handle: &DelayHandle) {
    handle.resume();
}

pub fn cancel_all() {
    APP.cancel_all();
}

pub fn pause_all() {
    APP.pause_all();
}

pub fn resume_all() {
    APP.resume_all();
}

// === Time ===

pub fn set_time_scale(scale: f32) {
    APP.set_time_scale(scale);
}

pub fn time_scale() -> f32 {
    APP.time_scale()
}

pub fn delta_time(mode: TimeMode) -> f32 {
    APP.delta_time(mode)
}

pub fn frame_count() -> u64 {
    APP.frame_count()
}

pub fn fixed_frame_count() -> u64 {
    APP.fixed_frame_count()
}
