//! Listener registries for tick phases and lifecycle notifications
//!
//! Application code subscribes callbacks to a tick phase (update, fixed
//! update, late update) or to a lifecycle notification (pause, focus, quit,
//! low memory) and gets back a [`ListenerKey`] for removal. Every registry
//! follows the same pattern: an ordered list of keyed callbacks, fired in
//! subscription order by the scheduler on the main thread.
//!
//! Firing iterates over a snapshot of the list taken under the lock, with
//! invocation happening unlocked. A listener may therefore subscribe or
//! unsubscribe anything - including itself - while a fire is in progress;
//! the mutation simply takes effect from the next fire.
//!
//! # Example
//!
//! ```ignore
//! use tickloop_core::{EventHub, Phase};
//!
//! let hub = EventHub::new();
//! let key = hub.subscribe(Phase::Update, || {
//!     tracing::info!("tick");
//! });
//!
//! // Later, unregister if needed
//! hub.unsubscribe(key);
//! ```

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use slotmap::{new_key_type, SlotMap};

use crate::util::run_isolated;

new_key_type! {
    /// Key for registered listeners, used for removal
    pub struct ListenerKey;
}

/// Tick phases a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Once per frame, before delay handles advance and queued tasks drain
    Update,
    /// Once per fixed-rate step
    FixedUpdate,
    /// Once per frame, after update
    LateUpdate,
}

/// Zero-argument listener (tick phases, quit, low memory)
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;
/// One-bool-argument listener (pause, focus)
pub type FlagCallback = Arc<dyn Fn(bool) + Send + Sync>;
/// Listener that runs once on the next firing of its phase, then is dropped
type OnceCallback = Box<dyn FnOnce() + Send>;

/// Internal enum to track which registry a listener belongs to
#[derive(Clone, Copy, Debug)]
enum ListenerKind {
    Tick(Phase),
    Pause,
    Focus,
    Quit,
    LowMemory,
}

/// An ordered list of keyed callbacks; subscription order is firing order.
///
/// Keys come from the hub-wide key registry, so slot reuse there never
/// perturbs the ordering here.
struct OrderedListeners<C> {
    entries: Vec<(ListenerKey, C)>,
}

impl<C: Clone> OrderedListeners<C> {
    fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    fn insert(&mut self, key: ListenerKey, callback: C) {
        self.entries.push((key, callback));
    }

    fn remove(&mut self, key: ListenerKey) -> bool {
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Vec<C> {
        self.entries.iter().map(|(_, callback)| callback.clone()).collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

// Preallocation mirrors the expected population skew: most listeners live on
// the update phase, fewer on the fixed and late phases.
const UPDATE_CAPACITY: usize = 1024;
const FIXED_UPDATE_CAPACITY: usize = 512;
const LATE_UPDATE_CAPACITY: usize = 256;

/// Multicast registries for every tick phase and lifecycle notification
pub struct EventHub {
    /// Mapping from ListenerKey to the registry that owns it, for removal
    keys: RwLock<SlotMap<ListenerKey, ListenerKind>>,

    update: RwLock<OrderedListeners<TickCallback>>,
    fixed_update: RwLock<OrderedListeners<TickCallback>>,
    late_update: RwLock<OrderedListeners<TickCallback>>,

    update_once: Mutex<Vec<OnceCallback>>,
    fixed_update_once: Mutex<Vec<OnceCallback>>,
    late_update_once: Mutex<Vec<OnceCallback>>,

    pause: RwLock<OrderedListeners<FlagCallback>>,
    focus: RwLock<OrderedListeners<FlagCallback>>,
    quit: RwLock<OrderedListeners<TickCallback>>,
    low_memory: RwLock<OrderedListeners<TickCallback>>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(SlotMap::with_key()),
            update: RwLock::new(OrderedListeners::with_capacity(UPDATE_CAPACITY)),
            fixed_update: RwLock::new(OrderedListeners::with_capacity(FIXED_UPDATE_CAPACITY)),
            late_update: RwLock::new(OrderedListeners::with_capacity(LATE_UPDATE_CAPACITY)),
            update_once: Mutex::new(Vec::new()),
            fixed_update_once: Mutex::new(Vec::new()),
            late_update_once: Mutex::new(Vec::new()),
            pause: RwLock::new(OrderedListeners::with_capacity(0)),
            focus: RwLock::new(OrderedListeners::with_capacity(0)),
            quit: RwLock::new(OrderedListeners::with_capacity(0)),
            low_memory: RwLock::new(OrderedListeners::with_capacity(0)),
        }
    }

    fn phase_registry(&self, phase: Phase) -> &RwLock<OrderedListeners<TickCallback>> {
        match phase {
            Phase::Update => &self.update,
            Phase::FixedUpdate => &self.fixed_update,
            Phase::LateUpdate => &self.late_update,
        }
    }

    fn once_registry(&self, phase: Phase) -> &Mutex<Vec<OnceCallback>> {
        match phase {
            Phase::Update => &self.update_once,
            Phase::FixedUpdate => &self.fixed_update_once,
            Phase::LateUpdate => &self.late_update_once,
        }
    }

    /// Register a callback to be called every firing of the given phase
    ///
    /// # Returns
    /// A key that can be used to unregister the callback via [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe<F>(&self, phase: Phase, callback: F) -> ListenerKey
    where
        F: Fn() + Send + Sync + 'static,
    {
        let key = self.keys.write().insert(ListenerKind::Tick(phase));
        self.phase_registry(phase).write().insert(key, Arc::new(callback));
        key
    }

    /// Register a callback that fires once on the next firing of the phase
    /// and is then discarded.
    pub fn once<F>(&self, phase: Phase, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.once_registry(phase).lock().push(Box::new(callback));
    }

    /// Register a callback for pause-state changes
    pub fn add_pause_callback<F>(&self, callback: F) -> ListenerKey
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let key = self.keys.write().insert(ListenerKind::Pause);
        self.pause.write().insert(key, Arc::new(callback));
        key
    }

    /// Register a callback for focus changes
    pub fn add_focus_callback<F>(&self, callback: F) -> ListenerKey
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let key = self.keys.write().insert(ListenerKind::Focus);
        self.focus.write().insert(key, Arc::new(callback));
        key
    }

    /// Register a callback invoked when the application is about to quit
    pub fn add_quit_callback<F>(&self, callback: F) -> ListenerKey
    where
        F: Fn() + Send + Sync + 'static,
    {
        let key = self.keys.write().insert(ListenerKind::Quit);
        self.quit.write().insert(key, Arc::new(callback));
        key
    }

    /// Register a callback invoked on a low-memory notification
    pub fn add_low_memory_callback<F>(&self, callback: F) -> ListenerKey
    where
        F: Fn() + Send + Sync + 'static,
    {
        let key = self.keys.write().insert(ListenerKind::LowMemory);
        self.low_memory.write().insert(key, Arc::new(callback));
        key
    }

    /// Remove a listener by its key
    ///
    /// Removing a key that was never registered, or was already removed, is
    /// a silent no-op returning `false`.
    pub fn unsubscribe(&self, key: ListenerKey) -> bool {
        let kind = self.keys.write().remove(key);
        match kind {
            Some(ListenerKind::Tick(phase)) => self.phase_registry(phase).write().remove(key),
            Some(ListenerKind::Pause) => self.pause.write().remove(key),
            Some(ListenerKind::Focus) => self.focus.write().remove(key),
            Some(ListenerKind::Quit) => self.quit.write().remove(key),
            Some(ListenerKind::LowMemory) => self.low_memory.write().remove(key),
            None => false,
        }
    }

    /// Fire every listener of the phase in subscription order, then the
    /// phase's once-listeners. Called by the scheduler on the main thread.
    pub fn fire_phase(&self, phase: Phase) {
        let snapshot = self.phase_registry(phase).read().snapshot();
        for callback in snapshot {
            run_isolated("phase listener", || callback());
        }

        let once = std::mem::take(&mut *self.once_registry(phase).lock());
        for callback in once {
            run_isolated("once listener", move || callback());
        }
    }

    pub fn fire_pause(&self, is_paused: bool) {
        tracing::debug!("Firing pause listeners: {}", is_paused);
        let snapshot = self.pause.read().snapshot();
        for callback in snapshot {
            run_isolated("pause listener", || callback(is_paused));
        }
    }

    pub fn fire_focus(&self, has_focus: bool) {
        tracing::debug!("Firing focus listeners: {}", has_focus);
        let snapshot = self.focus.read().snapshot();
        for callback in snapshot {
            run_isolated("focus listener", || callback(has_focus));
        }
    }

    pub fn fire_quit(&self) {
        tracing::info!("Firing quit listeners");
        let snapshot = self.quit.read().snapshot();
        for callback in snapshot {
            run_isolated("quit listener", || callback());
        }
    }

    pub fn fire_low_memory(&self) {
        tracing::warn!("Firing low-memory listeners");
        let snapshot = self.low_memory.read().snapshot();
        for callback in snapshot {
            run_isolated("low-memory listener", || callback());
        }
    }

    /// Number of regular listeners currently subscribed to a phase
    pub fn listener_count(&self, phase: Phase) -> usize {
        self.phase_registry(phase).read().len()
    }

    /// Drop every listener and pending once-callback. Used at teardown.
    pub fn clear(&self) {
        self.keys.write().clear();
        self.update.write().clear();
        self.fixed_update.write().clear();
        self.late_update.write().clear();
        self.update_once.lock().clear();
        self.fixed_update_once.lock().clear();
        self.late_update_once.lock().clear();
        self.pause.write().clear();
        self.focus.write().clear();
        self.quit.write().clear();
        self.low_memory.write().clear();
    }
}
