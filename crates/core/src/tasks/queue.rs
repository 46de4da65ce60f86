//! Main thread task queue
//!
//! Allows background threads to queue work to execute on the main thread.
//! Tasks are drained once per update tick, in enqueue order.
//!
//! The queue is a mutex-guarded list with a double-buffered drain: the
//! draining thread swaps the pending list with a scratch buffer under the
//! lock, then invokes the swapped-out tasks with no lock held. Tasks may
//! therefore enqueue further work from inside a drain without deadlocking;
//! such work runs on the *next* drain, never the current one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::util::run_isolated;

/// A task to execute on the main thread
pub type Task = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    /// Tasks waiting for the next drain, in enqueue order
    pending: Mutex<Vec<Task>>,
    /// Lets the main thread skip the lock entirely when nothing is queued
    has_pending: AtomicBool,
    /// Drain-side buffer, swapped with `pending` under the lock.
    /// Locked only by the draining thread; kept around to reuse its capacity.
    scratch: Mutex<Vec<Task>>,
}

/// Cross-thread dispatcher marshalling work onto the main thread.
///
/// Cloning is cheap and shares the same queue. `push` is safe from any
/// thread; `drain` must only be called from the thread designated as main.
#[derive(Clone)]
pub struct MainThreadQueue {
    shared: Arc<Shared>,
}

impl Default for MainThreadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainThreadQueue {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Preallocate both buffers for `capacity` tasks
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                pending: Mutex::new(Vec::with_capacity(capacity)),
                has_pending: AtomicBool::new(false),
                scratch: Mutex::new(Vec::with_capacity(capacity)),
            }),
        }
    }

    /// Queue a task to execute on the next update tick
    ///
    /// This is safe to call from any thread and never blocks waiting for the
    /// main thread - the lock is held only for the append.
    #[tracing::instrument(skip(self, task))]
    pub fn push<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.shared.pending.lock();
        pending.push(Box::new(task));
        self.shared.has_pending.store(true, Ordering::Release);
    }

    /// Process all tasks queued before this call
    ///
    /// Called once per update tick on the main thread. Tasks run in enqueue
    /// order; a panicking task is logged and skipped without aborting the
    /// remainder of the drain. Returns the number of tasks processed.
    #[tracing::instrument(skip(self))]
    pub fn drain(&self) -> usize {
        if !self.shared.has_pending.load(Ordering::Acquire) {
            return 0;
        }

        let mut scratch = self.shared.scratch.lock();
        {
            let mut pending = self.shared.pending.lock();
            std::mem::swap(&mut *pending, &mut *scratch);
            self.shared.has_pending.store(false, Ordering::Release);
        }

        let count = scratch.len();
        for task in scratch.drain(..) {
            run_isolated("queued task", move || task());
        }
        count
    }

    /// Convert a callback into one that queues the original instead of
    /// running it, making it safe to invoke from any thread or context.
    pub fn wrap<F>(&self, action: F) -> impl Fn() + Send + Sync + 'static
    where
        F: Fn() + Send + Sync + 'static,
    {
        let queue = self.clone();
        let action = Arc::new(action);
        move || {
            let action = Arc::clone(&action);
            queue.push(move || action());
        }
    }

    /// One-argument variant of [`wrap`](Self::wrap); the argument is captured
    /// at invocation time and delivered on the main thread.
    pub fn wrap_with<T, F>(&self, action: F) -> impl Fn(T) + Send + Sync + 'static
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let queue = self.clone();
        let action = Arc::new(action);
        move |value: T| {
            let action = Arc::clone(&action);
            queue.push(move || action(value));
        }
    }

    /// Drop every pending task without running it. Used at teardown.
    pub fn clear(&self) {
        let mut pending = self.shared.pending.lock();
        let dropped = pending.len();
        pending.clear();
        self.shared.has_pending.store(false, Ordering::Release);
        if dropped > 0 {
            tracing::debug!("Dropped {} queued tasks", dropped);
        }
    }

    /// Check how many tasks are currently queued
    pub fn len(&self) -> usize {
        self.shared.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.shared.has_pending.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_drain_runs_tasks_in_enqueue_order() {
        let queue = MainThreadQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = Arc::clone(&order);
            queue.push(move || order.lock().push(i));
        }

        assert_eq!(queue.drain(), 5);
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_drain_is_a_cheap_no_op() {
        let queue = MainThreadQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    fn test_each_task_runs_exactly_once() {
        let queue = MainThreadQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            let hits = Arc::clone(&hits);
            handles.push(std::thread::spawn(move || {
                for _ in 0..25 {
                    let hits = Arc::clone(&hits);
                    queue.push(move || {
                        hits.fetch_add(1, Ordering::SeqCst);
                    });
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 100);
        assert_eq!(queue.drain(), 100);
        assert_eq!(hits.load(Ordering::SeqCst), 100);

        // Nothing left for a second drain
        assert_eq!(queue.drain(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_tasks_run_on_the_draining_thread() {
        let queue = MainThreadQueue::new();
        let seen_on = Arc::new(Mutex::new(None));

        {
            let queue = queue.clone();
            let seen_on = Arc::clone(&seen_on);
            std::thread::spawn(move || {
                queue.push(move || {
                    *seen_on.lock() = Some(std::thread::current().id());
                });
            })
            .join()
            .unwrap();
        }

        queue.drain();
        assert_eq!(*seen_on.lock(), Some(std::thread::current().id()));
    }

    #[test]
    fn test_enqueue_during_drain_waits_for_next_drain() {
        let queue = MainThreadQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let inner_queue = queue.clone();
            let hits = Arc::clone(&hits);
            queue.push(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                let hits = Arc::clone(&hits);
                inner_queue.push(move || {
                    hits.fetch_add(10, Ordering::SeqCst);
                });
            });
        }

        assert_eq!(queue.drain(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert_eq!(queue.drain(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_panicking_task_does_not_stop_the_drain() {
        let queue = MainThreadQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));

        queue.push(|| panic!("bad task"));
        {
            let hits = Arc::clone(&hits);
            queue.push(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(queue.drain(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wrap_defers_to_the_queue() {
        let queue = MainThreadQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let wrapped = {
            let hits = Arc::clone(&hits);
            queue.wrap(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        wrapped();
        wrapped();
        assert_eq!(hits.load(Ordering::SeqCst), 0, "wrap must defer, not invoke");

        assert_eq!(queue.drain(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_wrap_with_carries_the_argument() {
        let queue = MainThreadQueue::new();
        let total = Arc::new(AtomicUsize::new(0));

        let wrapped = {
            let total = Arc::clone(&total);
            queue.wrap_with(move |n: usize| {
                total.fetch_add(n, Ordering::SeqCst);
            })
        };

        wrapped(3);
        wrapped(4);
        queue.drain();
        assert_eq!(total.load(Ordering::SeqCst), 7);
    }
}
