//! Task queue system for main thread execution
//!
//! Allows background threads to queue work to execute on the main thread.
//! Queued tasks are drained once per update tick.

pub mod queue;

pub use queue::*;
