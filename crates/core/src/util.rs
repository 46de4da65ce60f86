//! Small internal helpers shared across the tick loops

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run a user-supplied callback, catching a panic instead of letting it
/// abort the rest of the tick. Returns `false` if the callback panicked.
///
/// Every loop that invokes opaque callbacks (phase listeners, queued tasks,
/// delay handles) goes through this so one faulty callback cannot starve
/// the others.
pub(crate) fn run_isolated(context: &'static str, f: impl FnOnce()) -> bool {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(payload) => {
            tracing::error!("{} panicked: {}", context, panic_message(payload.as_ref()));
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_panic_is_swallowed() {
        assert!(run_isolated("test callback", || {}));
        assert!(!run_isolated("test callback", || panic!("boom")));
    }
}
