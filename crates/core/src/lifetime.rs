//! Owner-liveness capability for delay handles
//!
//! A delay handle can be bound to an owner so that the owner's disappearance
//! silently cancels the handle. The registry never learns what an owner *is* -
//! it only asks whether it is still alive, through this trait. The usual
//! owner is a [`Weak`] obtained from whatever `Arc` keeps the owning object
//! alive; tests supply fixed-answer implementations.

use std::sync::Weak;

/// Answers "does the owner of a delay handle still exist?"
///
/// Checked once per sweep for every bound handle, so implementations should
/// be cheap and must not block.
pub trait Lifetime: Send + Sync {
    fn is_alive(&self) -> bool;
}

/// Alive while any strong reference to the target remains.
impl<T: ?Sized + Send + Sync> Lifetime for Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_weak_owner_tracks_arc_liveness() {
        let owner = Arc::new(());
        let weak = Arc::downgrade(&owner);
        assert!(weak.is_alive());

        drop(owner);
        assert!(!weak.is_alive());
    }
}
