//! Guard predicates for controlling transitions.
//!
//! Guards are zero-argument boolean functions evaluated synchronously when
//! a transition is considered. They must be free of side effects the engine
//! could observe: a guard is evaluated at most once per matching attempt,
//! but may be evaluated again on later events.

use std::fmt;
use std::sync::Arc;

/// Pure predicate that determines if a transition can fire.
///
/// # Example
///
/// ```rust
/// use hfsm::core::Guard;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let door_locked = Arc::new(AtomicBool::new(true));
/// let flag = Arc::clone(&door_locked);
/// let can_open = Guard::new(move || !flag.load(Ordering::SeqCst));
///
/// assert!(!can_open.check());
/// door_locked.store(false, Ordering::SeqCst);
/// assert!(can_open.check());
/// ```
#[derive(Clone)]
pub struct Guard {
    predicate: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl Guard {
    /// Create a guard from a predicate function.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the predicate.
    pub fn check(&self) -> bool {
        (self.predicate)()
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
