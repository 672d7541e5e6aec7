//! Observer capability for flag state changes.
//!
//! A flag holds its subscribers as `Arc<dyn FlagObserver>`. Any type can subscribe by
//! implementing the single `on_flag_changed` method, and plain closures taking
//! `(&str, bool)` implement the trait automatically.

use std::sync::Arc;

/// Receives the state of a flag, once on subscription and then after committed
/// transitions.
///
/// The callback runs synchronously on a thread calling `Flag::set_enabled` (or
/// `add_subscriber`), with no flag lock held. It may write or subscribe to any
/// flag, the notifying one included; a write to the notifying flag is delivered to
/// this observer after the current callback returns. Calls to one observer never
/// overlap.
///
/// # Examples
///
/// ```rust
/// use flag_observer::{Flag, FlagObserver};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// struct Mirror(AtomicBool);
///
/// impl FlagObserver for Mirror {
///     fn on_flag_changed(&self, _name: &str, enabled: bool) {
///         self.0.store(enabled, Ordering::Release);
///     }
/// }
///
/// let flag = Flag::new("dark-mode", true);
/// let mirror = Arc::new(Mirror(AtomicBool::new(false)));
/// flag.add_subscriber(mirror.clone()).unwrap();
/// assert!(mirror.0.load(Ordering::Acquire));
/// ```
pub trait FlagObserver: Send + Sync {
    /// Called with the flag name and the state being delivered.
    fn on_flag_changed(&self, name: &str, enabled: bool);
}

impl<F> FlagObserver for F
where
    F: Fn(&str, bool) + Send + Sync,
{
    fn on_flag_changed(&self, name: &str, enabled: bool) {
        self(name, enabled)
    }
}

/// Returns `true` if both handles point at the same observer allocation.
///
/// Subscriptions are identified by allocation, so the vtable half of the fat pointer
/// is ignored.
pub(crate) fn same_observer(a: &Arc<dyn FlagObserver>, b: &Arc<dyn FlagObserver>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
