use std::sync::{Arc, Mutex};

/// Events emitted by a flag registry during operations.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use flag_observer::FlagEvent;
///
/// let event = FlagEvent::Create { name: "payment-v2".to_string(), enabled: false };
/// assert_eq!(event.to_string(), "create { name: payment-v2, enabled: false }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagEvent {
    /// A flag was created and published in the registry.
    Create {
        /// The flag name
        name: String,
        /// Initial state of the new flag
        enabled: bool,
    },

    /// A flag committed a state transition.
    Transition {
        /// The flag name
        name: String,
        /// The newly committed state
        enabled: bool,
        /// How many subscribers were notified in this pass
        notified: usize,
    },

    /// A flag was looked up by name.
    Lookup {
        /// The flag name that was requested
        name: String,
        /// Whether the flag was found in the registry
        found: bool,
    },

    /// An observer was subscribed through the registry.
    Observe {
        /// The flag name the observer asked for
        name: String,
        /// Whether the flag existed (no subscription happens otherwise)
        found: bool,
    },

    /// An observer was detached through the registry.
    Unobserve {
        /// The flag name
        name: String,
        /// Whether the observer was actually subscribed
        removed: bool,
    },

    /// An observer panicked while being notified.
    SubscriberFailed {
        /// The flag name
        name: String,
        /// Position of the observer in the subscriber list
        index: usize,
    },

    /// The registry was cleared.
    Clear {
        /// Number of flags dropped from the registry
        dropped: usize,
    },
}

impl std::fmt::Display for FlagEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagEvent::Create { name, enabled } => {
                write!(f, "create {{ name: {}, enabled: {} }}", name, enabled)
            }
            FlagEvent::Transition {
                name,
                enabled,
                notified,
            } => write!(
                f,
                "transition {{ name: {}, enabled: {}, notified: {} }}",
                name, enabled, notified
            ),
            FlagEvent::Lookup { name, found } => {
                write!(f, "lookup {{ name: {}, found: {} }}", name, found)
            }
            FlagEvent::Observe { name, found } => {
                write!(f, "observe {{ name: {}, found: {} }}", name, found)
            }
            FlagEvent::Unobserve { name, removed } => {
                write!(f, "unobserve {{ name: {}, removed: {} }}", name, removed)
            }
            FlagEvent::SubscriberFailed { name, index } => {
                write!(f, "subscriber failed {{ name: {}, index: {} }}", name, index)
            }
            FlagEvent::Clear { dropped } => {
                write!(f, "Clearing the Registry ({} flags)", dropped)
            }
        }
    }
}

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives a reference to a `FlagEvent` every time the registry or one
/// of its flags is interacted with. It must be thread-safe because flags are shared
/// across threads.
pub type TraceCallback = dyn Fn(&FlagEvent) + Send + Sync + 'static;

/// Holds an optional tracing callback.
///
/// A registry owns one hook and shares it with every flag it creates, so flags keep
/// reporting to the same callback even after they were dropped from the registry
/// by `clear`.
#[derive(Default)]
pub struct TraceHook {
    callback: Mutex<Option<Arc<TraceCallback>>>,
}

impl TraceHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tracing callback, replacing any previous one.
    ///
    /// # Lock Poisoning Recovery
    ///
    /// If the lock is poisoned, this method recovers by extracting the inner value.
    pub fn set(&self, callback: impl Fn(&FlagEvent) + Send + Sync + 'static) {
        let mut guard = self.callback.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(Arc::new(callback));
    }

    /// Clear the tracing callback. No events are emitted afterwards.
    pub fn clear(&self) {
        let mut guard = self.callback.lock().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    /// Invoke the current callback, if any.
    ///
    /// The lock is released before the callback runs, so a callback may replace or
    /// clear the hook itself.
    pub fn emit(&self, event: &FlagEvent) {
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();

        if let Some(callback) = callback {
            callback(event);
        }
    }
}

impl std::fmt::Debug for TraceHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let installed = self
            .callback
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false);
        f.debug_struct("TraceHook")
            .field("installed", &installed)
            .finish()
    }
}
