//! A named boolean flag that pushes its state to subscribed observers.
//!
//! The flag is the only place where a state change is processed. Observers receive
//! the current state once when they subscribe and then once per committed transition,
//! so they can cache whatever decision depends on the flag instead of re-reading it.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info};

use crate::observer::same_observer;
use crate::{DispatchPolicy, FlagError, FlagEvent, FlagObserver, RegistryConfig, TraceHook};

/// A named boolean state cell with an ordered list of observers.
///
/// `Flag` is shared as `Arc<Flag>`; every method takes `&self` and is safe to call
/// from several threads at once. No lock is held while an observer runs, so an
/// observer may read or write any flag, including the one notifying it.
///
/// # Examples
///
/// ```rust
/// use flag_observer::{Flag, FlagObserver};
/// use std::sync::{Arc, Mutex};
///
/// let flag = Flag::new("payment-v2", false);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_clone = seen.clone();
/// let observer: Arc<dyn FlagObserver> = Arc::new(move |_: &str, enabled: bool| {
///     seen_clone.lock().unwrap().push(enabled);
/// });
///
/// flag.add_subscriber(observer).unwrap(); // replays `false`
/// flag.set_enabled(true).unwrap();        // pushes `true`
/// flag.set_enabled(true).unwrap();        // no-op, nothing pushed
///
/// assert_eq!(*seen.lock().unwrap(), vec![false, true]);
/// ```
pub struct Flag {
    name: String,
    enabled: AtomicBool,
    // `enabled` only changes while this lock is held, so every commit gets the next
    // generation in commit order.
    subscribers: Mutex<Subscribers>,
    policy: DispatchPolicy,
    log_transitions: bool,
    trace: Option<Arc<TraceHook>>,
}

#[derive(Default)]
struct Subscribers {
    generation: u64,
    list: Vec<Arc<Subscription>>,
}

/// One observer plus the bookkeeping that keeps its deliveries ordered.
struct Subscription {
    observer: Arc<dyn FlagObserver>,
    mailbox: Mutex<Mailbox>,
}

/// Per-observer delivery state.
///
/// Only one thread at a time drains a mailbox. A value offered while another thread
/// is draining is left in `pending` for that thread, and an offer older than what the
/// observer already has (or is about to get) is dropped.
#[derive(Default)]
struct Mailbox {
    delivered: Option<u64>,
    pending: Option<(u64, bool)>,
    draining: bool,
}

impl Mailbox {
    fn newest(&self) -> Option<u64> {
        self.pending.map(|(generation, _)| generation).or(self.delivered)
    }
}

impl Subscription {
    fn new(observer: Arc<dyn FlagObserver>) -> Self {
        Self {
            observer,
            mailbox: Mutex::new(Mailbox::default()),
        }
    }

    fn mailbox(&self) -> MutexGuard<'_, Mailbox> {
        self.mailbox.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Flag {
    /// Create a standalone flag using the default dispatch policy.
    pub fn new(name: impl Into<String>, initial_state: bool) -> Self {
        Self::with_policy(name, initial_state, DispatchPolicy::default())
    }

    /// Create a standalone flag with an explicit observer failure policy.
    pub fn with_policy(name: impl Into<String>, initial_state: bool, policy: DispatchPolicy) -> Self {
        Self {
            name: name.into(),
            enabled: AtomicBool::new(initial_state),
            subscribers: Mutex::new(Subscribers::default()),
            policy,
            log_transitions: true,
            trace: None,
        }
    }

    /// Create a flag owned by a registry: it inherits the registry configuration and
    /// reports to the registry's trace hook.
    pub(crate) fn from_config(
        name: impl Into<String>,
        initial_state: bool,
        config: &RegistryConfig,
        trace: Arc<TraceHook>,
    ) -> Self {
        Self {
            log_transitions: config.log_transitions,
            trace: Some(trace),
            ..Self::with_policy(name, initial_state, config.dispatch_policy)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state. Lock-free; around a racing `set_enabled` it returns either the
    /// previous or the new value.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        self.policy
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().list.len()
    }

    /// Append an observer and immediately notify it of the current state.
    ///
    /// The replayed value is read together with the append, so it is never older than
    /// a transition the observer is later notified of. If a transition committed after
    /// the append reaches the observer first, the now stale replay is skipped.
    ///
    /// # Errors
    ///
    /// With `DispatchPolicy::Propagate`, returns `FlagError::SubscriberPanicked` if the
    /// observer panics during the replay. The observer stays subscribed.
    pub fn add_subscriber(&self, observer: Arc<dyn FlagObserver>) -> Result<(), FlagError> {
        let subscription = Arc::new(Subscription::new(observer));

        let (index, generation, current) = {
            let mut subscribers = self.subscribers();
            subscribers.list.push(subscription.clone());
            (
                subscribers.list.len() - 1,
                subscribers.generation,
                self.enabled.load(Ordering::Acquire),
            )
        };

        debug!(flag = %self.name, index, "subscriber added");

        self.deliver(index, &subscription, generation, current)
    }

    /// Detach a previously added observer. Returns `false` if it was not subscribed.
    ///
    /// A notification pass already in progress works on a snapshot of the subscriber
    /// list and may still reach the removed observer once.
    pub fn remove_subscriber(&self, observer: &Arc<dyn FlagObserver>) -> bool {
        let mut subscribers = self.subscribers();

        match subscribers
            .list
            .iter()
            .position(|s| same_observer(&s.observer, observer))
        {
            Some(index) => {
                subscribers.list.remove(index);
                debug!(flag = %self.name, index, "subscriber removed");
                true
            }
            None => false,
        }
    }

    /// Commit a new state and notify every observer, in subscription order.
    ///
    /// Returns `Ok(true)` if a transition was committed, `Ok(false)` if the flag already
    /// had this state (no observer is notified).
    ///
    /// Observers run on the calling thread, after the commit lock is released. When
    /// another thread is still delivering an earlier value to the same observer, the
    /// new value is queued for that thread instead. Each observer sees values in
    /// commit order, possibly skipping ones already superseded, and the last value it
    /// receives is the last committed state.
    ///
    /// # Errors
    ///
    /// With `DispatchPolicy::Propagate`, returns `FlagError::SubscriberPanicked` for the
    /// first observer that panics. The remaining observers are skipped. The new state
    /// stays committed, and the transition is still logged and traced.
    pub fn set_enabled(&self, new_state: bool) -> Result<bool, FlagError> {
        if self.enabled.load(Ordering::Acquire) == new_state {
            return Ok(false);
        }

        let (generation, snapshot) = {
            let mut subscribers = self.subscribers();

            if self
                .enabled
                .compare_exchange(!new_state, new_state, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // Another caller committed the same state first.
                return Ok(false);
            }

            subscribers.generation += 1;
            (subscribers.generation, subscribers.list.clone())
        };

        let mut notified: usize = 0;
        let mut failure = None;
        for (index, subscription) in snapshot.iter().enumerate() {
            notified += 1;
            if let Err(e) = self.deliver(index, subscription, generation, new_state) {
                failure = Some(e);
                break;
            }
        }

        if self.log_transitions {
            info!(flag = %self.name, enabled = new_state, notified, "flag transition");
        }

        self.emit(FlagEvent::Transition {
            name: self.name.clone(),
            enabled: new_state,
            notified,
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Offer `enabled` at `generation` to one subscription and drain its mailbox if no
    /// other thread is doing so.
    fn deliver(
        &self,
        index: usize,
        subscription: &Subscription,
        generation: u64,
        enabled: bool,
    ) -> Result<(), FlagError> {
        {
            let mut mailbox = subscription.mailbox();
            if mailbox.newest().is_some_and(|newest| newest >= generation) {
                return Ok(());
            }
            mailbox.pending = Some((generation, enabled));
            if mailbox.draining {
                return Ok(());
            }
            mailbox.draining = true;
        }

        let mut failure = None;
        loop {
            let next = {
                let mut mailbox = subscription.mailbox();
                match mailbox.pending.take() {
                    Some((generation, enabled)) => {
                        mailbox.delivered = Some(generation);
                        enabled
                    }
                    None => {
                        mailbox.draining = false;
                        break;
                    }
                }
            };

            // Values queued by other threads are still delivered after a failure.
            if let Err(e) = self.invoke(index, &subscription.observer, next) {
                failure.get_or_insert(e);
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn invoke(
        &self,
        index: usize,
        observer: &Arc<dyn FlagObserver>,
        enabled: bool,
    ) -> Result<(), FlagError> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            observer.on_flag_changed(&self.name, enabled)
        }));

        let Err(payload) = outcome else {
            return Ok(());
        };

        let message = panic_message(payload.as_ref());
        error!(flag = %self.name, index, %message, "flag observer panicked");

        self.emit(FlagEvent::SubscriberFailed {
            name: self.name.clone(),
            index,
        });

        match self.policy {
            DispatchPolicy::Isolate => Ok(()),
            DispatchPolicy::Propagate => Err(FlagError::SubscriberPanicked {
                name: self.name.clone(),
                index,
                message,
            }),
        }
    }

    fn emit(&self, event: FlagEvent) {
        if let Some(trace) = &self.trace {
            trace.emit(&event);
        }
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .field("subscribers", &self.subscriber_count())
            .field("policy", &self.policy)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
