//! Payment processing driven by a notification-oriented flag.
//!
//! The processor decides which strategy to use only when its flag notifies it. Every
//! `process` call then dispatches straight through the cached strategy without looking
//! at the flag.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::{Flag, FlagError, FlagObserver, FlagRegistryApi};

/// A way of processing a payment amount.
pub trait PaymentStrategy: Send + Sync {
    /// Process `amount` and return the settled amount.
    fn process(&self, amount: f64) -> f64;

    fn name(&self) -> &'static str;
}

/// Legacy processing: settles the amount unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyPaymentStrategy;

impl PaymentStrategy for LegacyPaymentStrategy {
    fn process(&self, amount: f64) -> f64 {
        amount * 1.00
    }

    fn name(&self) -> &'static str {
        "legacy"
    }
}

/// New processing: settles the amount with a 1% surcharge.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewPaymentStrategy;

impl PaymentStrategy for NewPaymentStrategy {
    fn process(&self, amount: f64) -> f64 {
        amount * 1.01
    }

    fn name(&self) -> &'static str {
        "new"
    }
}

// `ArcSwap` needs a sized target.
struct Selected(Arc<dyn PaymentStrategy>);

/// The subscribed half of the processor: owns both variants and the cached choice.
struct StrategySwitch {
    disabled: Arc<Selected>,
    enabled: Arc<Selected>,
    current: ArcSwap<Selected>,
    decisions: AtomicU64,
}

impl StrategySwitch {
    fn new(disabled: Arc<dyn PaymentStrategy>, enabled: Arc<dyn PaymentStrategy>) -> Self {
        let disabled = Arc::new(Selected(disabled));
        Self {
            current: ArcSwap::new(disabled.clone()),
            enabled: Arc::new(Selected(enabled)),
            disabled,
            decisions: AtomicU64::new(0),
        }
    }
}

impl FlagObserver for StrategySwitch {
    fn on_flag_changed(&self, _name: &str, enabled: bool) {
        let selected = if enabled { &self.enabled } else { &self.disabled };
        self.current.store(selected.clone());
        self.decisions.fetch_add(1, Ordering::Relaxed);
    }
}

/// Payment processor that switches strategy when its flag changes.
///
/// Until the first notification arrives the disabled variant is active; construction
/// always triggers the replay, so in practice the cache is initialized before
/// `new` returns. Dropping the processor unsubscribes it from the flag.
///
/// # Examples
///
/// ```
/// use flag_observer::{FlagRegistry, FlagRegistryApi, NotifiedPaymentProcessor};
///
/// let registry = FlagRegistry::new();
/// registry.create_or_update("payment-v2", false).unwrap();
///
/// let processor = NotifiedPaymentProcessor::new(&registry, "payment-v2").unwrap();
/// assert_eq!(processor.active_strategy(), "legacy");
///
/// registry.set_flag_state("payment-v2", true).unwrap();
/// assert_eq!(processor.active_strategy(), "new");
/// assert!((processor.process(100.0) - 101.0).abs() < 1e-9);
/// ```
pub struct NotifiedPaymentProcessor {
    flag: Arc<Flag>,
    switch: Arc<StrategySwitch>,
    observer: Arc<dyn FlagObserver>,
}

impl NotifiedPaymentProcessor {
    /// Subscribe to `flag_name` with the legacy strategy for `false` and the new
    /// strategy for `true`.
    ///
    /// # Errors
    ///
    /// `FlagError::FlagNotFound` if the flag does not exist yet.
    pub fn new<R>(registry: &R, flag_name: &str) -> Result<Self, FlagError>
    where
        R: FlagRegistryApi + ?Sized,
    {
        Self::with_strategies(
            registry,
            flag_name,
            Arc::new(LegacyPaymentStrategy),
            Arc::new(NewPaymentStrategy),
        )
    }

    /// Subscribe to `flag_name` with custom strategies for each flag state.
    pub fn with_strategies<R>(
        registry: &R,
        flag_name: &str,
        disabled: Arc<dyn PaymentStrategy>,
        enabled: Arc<dyn PaymentStrategy>,
    ) -> Result<Self, FlagError>
    where
        R: FlagRegistryApi + ?Sized,
    {
        let switch = Arc::new(StrategySwitch::new(disabled, enabled));
        let observer: Arc<dyn FlagObserver> = switch.clone();
        let flag = registry.observe(flag_name, observer.clone())?;

        Ok(Self {
            flag,
            switch,
            observer,
        })
    }

    /// Process a payment with the cached strategy.
    pub fn process(&self, amount: f64) -> f64 {
        self.switch.current.load().0.process(amount)
    }

    /// Name of the currently cached strategy.
    pub fn active_strategy(&self) -> &'static str {
        self.switch.current.load().0.name()
    }

    /// How many times the processor has selected a strategy. Grows by one per
    /// notification, never per `process` call.
    pub fn decisions(&self) -> u64 {
        self.switch.decisions.load(Ordering::Relaxed)
    }

    pub fn flag_name(&self) -> &str {
        self.flag.name()
    }
}

impl Drop for NotifiedPaymentProcessor {
    fn drop(&mut self) {
        self.flag.remove_subscriber(&self.observer);
    }
}
