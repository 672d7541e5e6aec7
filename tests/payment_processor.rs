//! Integration tests for the strategy-caching consumer.
//!
//! The processor must route to the variant matching the flag, switch strictly on
//! transitions, and never evaluate a condition inside `process`.

use flag_observer::{
    FlagError, FlagRegistry, FlagRegistryApi, NotifiedPaymentProcessor, PaymentStrategy,
    PollingFlagService, PollingPaymentProcessor,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// Strategy that counts how often it was used.
struct Counting {
    name: &'static str,
    calls: AtomicUsize,
}

impl Counting {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentStrategy for Counting {
    fn process(&self, amount: f64) -> f64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        amount
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[test]
fn test_routes_by_flag_state() -> Result<(), FlagError> {
    let registry = FlagRegistry::new();
    registry.create_or_update("p", false)?;

    let a = Counting::new("a");
    let b = Counting::new("b");
    let processor = NotifiedPaymentProcessor::with_strategies(&registry, "p", a.clone(), b.clone())?;

    for _ in 0..10 {
        processor.process(1.0);
    }
    assert_eq!((a.calls(), b.calls()), (10, 0));

    registry.set_flag_state("p", true)?;
    for _ in 0..10 {
        processor.process(1.0);
    }
    assert_eq!((a.calls(), b.calls()), (10, 10));

    registry.set_flag_state("p", false)?;
    processor.process(1.0);
    assert_eq!((a.calls(), b.calls()), (11, 10));
    assert_eq!(processor.decisions(), 3);
    Ok(())
}

#[test]
fn test_end_to_end_scenario() -> Result<(), FlagError> {
    let registry = FlagRegistry::new();
    assert!(registry.is_empty());

    registry.create_or_update("f", false)?;
    let processor = NotifiedPaymentProcessor::new(&registry, "f")?;
    assert_eq!(processor.active_strategy(), "legacy");

    for _ in 0..100 {
        assert_eq!(processor.process(100.0), 100.0);
    }
    assert_eq!(processor.decisions(), 1);

    assert!(registry.set_flag_state("f", true)?);
    assert_eq!(processor.decisions(), 2);
    assert_eq!(processor.active_strategy(), "new");

    for _ in 0..100 {
        assert!((processor.process(100.0) - 101.0).abs() < 1e-9);
    }

    // One decision for the replay, one for the transition; none from 200 calls.
    assert_eq!(processor.decisions(), 2);
    Ok(())
}

#[test]
fn test_polling_baseline_checks_every_call() -> Result<(), FlagError> {
    let service = Arc::new(PollingFlagService::new());
    service.set_flag("f", false);
    let polling = PollingPaymentProcessor::new(service.clone(), "f");

    let registry = FlagRegistry::new();
    registry.create_or_update("f", false)?;
    let notified = NotifiedPaymentProcessor::new(&registry, "f")?;

    for i in 0..200 {
        if i == 100 {
            service.set_flag("f", true);
            registry.set_flag_state("f", true)?;
        }
        let expected = polling.process(100.0);
        assert!((notified.process(100.0) - expected).abs() < 1e-9);
    }

    assert_eq!(service.checks(), 200);
    assert_eq!(notified.decisions(), 2);
    Ok(())
}

#[test]
fn test_processors_are_independent() -> Result<(), FlagError> {
    let registry = FlagRegistry::new();
    registry.create_or_update("one", false)?;
    registry.create_or_update("two", false)?;

    let first = NotifiedPaymentProcessor::new(&registry, "one")?;
    let second = NotifiedPaymentProcessor::new(&registry, "two")?;

    registry.set_flag_state("two", true)?;

    assert_eq!(first.active_strategy(), "legacy");
    assert_eq!(second.active_strategy(), "new");
    Ok(())
}

#[test]
fn test_shared_processor_across_threads() -> Result<(), FlagError> {
    let registry = Arc::new(FlagRegistry::new());
    registry.create_or_update("threads", true)?;
    let processor = Arc::new(NotifiedPaymentProcessor::new(&*registry, "threads")?);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let processor = processor.clone();
            thread::spawn(move || (0..1000).map(|_| processor.process(100.0)).sum::<f64>())
        })
        .collect();

    for handle in handles {
        let total = handle.join().unwrap();
        assert!((total - 101_000.0).abs() < 1e-6);
    }
    assert_eq!(processor.decisions(), 1);
    Ok(())
}

#[test]
fn test_dropped_processor_is_not_notified() -> Result<(), FlagError> {
    let registry = FlagRegistry::new();
    let flag = registry.create_or_update("short-lived", false)?;

    {
        let _processor = NotifiedPaymentProcessor::new(&registry, "short-lived")?;
        assert_eq!(flag.subscriber_count(), 1);
    }

    assert_eq!(flag.subscriber_count(), 0);
    assert!(registry.set_flag_state("short-lived", true)?);
    Ok(())
}
