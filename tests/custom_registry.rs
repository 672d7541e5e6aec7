//! Integration tests implementing `FlagRegistryApi` by hand.
//!
//! An application can embed flag storage in its own context type and get every
//! registry operation from the trait's default methods. The context here is a
//! process-wide static, which is the application's choice, not the library's.
//!
//! NOTE: All tests use #[serial] because they share the same static context (APP).
//! Running them in parallel would cause interference and non-deterministic failures.

use flag_observer::{
    FlagError, FlagEvent, FlagMap, FlagObserver, FlagRegistryApi, NotifiedPaymentProcessor,
    RegistryConfig, TraceHook,
};
use serial_test::serial;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, RwLock};

// ============================================================================
// Manual Registry Implementation
// ============================================================================

/// Application context owning its flags alongside other state.
struct AppContext {
    flags: FlagMap,
    trace: Arc<TraceHook>,
    config: RegistryConfig,
    service_name: &'static str,
}

impl AppContext {
    fn new(service_name: &'static str) -> Self {
        Self {
            flags: RwLock::new(HashMap::new()),
            trace: Arc::new(TraceHook::new()),
            config: RegistryConfig::new().with_log_transitions(false),
            service_name,
        }
    }
}

impl FlagRegistryApi for AppContext {
    fn trace(&self) -> &Arc<TraceHook> {
        &self.trace
    }

    fn flags(&self) -> &FlagMap {
        &self.flags
    }

    fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

/// Process-wide context for these tests.
static APP: LazyLock<AppContext> = LazyLock::new(|| AppContext::new("checkout-service"));

// ============================================================================
// Tests Using the Manual Implementation
// ============================================================================

#[test]
#[serial]
fn test_basic_create_and_get() -> Result<(), FlagError> {
    APP.clear();

    APP.create_or_update("express-checkout", true)?;
    let flag = APP.get_flag("express-checkout").unwrap();

    assert!(flag.is_enabled());
    assert_eq!(APP.service_name, "checkout-service");
    Ok(())
}

#[test]
#[serial]
fn test_config_applies_to_flags() -> Result<(), FlagError> {
    APP.clear();

    let flag = APP.create_or_update("configured", false)?;
    assert_eq!(flag.dispatch_policy(), APP.config().dispatch_policy);
    Ok(())
}

#[test]
#[serial]
fn test_processor_against_custom_registry() -> Result<(), FlagError> {
    APP.clear();

    APP.create_or_update("payment-v2", false)?;
    let processor = NotifiedPaymentProcessor::new(&*APP, "payment-v2")?;
    assert_eq!(processor.active_strategy(), "legacy");

    APP.set_flag_state("payment-v2", true)?;
    assert_eq!(processor.active_strategy(), "new");
    Ok(())
}

#[test]
#[serial]
fn test_clear_between_tests() -> Result<(), FlagError> {
    APP.clear();
    assert!(APP.is_empty());

    APP.create_or_update("temporary", true)?;
    assert_eq!(APP.len(), 1);

    APP.clear();
    assert!(APP.is_empty());
    Ok(())
}

#[test]
#[serial]
fn test_tracing_on_custom_registry() -> Result<(), FlagError> {
    APP.clear();

    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    APP.set_trace_callback(move |e: &FlagEvent| {
        events_clone.lock().unwrap().push(e.to_string());
    });

    APP.create_or_update("traced", false)?;
    let observer: Arc<dyn FlagObserver> = Arc::new(|_: &str, _: bool| {});
    APP.observe("traced", observer)?;

    APP.clear_trace_callback();

    let captured = events.lock().unwrap();
    assert_eq!(
        *captured,
        vec![
            "create { name: traced, enabled: false }",
            "observe { name: traced, found: true }",
        ]
    );
    Ok(())
}
