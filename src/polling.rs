//! Poll-based feature flags, kept as the baseline for comparison.
//!
//! The processor here asks the service for the flag state on every call and branches
//! on the answer, even when the state has not changed since the previous call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::{LegacyPaymentStrategy, NewPaymentStrategy, PaymentStrategy};

/// Name to state map that is queried on every decision.
#[derive(Debug, Default)]
pub struct PollingFlagService {
    flags: RwLock<HashMap<String, bool>>,
    checks: AtomicU64,
}

impl PollingFlagService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flag(&self, name: &str, enabled: bool) {
        self.flags
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(name.to_string(), enabled);
    }

    /// Current state of `name`; unknown flags are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.checks.fetch_add(1, Ordering::Relaxed);
        self.flags
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .copied()
            .unwrap_or(false)
    }

    /// Number of `is_enabled` evaluations so far.
    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }
}

/// Payment processor that re-evaluates its flag on every call.
pub struct PollingPaymentProcessor {
    service: Arc<PollingFlagService>,
    flag_name: String,
    legacy: LegacyPaymentStrategy,
    new: NewPaymentStrategy,
}

impl PollingPaymentProcessor {
    pub fn new(service: Arc<PollingFlagService>, flag_name: impl Into<String>) -> Self {
        Self {
            service,
            flag_name: flag_name.into(),
            legacy: LegacyPaymentStrategy,
            new: NewPaymentStrategy,
        }
    }

    pub fn process(&self, amount: f64) -> f64 {
        if self.service.is_enabled(&self.flag_name) {
            self.new.process(amount)
        } else {
            self.legacy.process(amount)
        }
    }
}
