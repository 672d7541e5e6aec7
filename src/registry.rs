//! The flag registry owned by the application.
//!
//! A `FlagRegistry` is an explicit instance: the top-level assembly creates it, hands
//! it (by reference or as `Arc<FlagRegistry>`) to the components that need flags, and
//! decides when to `clear` or `shutdown` it.
//!
//! # Examples
//!
//! ```
//! use flag_observer::{FlagObserver, FlagRegistry, FlagRegistryApi};
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! let registry = FlagRegistry::new();
//! registry.create_or_update("payment-v2", false).unwrap();
//!
//! let cached = Arc::new(AtomicBool::new(true));
//! let cached_clone = cached.clone();
//! let observer: Arc<dyn FlagObserver> = Arc::new(move |_: &str, enabled: bool| {
//!     cached_clone.store(enabled, Ordering::Release);
//! });
//!
//! registry.observe("payment-v2", observer).unwrap();
//! assert!(!cached.load(Ordering::Acquire));
//!
//! registry.set_flag_state("payment-v2", true).unwrap();
//! assert!(cached.load(Ordering::Acquire));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::registry_trait::FlagMap;
use crate::{FlagRegistryApi, RegistryConfig, TraceHook};

/// Thread-safe keyed collection of flags.
pub struct FlagRegistry {
    flags: FlagMap,
    trace: Arc<TraceHook>,
    config: RegistryConfig,
}

impl FlagRegistry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry whose flags use `config`.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            flags: RwLock::new(HashMap::new()),
            trace: Arc::new(TraceHook::new()),
            config,
        }
    }

    /// Tear the registry down: drop every flag and the tracing callback.
    ///
    /// Flags still held elsewhere stay usable but are detached from the registry and
    /// no longer report trace events.
    pub fn shutdown(self) {
        let count = self.len();
        self.clear_trace_callback();
        self.clear();
        info!(flags = count, "flag registry shut down");
    }
}

impl FlagRegistryApi for FlagRegistry {
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

impl Default for FlagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FlagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagRegistry")
            .field("flags", &self.flag_names())
            .field("config", &self.config)
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
