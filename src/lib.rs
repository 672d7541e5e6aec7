//! # Flag Observer
//!
//! Notification-oriented feature flags: a flag pushes its state to subscribed
//! observers instead of being polled on every operation.
//!
//! Consumers subscribe once, receive the current state immediately, and then receive
//! each committed transition. They cache whatever decision depends on the flag, so
//! the hot path dispatches directly without re-evaluating any condition.
//!
//! ## Quick Start
//!
//! ```rust
//! use flag_observer::{FlagRegistry, FlagRegistryApi, NotifiedPaymentProcessor};
//!
//! let registry = FlagRegistry::new();
//! registry.create_or_update("payment-v2", false).unwrap();
//!
//! // Subscribing replays `false`: the legacy strategy is cached.
//! let processor = NotifiedPaymentProcessor::new(&registry, "payment-v2").unwrap();
//! assert_eq!(processor.process(100.0), 100.0);
//!
//! // The transition is pushed once; `process` never checks the flag.
//! registry.set_flag_state("payment-v2", true).unwrap();
//! assert_eq!(processor.active_strategy(), "new");
//! ```
//!
//! ## Features
//!
//! - **Thread-safe**: flags and registries can be shared across threads
//! - **Immediate replay**: a new observer always starts from the current state
//! - **Idempotent writes**: setting a flag to its current state notifies nobody
//! - **Failure policy**: observer panics are isolated or propagated per configuration
//! - **Tracing support**: `tracing` log lines plus an optional per-registry callback
//!
//! ## Main Types
//!
//! - [`Flag`] - Named boolean cell that owns notification dispatch
//! - [`FlagRegistry`] - Keyed collection of flags owned by the application
//! - [`FlagRegistryApi`] - Registry operations (create, update, lookup, observe, clear)
//! - [`FlagObserver`] - Capability implemented by anything that reacts to a flag
//! - [`NotifiedPaymentProcessor`] - Consumer caching a strategy per flag state
//! - [`PollingPaymentProcessor`] - Poll-based baseline for comparison

mod config;
mod flag;
mod flag_error;
mod flag_event;
mod observer;
mod payment;
mod polling;
mod registry;
mod registry_trait;

pub use config::{DispatchPolicy, RegistryConfig};
pub use flag::Flag;
pub use flag_error::FlagError;
pub use flag_event::{FlagEvent, TraceCallback, TraceHook};
pub use observer::FlagObserver;
pub use payment::{
    LegacyPaymentStrategy, NewPaymentStrategy, NotifiedPaymentProcessor, PaymentStrategy,
};
pub use polling::{PollingFlagService, PollingPaymentProcessor};
pub use registry::FlagRegistry;
pub use registry_trait::{FlagMap, FlagRegistryApi};
