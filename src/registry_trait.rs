//! Core trait defining flag registry behavior.
//!
//! This module provides the `FlagRegistryApi` trait with default implementations for
//! creating, updating, looking up, observing and clearing flags.
//!
//! The registry is name-based: each name maps to exactly one live `Flag`. Writing to
//! an existing name routes through `Flag::set_enabled` on the live instance, so
//! subscribers are never lost by replacing the object.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::{Flag, FlagError, FlagEvent, FlagObserver, RegistryConfig, TraceHook};

/// Storage type for the name to flag mapping.
pub type FlagMap = RwLock<HashMap<String, Arc<Flag>>>;

/// Core trait defining flag registry behavior.
///
/// Provides default implementations for all registry operations, requiring only
/// three accessor methods (`flags`, `trace` and `config`) to be implemented.
///
/// Subscriber notification never runs while the map lock is held, so observers may
/// use the registry (for other flags) from inside their callback.
pub trait FlagRegistryApi {
    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Access the trace hook shared with every flag this registry creates.
    fn trace(&self) -> &Arc<TraceHook>;

    /// Set a tracing callback for registry and flag operations.
    ///
    /// The callback is also invoked by flags that were dropped from the registry by
    /// `clear`, since they keep a handle on the same hook.
    fn set_trace_callback(&self, callback: impl Fn(&FlagEvent) + Send + Sync + 'static) {
        self.trace().set(callback);
    }

    /// Clear the tracing callback.
    ///
    /// After calling this, no tracing events will be emitted.
    /// Note: This does not affect registered flags, only the tracing callback.
    fn clear_trace_callback(&self) {
        self.trace().clear();
    }

    /// Convenience wrapper to emit an event using the current callback.
    ///
    /// # Panics
    ///
    /// If the callback itself panics, the panic will propagate to the caller.
    /// No registry lock is held during callback execution.
    fn emit_event(&self, event: &FlagEvent) {
        self.trace().emit(event);
    }

    // -------------------------------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------------------------------

    /// Access the name to flag storage.
    fn flags(&self) -> &FlagMap;

    /// Access the configuration applied to newly created flags.
    fn config(&self) -> &RegistryConfig;

    /// Return the flag registered under `name`, creating it with `initial_state` if
    /// absent.
    ///
    /// Insert-if-absent is decided under the map write lock, so concurrent callers
    /// for the same name always end up with the same `Arc<Flag>`. The losing callers
    /// are treated as updates and go through `set_enabled`.
    fn get_or_create(&self, name: &str, initial_state: bool) -> (Arc<Flag>, bool) {
        let mut map = self.flags().write().unwrap_or_else(|p| p.into_inner());

        if let Some(existing) = map.get(name) {
            return (existing.clone(), false);
        }

        let flag = Arc::new(Flag::from_config(
            name,
            initial_state,
            self.config(),
            self.trace().clone(),
        ));
        map.insert(name.to_string(), flag.clone());
        drop(map);

        debug!(flag = name, enabled = initial_state, "flag created");
        self.emit_event(&FlagEvent::Create {
            name: name.to_string(),
            enabled: initial_state,
        });

        (flag, true)
    }

    /// Create a flag with the given state, or update the live flag if one exists.
    ///
    /// Returns the live flag. Existing subscribers are preserved and notified if
    /// the state changes.
    ///
    /// # Errors
    ///
    /// Only under `DispatchPolicy::Propagate`, when an observer panics during the
    /// update's notification pass.
    fn create_or_update(&self, name: &str, enabled: bool) -> Result<Arc<Flag>, FlagError> {
        let (flag, created) = self.get_or_create(name, enabled);
        if !created {
            flag.set_enabled(enabled)?;
        }
        Ok(flag)
    }

    /// Set the state of a flag, creating a default (`false`) flag first if absent.
    ///
    /// Returns `Ok(true)` if a transition was committed.
    ///
    /// # Errors
    ///
    /// Only under `DispatchPolicy::Propagate`, when an observer panics.
    fn set_flag_state(&self, name: &str, enabled: bool) -> Result<bool, FlagError> {
        let (flag, _) = self.get_or_create(name, false);
        flag.set_enabled(enabled)
    }

    /// Look up a flag by name. Never creates one.
    fn get_flag(&self, name: &str) -> Option<Arc<Flag>> {
        let flag = self
            .flags()
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .cloned();

        self.emit_event(&FlagEvent::Lookup {
            name: name.to_string(),
            found: flag.is_some(),
        });

        flag
    }

    /// Check if a flag is registered under `name`.
    fn contains(&self, name: &str) -> bool {
        self.flags()
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(name)
    }

    /// Subscribe an observer to an existing flag.
    ///
    /// The observer is notified of the current state before this call returns.
    ///
    /// # Errors
    ///
    /// - `FlagError::FlagNotFound` if no flag is registered under `name`; flags must be
    ///   created before they can be observed.
    /// - `FlagError::SubscriberPanicked` under `DispatchPolicy::Propagate` if the
    ///   observer panics during the replay.
    fn observe(&self, name: &str, observer: Arc<dyn FlagObserver>) -> Result<Arc<Flag>, FlagError> {
        let flag = self
            .flags()
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .cloned();

        self.emit_event(&FlagEvent::Observe {
            name: name.to_string(),
            found: flag.is_some(),
        });

        let Some(flag) = flag else {
            warn!(flag = name, "observe on unknown flag");
            return Err(FlagError::FlagNotFound {
                name: name.to_string(),
            });
        };

        flag.add_subscriber(observer)?;
        Ok(flag)
    }

    /// Detach an observer from the flag registered under `name`.
    ///
    /// Returns `false` if the flag or the subscription does not exist.
    fn unobserve(&self, name: &str, observer: &Arc<dyn FlagObserver>) -> bool {
        let flag = self
            .flags()
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .cloned();

        let removed = flag.is_some_and(|f| f.remove_subscriber(observer));

        self.emit_event(&FlagEvent::Unobserve {
            name: name.to_string(),
            removed,
        });

        removed
    }

    /// Names of all registered flags, sorted.
    fn flag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .flags()
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn len(&self) -> usize {
        self.flags()
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all flags from the registry.
    ///
    /// Already-retrieved `Arc<Flag>` handles remain valid and keep their subscribers,
    /// but they are no longer reachable by name; a later `create_or_update` for the
    /// same name creates a new, independent flag.
    fn clear(&self) {
        let dropped = std::mem::take(&mut *self.flags().write().unwrap_or_else(|p| p.into_inner()));

        info!(dropped = dropped.len(), "flag registry cleared");
        self.emit_event(&FlagEvent::Clear {
            dropped: dropped.len(),
        });
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
