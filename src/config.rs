//! Registry configuration.

/// What a flag does when one of its observers panics during a notification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// Log the panic, emit `FlagEvent::SubscriberFailed` and keep notifying the
    /// remaining observers.
    #[default]
    Isolate,

    /// Stop the pass at the first panicking observer and return
    /// `FlagError::SubscriberPanicked`. The committed state is not rolled back.
    Propagate,
}

/// Configuration shared by a registry and every flag it creates.
///
/// # Examples
///
/// ```rust
/// use flag_observer::{DispatchPolicy, FlagRegistry, FlagRegistryApi, RegistryConfig};
///
/// let config = RegistryConfig::new()
///     .with_dispatch_policy(DispatchPolicy::Propagate)
///     .with_log_transitions(false);
///
/// let registry = FlagRegistry::with_config(config);
/// assert_eq!(registry.config().dispatch_policy, DispatchPolicy::Propagate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Observer failure handling
    pub dispatch_policy: DispatchPolicy,

    /// Emit an `info` log line for every committed transition
    pub log_transitions: bool,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
        self.dispatch_policy = policy;
        self
    }

    pub fn with_log_transitions(mut self, enabled: bool) -> Self {
        self.log_transitions = enabled;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            dispatch_policy: DispatchPolicy::Isolate,
            log_transitions: true,
        }
    }
}
