use thiserror::Error;

/// Errors surfaced by flags and the flag registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// No flag is registered under the requested name.
    #[error("Flag not found in registry: {name}")]
    FlagNotFound { name: String },

    /// An observer panicked and the dispatch policy stopped the notification pass.
    #[error("Subscriber {index} of flag {name} panicked: {message}")]
    SubscriberPanicked {
        name: String,
        index: usize,
        message: String,
    },
}

impl FlagError {
    /// Name of the flag the error refers to.
    pub fn flag_name(&self) -> &str {
        match self {
            FlagError::FlagNotFound { name } => name,
            FlagError::SubscriberPanicked { name, .. } => name,
        }
    }
}
