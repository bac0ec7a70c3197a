//! Registry configuration.

use std::time::Duration;

/// Configuration for a [`ResourceRegistry`](crate::ResourceRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Debug label for the registry.
    pub label: Option<String>,
    /// How long a caller waits for another thread that is constructing a
    /// wrapper for the same resource. `None` waits forever.
    pub wait_timeout: Option<Duration>,
}

impl RegistryConfig {
    /// Default bound on the in-flight wait.
    pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the in-flight wait bound.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Wait for in-flight constructions without a bound.
    pub fn without_wait_timeout(mut self) -> Self {
        self.wait_timeout = None;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            label: None,
            wait_timeout: Some(Self::DEFAULT_WAIT_TIMEOUT),
        }
    }
}
