//! Gateway configuration

use std::time::Duration;

/// Behavioural knobs of the authenticated gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Upper bound for one refresh call. `None` waits for the identity
    /// provider indefinitely.
    pub refresh_timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Creates the default configuration (no refresh timeout).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            refresh_timeout: None,
        }
    }

    /// Bounds each refresh call; exceeding it expires the session.
    #[must_use]
    pub const fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }
}
