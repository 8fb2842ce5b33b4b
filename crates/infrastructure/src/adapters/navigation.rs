//! Navigation adapters.
//!
//! Outside a browser there is no page to navigate, so "redirect to login"
//! is either logged or published to whoever hosts the client.

use backoffice_application::ports::Navigator;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Event published when the session ends and the user must log in again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// Navigate to the login screen.
    Login {
        /// Where the login screen lives.
        url: String,
    },
}

/// Logs the redirect and does nothing else.
#[derive(Debug, Clone)]
pub struct LoggingNavigator {
    login_url: String,
}

impl LoggingNavigator {
    /// Creates a navigator for the given login URL.
    #[must_use]
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
        }
    }
}

impl Navigator for LoggingNavigator {
    fn redirect_to_login(&self) {
        info!(url = %self.login_url, "session ended, login required");
    }
}

/// Publishes [`NavigationEvent`]s on a broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    login_url: String,
    tx: broadcast::Sender<NavigationEvent>,
}

impl ChannelNavigator {
    /// Creates a navigator buffering up to `capacity` undelivered events.
    #[must_use]
    pub fn new(login_url: impl Into<String>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            login_url: login_url.into(),
            tx,
        }
    }

    /// Subscribes to navigation events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.tx.subscribe()
    }
}

impl Navigator for ChannelNavigator {
    fn redirect_to_login(&self) {
        let event = NavigationEvent::Login {
            url: self.login_url.clone(),
        };
        if self.tx.send(event).is_err() {
            warn!(url = %self.login_url, "login redirect dropped: no subscribers");
        }
    }
}
