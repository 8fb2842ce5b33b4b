//! Single-flight coordination of token refreshes.
//!
//! The first caller that needs a refresh while the coordinator is idle gets a
//! [`RefreshLease`] and performs the refresh. Everyone arriving while it is in
//! flight gets a [`RefreshWaiter`] and is released, in arrival order, with the
//! lease holder's outcome.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};

/// Outcome shared with every queued caller: the new access token or the error.
pub type RefreshOutcome = GatewayResult<String>;

/// Observable state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// No refresh in flight.
    Idle,
    /// A refresh is in flight.
    Refreshing {
        /// Number of callers queued behind it.
        waiting: usize,
    },
}

impl RefreshState {
    /// Returns true while a refresh is in flight.
    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        matches!(self, Self::Refreshing { .. })
    }
}

enum Slot {
    Idle,
    Refreshing {
        waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
    },
}

/// Owns the `idle | refreshing` flag and the queue of pending callers.
///
/// One coordinator per gateway; nothing here is global.
pub struct RefreshCoordinator {
    slot: Mutex<Slot>,
}

/// What a caller should do after asking for a refresh.
pub enum RefreshTurn<'a> {
    /// Perform the refresh and settle the lease.
    Lead(RefreshLease<'a>),
    /// Wait for someone else's refresh.
    Follow(RefreshWaiter),
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Idle),
        }
    }

    /// Checks the flag and either takes the lead or joins the queue.
    ///
    /// The check and the transition happen under one lock, so exactly one
    /// caller leads each refresh cycle.
    pub fn begin(&self) -> RefreshTurn<'_> {
        let mut slot = self.slot.lock();
        if let Slot::Refreshing { waiters } = &mut *slot {
            let (tx, rx) = oneshot::channel();
            waiters.push_back(tx);
            debug!(position = waiters.len(), "queued behind in-flight refresh");
            return RefreshTurn::Follow(RefreshWaiter { rx });
        }

        *slot = Slot::Refreshing {
            waiters: VecDeque::new(),
        };
        RefreshTurn::Lead(RefreshLease {
            coordinator: self,
            settled: false,
        })
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> RefreshState {
        match &*self.slot.lock() {
            Slot::Idle => RefreshState::Idle,
            Slot::Refreshing { waiters } => RefreshState::Refreshing {
                waiting: waiters.len(),
            },
        }
    }

    fn settle(&self, outcome: &RefreshOutcome) -> usize {
        let waiters = match std::mem::replace(&mut *self.slot.lock(), Slot::Idle) {
            Slot::Refreshing { waiters } => waiters,
            Slot::Idle => VecDeque::new(),
        };
        let released = waiters.len();
        for waiter in waiters {
            // A waiter whose caller went away has nothing to receive.
            let _ = waiter.send(outcome.clone());
        }
        released
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", &self.state())
            .finish()
    }
}

/// Held by the caller performing the refresh.
///
/// Dropping it unsettled returns the coordinator to idle and fails the queue
/// with [`GatewayError::RefreshAbandoned`].
#[must_use = "an unsettled lease abandons the refresh"]
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Returns to idle and releases every queued caller with `outcome`, in
    /// arrival order. Returns the number of callers released.
    pub fn settle(mut self, outcome: &RefreshOutcome) -> usize {
        self.settled = true;
        self.coordinator.settle(outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let released = self
                .coordinator
                .settle(&Err(GatewayError::RefreshAbandoned));
            warn!(released, "token refresh abandoned before it settled");
        }
    }
}

/// Held by a caller queued behind an in-flight refresh.
#[derive(Debug)]
pub struct RefreshWaiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshWaiter {
    /// Waits for the in-flight refresh to settle.
    pub async fn wait(self) -> RefreshOutcome {
        self.rx
            .await
            .unwrap_or(Err(GatewayError::RefreshAbandoned))
    }
}
