//! Authentication coordination.
//!
//! This module provides:
//! - Single-flight token refresh coordination
//! - Session management (login, logout, cached user profile)

mod refresh;
mod session;

pub use refresh::{RefreshCoordinator, RefreshLease, RefreshOutcome, RefreshState, RefreshTurn, RefreshWaiter};
pub use session::SessionService;
