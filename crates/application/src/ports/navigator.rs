//! Navigation port

/// Port for leaving the application when the session cannot be recovered.
///
/// Implementations perform a full navigation to the login screen, not an
/// in-app route change.
pub trait Navigator: Send + Sync {
    /// Sends the user to the login screen.
    fn redirect_to_login(&self);
}
