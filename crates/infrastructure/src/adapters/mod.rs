//! Infrastructure adapters

mod navigation;
mod reqwest_client;

pub use navigation::{ChannelNavigator, LoggingNavigator, NavigationEvent};
pub use reqwest_client::ReqwestHttpClient;
pub(crate) use reqwest_client::with_trailing_slash;
