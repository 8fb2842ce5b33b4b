//! Outbound request domain types

mod api_request;
mod body;
mod header;
mod method;

pub use api_request::{AUTHORIZATION, ApiRequest};
pub use body::RequestBody;
pub use header::{Header, Headers};
pub use method::HttpMethod;
