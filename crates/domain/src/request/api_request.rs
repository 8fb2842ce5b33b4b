//! Outbound API request descriptor

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Headers, HttpMethod, RequestBody};

/// Name of the header carrying the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";

/// Everything needed to dispatch one call against the back-office API.
///
/// `target` is either a path relative to the configured API base URL
/// (`/settlements/pending`) or an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Identifier used to correlate log lines for one logical call
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Path or absolute URL
    pub target: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// Request body
    #[serde(default)]
    pub body: RequestBody,
    /// Per-request timeout, overriding the transport default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: HttpMethod, target: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            target: target.into(),
            headers: Headers::new(),
            body: RequestBody::None,
            timeout: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, target)
    }

    /// Creates a POST request with the given body.
    #[must_use]
    pub fn post(target: impl Into<String>, body: RequestBody) -> Self {
        Self::new(HttpMethod::Post, target).with_body(body)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, target)
    }

    /// Sets a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches `Authorization: Bearer <token>`, replacing any existing credential.
    pub fn set_bearer(&mut self, token: &str) {
        self.headers.set(AUTHORIZATION, format!("Bearer {token}"));
    }

    /// Returns the bearer token currently attached, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Returns true if `target` is already an absolute URL.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.target.starts_with("http://") || self.target.starts_with("https://")
    }
}
