//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! It carries every call the gateway makes against the back-office API.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoffice_application::ports::{HttpClient, HttpClientError};
use backoffice_domain::{ApiRequest, ApiResponse, HttpMethod};
use reqwest::{Client, Method, Url};

/// HTTP client implementation using reqwest.
///
/// Relative request targets are resolved against `base_url`.
pub struct ReqwestHttpClient {
    client: Client,
    base_url: Url,
    default_timeout: Duration,
}

impl ReqwestHttpClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// Default configuration:
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled
    /// - User-Agent: "backoffice/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(base_url: Url, default_timeout: Duration) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(concat!("backoffice/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self::with_client(client, base_url, default_timeout))
    }

    /// Creates a client around a preconfigured reqwest client.
    #[must_use]
    pub fn with_client(client: Client, base_url: Url, default_timeout: Duration) -> Self {
        Self {
            client,
            base_url: with_trailing_slash(base_url),
            default_timeout,
        }
    }

    /// Turns a request target into an absolute URL.
    fn resolve_url(&self, target: &str) -> Result<Url, HttpClientError> {
        if target.starts_with("http://") || target.starts_with("https://") {
            return Url::parse(target)
                .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {target}")));
        }
        self.base_url
            .join(target.trim_start_matches('/'))
            .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {target}")))
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Maps reqwest errors to `HttpClientError`.
    fn map_error(error: &reqwest::Error, timeout: Duration) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }

        let host = || {
            error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_connect() {
            let message = error.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return HttpClientError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lowered.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        HttpClientError::Other(error.to_string())
    }
}

/// Makes `url` a directory so relative joins keep its path.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError> {
        let url = self.resolve_url(&request.target)?;
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(timeout);

        for header in request.headers.iter() {
            builder = builder.header(&header.name, &header.value);
        }

        if let Some(content_type) = request.body.content_type() {
            if !request.headers.contains("content-type") {
                builder = builder.header("Content-Type", content_type);
            }
            builder = builder.body(request.body.to_bytes());
        }

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpClientError::Other(format!("Failed to read body: {e}")))?
            .to_vec();

        Ok(ApiResponse::new(status, headers, body, start.elapsed()))
    }
}
