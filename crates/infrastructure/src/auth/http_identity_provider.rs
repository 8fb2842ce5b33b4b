//! Identity provider reached over HTTP.
//!
//! Refresh: `POST {base}{refresh_path}` with `{"refresh_token": ..}`.
//! Login: `POST {base}{login_path}` with `{"username": .., "password": ..}`.
//! Both answer with a token response; login adds the user profile.

use async_trait::async_trait;
use backoffice_application::ports::{IdentityError, IdentityProvider};
use backoffice_domain::{CredentialPair, LoginGrant, TokenGrant, UserProfile};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapters::with_trailing_slash;

/// Where the identity provider's endpoints live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEndpoints {
    /// Refresh endpoint
    pub refresh: Url,
    /// Login endpoint
    pub login: Url,
}

impl IdentityEndpoints {
    /// Builds both endpoints from a base URL and two paths.
    ///
    /// Paths resolve under the base path, as API requests do:
    /// `https://api.example.com/v1` + `/auth/refresh` gives
    /// `https://api.example.com/v1/auth/refresh`.
    ///
    /// # Errors
    ///
    /// Returns an error if a path cannot be joined onto the base URL.
    pub fn new(base: &Url, refresh_path: &str, login_path: &str) -> Result<Self, url::ParseError> {
        let base = with_trailing_slash(base.clone());
        Ok(Self {
            refresh: base.join(refresh_path.trim_start_matches('/'))?,
            login: base.join(login_path.trim_start_matches('/'))?,
        })
    }
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Token response from both endpoints.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default = "default_token_type")]
    token_type: String,
}

impl TokenResponse {
    fn into_grant(self) -> TokenGrant {
        TokenGrant::new(
            CredentialPair::new(self.access_token, self.refresh_token),
            self.token_type,
            self.expires_in,
        )
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(flatten)]
    tokens: TokenResponse,
    user: UserProfile,
}

/// Error body returned on rejection.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default, alias = "message")]
    error_description: Option<String>,
}

/// Identity provider implementation using reqwest.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    http_client: reqwest::Client,
    endpoints: IdentityEndpoints,
}

impl HttpIdentityProvider {
    /// Creates a provider for the given endpoints.
    #[must_use]
    pub fn new(endpoints: IdentityEndpoints) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            endpoints,
        }
    }

    async fn post<B: Serialize + Sync, R: serde::de::DeserializeOwned + Send>(
        &self,
        url: &Url,
        body: &B,
    ) -> Result<R, IdentityError> {
        debug!(%url, "calling identity provider");
        let response = self
            .http_client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&error_text, status.as_u16()),
            });
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))
    }
}

fn rejection_message(error_text: &str, status: u16) -> String {
    match serde_json::from_str::<ErrorResponse>(error_text) {
        Ok(ErrorResponse {
            error_description: Some(description),
            ..
        }) => description,
        Ok(ErrorResponse {
            error: Some(error), ..
        }) => error,
        _ if !error_text.trim().is_empty() => error_text.trim().to_string(),
        _ => format!("identity provider answered {status}"),
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, IdentityError> {
        let response: TokenResponse = self
            .post(&self.endpoints.refresh, &RefreshRequest { refresh_token })
            .await?;
        Ok(response.into_grant())
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, IdentityError> {
        let response: LoginResponse = self
            .post(&self.endpoints.login, &LoginRequest { username, password })
            .await?;
        Ok(LoginGrant {
            grant: response.tokens.into_grant(),
            user: response.user,
        })
    }
}
