//! Authenticated request gateway.
//!
//! Every outbound call goes through [`AuthenticatedGateway::send`], which
//! attaches the stored access token and transparently recovers from one
//! expired token per request:
//!
//! 1. dispatch with the stored token;
//! 2. on 401, obtain a fresh token through the [`RefreshCoordinator`]
//!    (one refresh call no matter how many requests fail together);
//! 3. dispatch once more with the fresh token; a second 401 is terminal.
//!
//! Terminal failures clear the credential store and redirect to login before
//! any caller sees the error.

use std::sync::Arc;

use backoffice_domain::{ApiRequest, ApiResponse, CredentialKey, token_preview};
use tracing::{debug, info, warn};

use crate::auth::{RefreshCoordinator, RefreshOutcome, RefreshState, RefreshTurn};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult, SessionExpiredReason};
use crate::ports::{CredentialStore, HttpClient, IdentityProvider, Navigator};

/// Wraps the transport with bearer authentication and single-flight refresh.
///
/// # Example
///
/// ```ignore
/// let gateway = AuthenticatedGateway::new(http, credentials, identity, navigator);
/// let response = gateway.send(ApiRequest::get("/settlements/pending")).await?;
/// ```
pub struct AuthenticatedGateway {
    http: Arc<dyn HttpClient>,
    credentials: Arc<dyn CredentialStore>,
    identity: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshCoordinator,
    config: GatewayConfig,
}

impl AuthenticatedGateway {
    /// Creates a gateway with the default configuration.
    pub fn new(
        http: Arc<dyn HttpClient>,
        credentials: Arc<dyn CredentialStore>,
        identity: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http,
            credentials,
            identity,
            navigator,
            refresh: RefreshCoordinator::new(),
            config: GatewayConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the state of the refresh protocol.
    #[must_use]
    pub fn refresh_state(&self) -> RefreshState {
        self.refresh.state()
    }

    /// Sends a request with the stored bearer credential.
    ///
    /// Non-401 responses, error statuses included, are returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Transport`] if no response was received.
    /// - [`GatewayError::SessionExpired`] if the token could not be refreshed.
    /// - [`GatewayError::Unauthorized`] if the request was rejected again
    ///   after a successful refresh.
    pub async fn send(&self, mut request: ApiRequest) -> GatewayResult<ApiResponse> {
        if let Some(token) = self.credentials.get(CredentialKey::AccessToken).await? {
            request.set_bearer(&token);
        }

        let response = self.dispatch(&request, false).await?;
        if !response.status.is_unauthorized() {
            return Ok(response);
        }

        // The retry marker is this second dispatch; there is no third.
        let token = self.fresh_access_token(&request).await?;
        request.set_bearer(&token);

        let response = self.dispatch(&request, true).await?;
        if response.status.is_unauthorized() {
            warn!(
                request_id = %request.id,
                target = %request.target,
                "request rejected again after token refresh"
            );
            self.end_session().await;
            return Err(GatewayError::Unauthorized);
        }

        Ok(response)
    }

    async fn dispatch(&self, request: &ApiRequest, retry: bool) -> GatewayResult<ApiResponse> {
        debug!(
            request_id = %request.id,
            method = %request.method,
            target = %request.target,
            retry,
            "dispatching request"
        );
        let response = self.http.execute(request).await?;
        debug!(
            request_id = %request.id,
            status = response.status.as_u16(),
            elapsed_ms = response.duration.as_millis(),
            "response received"
        );
        Ok(response)
    }

    /// Leads a refresh or waits for the one in flight.
    async fn fresh_access_token(&self, request: &ApiRequest) -> RefreshOutcome {
        match self.refresh.begin() {
            RefreshTurn::Follow(waiter) => {
                debug!(request_id = %request.id, "waiting for in-flight token refresh");
                waiter.wait().await
            }
            RefreshTurn::Lead(lease) => {
                debug!(request_id = %request.id, "starting token refresh");
                let outcome = self.refresh_tokens().await;
                if outcome.as_ref().is_err_and(GatewayError::ends_session) {
                    // Tear down before anyone, queued callers included, sees the failure.
                    self.end_session().await;
                }
                let released = lease.settle(&outcome);
                debug!(released, ok = outcome.is_ok(), "token refresh settled");
                outcome
            }
        }
    }

    async fn refresh_tokens(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.credentials.get(CredentialKey::RefreshToken).await? else {
            warn!("session expired: no refresh token stored");
            return Err(GatewayError::SessionExpired(
                SessionExpiredReason::MissingRefreshToken,
            ));
        };

        let exchange = self.identity.refresh(&refresh_token);
        let result = match self.config.refresh_timeout {
            Some(limit) => match tokio::time::timeout(limit, exchange).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis(), "session expired: token refresh timed out");
                    return Err(GatewayError::SessionExpired(SessionExpiredReason::TimedOut));
                }
            },
            None => exchange.await,
        };

        let grant = result.map_err(|e| {
            warn!(error = %e, "session expired: token refresh failed");
            GatewayError::SessionExpired(e.into())
        })?;

        self.credentials.store_pair(&grant.credentials).await?;
        info!(
            access_token = %token_preview(grant.access_token()),
            expires_in = grant.seconds_until_expiry(),
            "access token refreshed"
        );
        Ok(grant.credentials.access_token)
    }

    /// Clears every credential and redirects to login.
    async fn end_session(&self) {
        for key in CredentialKey::ALL {
            if let Err(e) = self.credentials.remove(key).await {
                warn!(%key, error = %e, "failed to clear credential");
            }
        }
        self.navigator.redirect_to_login();
    }
}

impl std::fmt::Debug for AuthenticatedGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedGateway")
            .field("refresh", &self.refresh)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::{HttpClientError, IdentityError};
    use crate::test_support::{
        CountingNavigator, MemoryStore, RefreshScript, ScriptedHttp, ScriptedIdentity,
    };
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    struct Harness {
        gateway: Arc<AuthenticatedGateway>,
        http: Arc<ScriptedHttp>,
        store: Arc<MemoryStore>,
        identity: Arc<ScriptedIdentity>,
        navigator: Arc<CountingNavigator>,
    }

    fn harness(
        http: Arc<ScriptedHttp>,
        store: Arc<MemoryStore>,
        identity: Arc<ScriptedIdentity>,
    ) -> Harness {
        let navigator = Arc::new(CountingNavigator::default());
        let gateway = Arc::new(AuthenticatedGateway::new(
            http.clone(),
            store.clone(),
            identity.clone(),
            navigator.clone(),
        ));
        Harness {
            gateway,
            http,
            store,
            identity,
            navigator,
        }
    }

    impl Harness {
        fn assert_session_torn_down(&self) {
            for key in CredentialKey::ALL {
                assert_eq!(self.store.value(key), None, "{key} should be cleared");
            }
        }

        fn spawn_send(&self, target: &str) -> tokio::task::JoinHandle<GatewayResult<ApiResponse>> {
            let gateway = self.gateway.clone();
            let request = ApiRequest::get(target);
            tokio::spawn(async move { gateway.send(request).await })
        }

        async fn until_state(&self, expected: RefreshState) {
            while self.gateway.refresh_state() != expected {
                tokio::task::yield_now().await;
            }
        }
    }

    #[tokio::test]
    async fn test_valid_token_passes_through() {
        let h = harness(
            ScriptedHttp::accepting("T1"),
            MemoryStore::with_session("T1", Some("R1")),
            ScriptedIdentity::new(RefreshScript::Grant("T2", "R2")),
        );

        let response = h.gateway.send(ApiRequest::get("/desks")).await.unwrap();

        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(h.http.dispatches(), vec![("/desks".to_string(), Some("T1".to_string()))]);
        assert_eq!(h.identity.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_request_without_stored_token_is_sent_bare() {
        let h = harness(
            ScriptedHttp::accepting("T1"),
            Arc::new(MemoryStore::default()),
            ScriptedIdentity::new(RefreshScript::Grant("T2", "R2")),
        );

        let err = h.gateway.send(ApiRequest::get("/desks")).await.unwrap_err();

        assert_eq!(h.http.dispatches()[0], ("/desks".to_string(), None));
        assert_eq!(
            err,
            GatewayError::SessionExpired(SessionExpiredReason::MissingRefreshToken)
        );
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_retried_once() {
        let h = harness(
            ScriptedHttp::accepting("T2"),
            MemoryStore::with_session("T1", Some("R1")),
            ScriptedIdentity::new(RefreshScript::Grant("T2", "R2")),
        );

        let response = h.gateway.send(ApiRequest::get("/risk/exposure")).await.unwrap();

        assert!(response.is_success());
        assert_eq!(h.identity.refresh_calls(), 1);
        assert_eq!(h.identity.seen_refresh_tokens(), vec!["R1".to_string()]);
        assert_eq!(
            h.http.dispatches(),
            vec![
                ("/risk/exposure".to_string(), Some("T1".to_string())),
                ("/risk/exposure".to_string(), Some("T2".to_string())),
            ]
        );
        assert_eq!(h.store.value(CredentialKey::AccessToken).as_deref(), Some("T2"));
        assert_eq!(h.store.value(CredentialKey::RefreshToken).as_deref(), Some("R2"));
        assert_eq!(h.navigator.redirects(), 0);
        assert_eq!(h.gateway.refresh_state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_concurrent_failures_share_one_refresh() {
        let (identity, gate) = ScriptedIdentity::gated(RefreshScript::Grant("T2", "R2"));
        let h = harness(
            ScriptedHttp::accepting("T2"),
            MemoryStore::with_session("T1", Some("R1")),
            identity,
        );

        let a = h.spawn_send("/a");
        h.until_state(RefreshState::Refreshing { waiting: 0 }).await;
        let b = h.spawn_send("/b");
        h.until_state(RefreshState::Refreshing { waiting: 1 }).await;
        let c = h.spawn_send("/c");
        h.until_state(RefreshState::Refreshing { waiting: 2 }).await;

        gate.notify_one();

        for handle in [a, b, c] {
            assert!(handle.await.unwrap().unwrap().is_success());
        }
        assert_eq!(h.identity.refresh_calls(), 1);
        assert_eq!(h.http.dispatches_with("T2"), vec!["/a", "/b", "/c"]);
        assert_eq!(h.gateway.refresh_state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_many_concurrent_failures_single_flight() {
        let (identity, gate) = ScriptedIdentity::gated(RefreshScript::Grant("T2", "R2"));
        let h = harness(
            ScriptedHttp::accepting("T2"),
            MemoryStore::with_session("T1", Some("R1")),
            identity,
        );

        let handles: Vec<_> = (0..16).map(|i| h.spawn_send(&format!("/trades/{i}"))).collect();
        h.until_state(RefreshState::Refreshing { waiting: 15 }).await;
        gate.notify_one();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_success());
        }
        assert_eq!(h.identity.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_expires_session() {
        let h = harness(
            ScriptedHttp::accepting("T2"),
            MemoryStore::with_session("T1", None),
            ScriptedIdentity::new(RefreshScript::Grant("T2", "R2")),
        );

        let err = h.gateway.send(ApiRequest::get("/kyc")).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::SessionExpired(SessionExpiredReason::MissingRefreshToken)
        );
        assert_eq!(h.identity.refresh_calls(), 0);
        assert_eq!(h.navigator.redirects(), 1);
        h.assert_session_torn_down();
        assert_eq!(h.gateway.refresh_state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_terminal() {
        let h = harness(
            ScriptedHttp::rejecting_everything(),
            MemoryStore::with_session("T1", Some("R1")),
            ScriptedIdentity::new(RefreshScript::Grant("T2", "R2")),
        );

        let err = h.gateway.send(ApiRequest::get("/audit")).await.unwrap_err();

        assert_eq!(err, GatewayError::Unauthorized);
        assert_eq!(h.identity.refresh_calls(), 1);
        assert_eq!(h.http.dispatches().len(), 2);
        assert_eq!(h.navigator.redirects(), 1);
        h.assert_session_torn_down();
    }

    #[tokio::test]
    async fn test_failed_refresh_rejects_every_waiter_with_same_error() {
        let (identity, gate) = ScriptedIdentity::gated(RefreshScript::Fail(IdentityError::Network(
            "connection reset".into(),
        )));
        let h = harness(
            ScriptedHttp::accepting("T2"),
            MemoryStore::with_session("T1", Some("R1")),
            identity,
        );

        let a = h.spawn_send("/a");
        h.until_state(RefreshState::Refreshing { waiting: 0 }).await;
        let b = h.spawn_send("/b");
        let c = h.spawn_send("/c");
        h.until_state(RefreshState::Refreshing { waiting: 2 }).await;
        gate.notify_one();

        let expected = GatewayError::SessionExpired(SessionExpiredReason::Unreachable(
            "connection reset".into(),
        ));
        for handle in [a, b, c] {
            assert_eq!(handle.await.unwrap().unwrap_err(), expected);
        }
        assert_eq!(h.identity.refresh_calls(), 1);
        assert_eq!(h.navigator.redirects(), 1);
        h.assert_session_torn_down();
    }

    #[tokio::test]
    async fn test_rejected_refresh_token_expires_session() {
        let h = harness(
            ScriptedHttp::accepting("T2"),
            MemoryStore::with_session("T1", Some("R-revoked")),
            ScriptedIdentity::new(RefreshScript::Fail(IdentityError::Rejected {
                status: 401,
                message: "refresh token revoked".into(),
            })),
        );

        let err = h.gateway.send(ApiRequest::get("/partners")).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::SessionExpired(SessionExpiredReason::Rejected(
                "refresh token revoked".into()
            ))
        );
        h.assert_session_torn_down();
        assert_eq!(h.navigator.redirects(), 1);
    }

    #[tokio::test]
    async fn test_unpersisted_refresh_keeps_session() {
        let store = MemoryStore::with_session("T1", Some("R1"));
        store.reject_writes();
        let h = harness(
            ScriptedHttp::accepting("T2"),
            store,
            ScriptedIdentity::new(RefreshScript::Grant("T2", "R2")),
        );

        let err = h.gateway.send(ApiRequest::get("/desks")).await.unwrap_err();

        assert!(matches!(err, GatewayError::CredentialStore(_)));
        assert!(!err.ends_session());
        assert_eq!(h.navigator.redirects(), 0);
        assert_eq!(h.store.value(CredentialKey::RefreshToken).as_deref(), Some("R1"));
        assert_eq!(h.gateway.refresh_state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_transport_errors_pass_through() {
        let h = harness(
            ScriptedHttp::failing_with(HttpClientError::Timeout { timeout_ms: 250 }),
            MemoryStore::with_session("T1", Some("R1")),
            ScriptedIdentity::new(RefreshScript::Grant("T2", "R2")),
        );

        let err = h.gateway.send(ApiRequest::get("/documents")).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::Transport(HttpClientError::Timeout { timeout_ms: 250 })
        );
        assert_eq!(h.identity.refresh_calls(), 0);
        assert_eq!(h.navigator.redirects(), 0);
        assert_eq!(h.store.value(CredentialKey::AccessToken).as_deref(), Some("T1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_timeout_expires_session() {
        let navigator = Arc::new(CountingNavigator::default());
        let store = MemoryStore::with_session("T1", Some("R1"));
        let gateway = AuthenticatedGateway::new(
            ScriptedHttp::accepting("T2"),
            store.clone(),
            ScriptedIdentity::new(RefreshScript::Hang),
            navigator.clone(),
        )
        .with_config(GatewayConfig::new().with_refresh_timeout(Duration::from_secs(5)));

        let err = gateway.send(ApiRequest::get("/settings")).await.unwrap_err();

        assert_eq!(err, GatewayError::SessionExpired(SessionExpiredReason::TimedOut));
        assert_eq!(navigator.redirects(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_leader_releases_waiters() {
        let h = harness(
            ScriptedHttp::accepting("T2"),
            MemoryStore::with_session("T1", Some("R1")),
            ScriptedIdentity::new(RefreshScript::Hang),
        );

        let leader = h.spawn_send("/a");
        h.until_state(RefreshState::Refreshing { waiting: 0 }).await;
        let follower = h.spawn_send("/b");
        h.until_state(RefreshState::Refreshing { waiting: 1 }).await;

        leader.abort();

        assert_eq!(
            follower.await.unwrap().unwrap_err(),
            GatewayError::RefreshAbandoned
        );
        assert_eq!(h.gateway.refresh_state(), RefreshState::Idle);
        assert_eq!(h.navigator.redirects(), 0);
        assert_eq!(h.store.value(CredentialKey::RefreshToken).as_deref(), Some("R1"));
    }
}
