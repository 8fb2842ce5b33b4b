//! In-process doubles for the ports, shared by the unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backoffice_domain::{
    ApiRequest, ApiResponse, CredentialKey, CredentialPair, LoginGrant, TokenGrant, UserProfile,
};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::ports::{
    CredentialStore, CredentialStoreError, HttpClient, HttpClientError, IdentityError,
    IdentityProvider, Navigator,
};

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<CredentialKey, String>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn with_session(access: &str, refresh: Option<&str>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut values = store.values.lock();
            values.insert(CredentialKey::AccessToken, access.to_string());
            values.insert(CredentialKey::User, r#"{"id":"u-1","email":"ops@example.com"}"#.into());
            if let Some(refresh) = refresh {
                values.insert(CredentialKey::RefreshToken, refresh.to_string());
            }
        }
        Arc::new(store)
    }

    pub fn value(&self, key: CredentialKey) -> Option<String> {
        self.values.lock().get(&key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    /// Makes every later `set` fail; reads and removals keep working.
    pub fn reject_writes(&self) {
        self.reject_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialStoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(CredentialStoreError::Io(std::io::Error::other("disk full")));
        }
        self.values.lock().insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError> {
        self.values.lock().remove(&key);
        Ok(())
    }
}

/// Answers 200 when the bearer matches the accepted token, 401 otherwise.
pub struct ScriptedHttp {
    accepted: Mutex<Option<String>>,
    transport_failure: Mutex<Option<HttpClientError>>,
    log: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedHttp {
    pub fn accepting(token: &str) -> Arc<Self> {
        Arc::new(Self {
            accepted: Mutex::new(Some(token.to_string())),
            transport_failure: Mutex::new(None),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn rejecting_everything() -> Arc<Self> {
        Arc::new(Self {
            accepted: Mutex::new(None),
            transport_failure: Mutex::new(None),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_with(error: HttpClientError) -> Arc<Self> {
        let http = Self::rejecting_everything();
        *http.transport_failure.lock() = Some(error);
        http
    }

    /// `(target, bearer)` for every dispatch, in dispatch order.
    pub fn dispatches(&self) -> Vec<(String, Option<String>)> {
        self.log.lock().clone()
    }

    pub fn dispatches_with(&self, token: &str) -> Vec<String> {
        self.dispatches()
            .into_iter()
            .filter(|(_, bearer)| bearer.as_deref() == Some(token))
            .map(|(target, _)| target)
            .collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError> {
        let bearer = request.bearer().map(String::from);
        self.log.lock().push((request.target.clone(), bearer.clone()));

        if let Some(error) = self.transport_failure.lock().clone() {
            return Err(error);
        }

        let accepted = self.accepted.lock().clone();
        let status = if accepted.is_some() && bearer == accepted {
            200
        } else {
            401
        };
        Ok(ApiResponse::new(
            status,
            HashMap::new(),
            request.target.clone().into_bytes(),
            Duration::from_millis(1),
        ))
    }
}

pub enum RefreshScript {
    Grant(&'static str, &'static str),
    Fail(IdentityError),
    Hang,
}

pub struct ScriptedIdentity {
    script: RefreshScript,
    gate: Option<Arc<Notify>>,
    refresh_calls: AtomicUsize,
    seen_refresh_tokens: Mutex<Vec<String>>,
    login_result: Mutex<Option<Result<LoginGrant, IdentityError>>>,
}

impl ScriptedIdentity {
    pub fn new(script: RefreshScript) -> Arc<Self> {
        Arc::new(Self::build(script, None))
    }

    /// Refreshes block until the returned `Notify` is signalled.
    pub fn gated(script: RefreshScript) -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (Arc::new(Self::build(script, Some(gate.clone()))), gate)
    }

    pub fn with_login(result: Result<LoginGrant, IdentityError>) -> Arc<Self> {
        let identity = Self::build(RefreshScript::Hang, None);
        *identity.login_result.lock() = Some(result);
        Arc::new(identity)
    }

    fn build(script: RefreshScript, gate: Option<Arc<Notify>>) -> Self {
        Self {
            script,
            gate,
            refresh_calls: AtomicUsize::new(0),
            seen_refresh_tokens: Mutex::new(Vec::new()),
            login_result: Mutex::new(None),
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn seen_refresh_tokens(&self) -> Vec<String> {
        self.seen_refresh_tokens.lock().clone()
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, IdentityError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_refresh_tokens.lock().push(refresh_token.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.script {
            RefreshScript::Grant(access, refresh) => Ok(TokenGrant::new(
                CredentialPair::new(*access, *refresh),
                "Bearer",
                Some(900),
            )),
            RefreshScript::Fail(error) => Err(error.clone()),
            RefreshScript::Hang => std::future::pending().await,
        }
    }

    async fn login(&self, _username: &str, _password: &str) -> Result<LoginGrant, IdentityError> {
        self.login_result
            .lock()
            .clone()
            .expect("login not scripted")
    }
}

#[derive(Default)]
pub struct CountingNavigator {
    redirects: AtomicUsize,
}

impl CountingNavigator {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn sample_login() -> LoginGrant {
    LoginGrant {
        grant: TokenGrant::new(CredentialPair::new("T1", "R1"), "Bearer", Some(900)),
        user: UserProfile {
            id: "u-7".into(),
            email: "settlement@example.com".into(),
            name: "Settlement Desk".into(),
            role: "settlement".into(),
        },
    }
}
