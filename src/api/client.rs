//! Authenticated API client.
//!
//! `ApiClient` composes the credential store, the renewal coordinator,
//! and the request executor into the call every feature module actually
//! makes: "fetch this path with a valid session". An expired credential
//! is recovered through exactly one renewal and one retry; anything
//! beyond that tears the session down.
//!
//! Clients built from the same [`SessionContext`] share one in-flight
//! renewal, no matter how many of them the host constructs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::request::{RequestExecutor, RequestOptions};
use crate::api::ApiError;
use crate::auth::{
    CredentialStore, Navigator, ReadyGate, RenewalCoordinator, SessionContext, SessionTerminator,
};
use crate::config::Config;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct ApiClient {
    executor: RequestExecutor,
    store: CredentialStore,
    renewal: RenewalCoordinator,
    terminator: SessionTerminator,
    ready: ReadyGate,
}

impl ApiClient {
    /// Build a client against `config`, sharing `ctx` with every other
    /// client in the same session.
    pub fn new(config: &Config, ctx: SessionContext, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let store = CredentialStore::new(ctx.clone(), config.storage_path()?)?;
        let terminator = SessionTerminator::new(
            ctx.clone(),
            store.clone(),
            navigator,
            config.login_path.clone(),
        );
        let renewal = RenewalCoordinator::new(
            ctx,
            store.clone(),
            terminator.clone(),
            http.clone(),
            &config.api_origin,
        );
        let executor = RequestExecutor::new(http, config.api_origin.clone());

        Ok(Self {
            executor,
            store,
            renewal,
            terminator,
            ready: ReadyGate::immediate(),
        })
    }

    /// Delay the first credential read until the host's bootstrap finishes.
    pub fn with_ready_gate(mut self, ready: ReadyGate) -> Self {
        self.ready = ready;
        self
    }

    /// Credential store backing this client, for seeding the refresh token
    /// after interactive login.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Fetch `path` with a valid session and parse the JSON body.
    ///
    /// Every failure resolves to `None`: authentication failures have
    /// already torn the session down and redirected by the time this
    /// returns, and a malformed body is not worth more than a log line.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Option<T> {
        match self.try_fetch(path, &options).await {
            Ok(body) => Some(body),
            Err(ApiError::NoSession) => {
                debug!(path = path, "No session available, skipping request");
                None
            }
            Err(e) => {
                warn!(path = path, error = %e, "Authenticated request failed");
                None
            }
        }
    }

    /// Typed variant of [`fetch`](Self::fetch) for callers (and tests)
    /// that need to distinguish the failure modes.
    pub async fn try_fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let response = self.authorized_response(path, options).await?;
        response.json().await.map_err(ApiError::MalformedResponse)
    }

    /// The attempt/renew/retry state machine, one explicit step at a time.
    ///
    /// Exactly one retry: a first attempt, then at most one renewal
    /// followed by one more attempt, then a terminal verdict. Never a loop.
    async fn authorized_response(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response, ApiError> {
        self.ready.wait().await;

        // Acquire: the cached token, or whatever one shared renewal yields.
        let token = match self.store.access_token() {
            Some(token) => token,
            None => self.renewal.renew().await.ok_or(ApiError::NoSession)?,
        };

        // First attempt.
        let response = self.executor.execute(path, options, Some(&token)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // Unauthorized: the credential is stale. Invalidate it, renew
        // once, retry once.
        debug!(path = path, "Request unauthorized, renewing credential");
        self.store.clear_access_token();
        let token = self.renewal.renew().await.ok_or(ApiError::NoSession)?;

        let response = self.executor.execute(path, options, Some(&token)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            // Renewal succeeded but the API still refuses the credential;
            // the session is unrecoverable.
            warn!(path = path, "Still unauthorized after renewal, ending session");
            self.terminator.force_logout();
            return Err(ApiError::Unauthorized);
        }
        Ok(response)
    }

    // ===== Convenience wrappers =====

    /// GET `path` and parse the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        self.fetch(path, RequestOptions::get()).await
    }

    /// POST `body` as JSON to `path` and parse the JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Option<T> {
        match serde_json::to_value(body) {
            Ok(value) => self.fetch(path, RequestOptions::post(value)).await,
            Err(e) => {
                warn!(path = path, error = %e, "Failed to serialize request body");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::{ApiError, RequestOptions};
    use crate::testutil::{stack, stack_at};
    use futures::future::join_all;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Inventory {
        items: Vec<String>,
    }

    #[tokio::test]
    async fn test_cached_credential_is_used_directly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock"))
            .and(header("Authorization", "Bearer cached"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "items": ["alpha"] })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let stack = stack(&server.uri());
        stack.store.set_access_token("cached".to_string());

        let body: Option<Inventory> = stack.client.get("/stock").await;
        assert_eq!(
            body,
            Some(Inventory {
                items: vec!["alpha".to_string()]
            })
        );
    }

    #[tokio::test]
    async fn test_missing_credential_renews_before_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "a2",
                "refreshToken": "r2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stock"))
            .and(header("Authorization", "Bearer a2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "items": ["alpha"] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let stack = stack(&server.uri());
        stack.store.set_refresh_token("r1").expect("seed");

        let body: Option<Inventory> = stack.client.get("/stock").await;
        assert!(body.is_some());
        assert_eq!(stack.store.refresh_token().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_stale_credential_recovers_with_one_renewal_and_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock"))
            .and(header("Authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "a2",
                "refreshToken": "r2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stock"))
            .and(header("Authorization", "Bearer a2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "items": ["alpha"] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let stack = stack(&server.uri());
        stack.store.set_access_token("stale".to_string());
        stack.store.set_refresh_token("r1").expect("seed");

        let body: Option<Inventory> = stack.client.get("/stock").await;
        assert_eq!(
            body,
            Some(Inventory {
                items: vec!["alpha".to_string()]
            })
        );
    }

    #[tokio::test]
    async fn test_persistent_unauthorized_retries_exactly_once() {
        let server = MockServer::start().await;
        // Two attempts total, however often the endpoint keeps saying 401.
        Mock::given(method("GET"))
            .and(path("/stock"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "a2",
                "refreshToken": "r2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stack = stack(&server.uri());
        stack.store.set_access_token("stale".to_string());
        stack.store.set_refresh_token("r1").expect("seed");

        let body: Option<Inventory> = stack.client.get("/stock").await;
        assert!(body.is_none());

        // Unrecoverable: session gone, user on the login surface.
        assert!(stack.store.refresh_token().is_none());
        assert_eq!(stack.navigator.visits(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn test_no_credentials_makes_no_api_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let stack = stack(&server.uri());
        let body: Option<Inventory> = stack.client.get("/stock").await;

        assert!(body.is_none());
        assert_eq!(stack.navigator.visits(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn test_no_credentials_on_login_surface_stays_put() {
        let server = MockServer::start().await;
        let stack = stack_at(&server.uri(), "/login");

        let body: Option<Inventory> = stack.client.get("/stock").await;
        assert!(body.is_none());
        assert!(stack.navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_absent_without_teardown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(2)
            .mount(&server)
            .await;

        let stack = stack(&server.uri());
        stack.store.set_access_token("cached".to_string());
        stack.store.set_refresh_token("r1").expect("seed");

        let body: Option<Inventory> = stack.client.get("/stock").await;
        assert!(body.is_none());

        let result: Result<Inventory, ApiError> =
            stack.client.try_fetch("/stock", &RequestOptions::get()).await;
        assert!(matches!(result, Err(ApiError::MalformedResponse(_))));

        // Not an authentication failure: the session survives untouched.
        assert_eq!(stack.store.refresh_token().as_deref(), Some("r1"));
        assert!(stack.navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn test_ready_gate_defers_first_credential_read() {
        use crate::auth::{Navigator, ReadyGate, SessionContext};
        use crate::config::Config;
        use crate::testutil::RecordingNavigator;
        use futures::FutureExt;
        use std::sync::Arc;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock"))
            .and(header("Authorization", "Bearer boot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let storage = tempfile::TempDir::new().expect("tempdir");
        let config = Config {
            api_origin: server.uri(),
            login_path: "/login".to_string(),
            storage_dir: Some(storage.path().to_path_buf()),
        };
        let ctx = SessionContext::new();
        let navigator = RecordingNavigator::at("/dashboard");
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let client = super::ApiClient::new(&config, ctx.clone(), navigator as Arc<dyn Navigator>)
            .expect("client")
            .with_ready_gate(ReadyGate::new(async move {
                let _ = rx.await;
            }));

        let fetch = client.get::<Inventory>("/stock");
        futures::pin_mut!(fetch);
        // Nothing proceeds, not even the credential read, until bootstrap ends.
        assert!(fetch.as_mut().now_or_never().is_none());

        ctx.set_access_token(Some("boot".to_string()));
        tx.send(()).expect("open gate");

        let body = fetch.await;
        assert_eq!(body, Some(Inventory { items: vec![] }));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_renewal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "accessToken": "a2", "refreshToken": "r2" }))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stock"))
            .and(header("Authorization", "Bearer a2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "items": ["alpha"] })),
            )
            .expect(4)
            .mount(&server)
            .await;

        let stack = stack(&server.uri());
        stack.store.set_refresh_token("r1").expect("seed");

        let bodies: Vec<Option<Inventory>> =
            join_all((0..4).map(|_| stack.client.get("/stock"))).await;
        assert!(bodies.iter().all(|b| b.is_some()));
        assert_eq!(stack.store.refresh_token().as_deref(), Some("r2"));
    }
}
