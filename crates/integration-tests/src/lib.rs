//! Integration tests for the inflyshop bridge.
//!
//! The router is driven in-process with [`tower::ServiceExt::oneshot`].
//! Shopify and the order-management system are both `wiremock` servers, so
//! no credentials or network access are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p inflyshop-bridge-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use inflyshop_bridge::{
    app,
    config::{BridgeConfig, DownstreamConfig, ShopifyConfig},
    dispatch::{BatchDispatcher, RateGovernor},
    middleware::SHARED_SECRET_HEADER,
    state::AppState,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;
use wiremock::{MockServer, ResponseTemplate};

/// Shared secret the test router accepts.
pub const SECRET: &str = "kX9#mQ2$vL7@pR4!wZ8&nT3*";

/// Path the downstream mock listens on.
pub const DOWNSTREAM_PATH: &str = "/v3_foadmin/index.php";

/// How long background batches get to reach the mocks.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// A router wired to mocked upstream and downstream servers.
pub struct TestContext {
    pub upstream: MockServer,
    pub downstream: MockServer,
    router: Router,
}

impl TestContext {
    /// Start both mock servers and build the router.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    pub async fn new() -> Self {
        let upstream = MockServer::start().await;
        let downstream = MockServer::start().await;

        let config = BridgeConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            shopify: ShopifyConfig {
                shop_url: parse_url(&upstream.uri()),
                api_version: "2021-10".to_string(),
                access_token: SecretString::from("shpat_test"),
                location_id: "3".to_string(),
                api_secret: SecretString::from(SECRET),
            },
            downstream: DownstreamConfig {
                base_url: parse_url(&format!("{}{DOWNSTREAM_PATH}", downstream.uri())),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        // Keep throttling pauses short so low-quota responses don't slow tests.
        let dispatcher =
            BatchDispatcher::new(RateGovernor::new(50, Duration::from_millis(1)));
        let state = AppState::with_dispatcher(config, dispatcher)
            .unwrap_or_else(|e| panic!("failed to build state: {e}"));

        Self {
            upstream,
            downstream,
            router: app(state),
        }
    }

    /// A clone of the router, for tests that need the raw response.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Send a request and return the status and body text.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not UTF-8.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("failed to read body: {e}"));
        let body = String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|e| panic!("body is not UTF-8: {e}"));
        (status, body)
    }

    /// `POST` a JSON body with the shared secret.
    pub async fn post_authorized(&self, uri: &str, body: &Value) -> (StatusCode, String) {
        self.send(post(uri, Some(SECRET), body.to_string())).await
    }

    /// Wait until `server` has received at least `count` requests and
    /// return them as JSON bodies.
    ///
    /// # Panics
    ///
    /// Panics if the requests do not arrive in time.
    pub async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<Value> {
        let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
        loop {
            let received = server.received_requests().await.unwrap_or_default();
            if received.len() >= count {
                return received
                    .iter()
                    .map(|request| serde_json::from_slice(&request.body).unwrap_or(Value::Null))
                    .collect();
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {count} requests, got {}",
                received.len()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Build a `POST` request, optionally carrying the shared secret.
///
/// # Panics
///
/// Panics if the request cannot be built.
pub fn post(uri: &str, secret: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header(SHARED_SECRET_HEADER, secret);
    }
    builder
        .body(body.into())
        .unwrap_or_else(|e| panic!("failed to build request: {e}"))
}

/// A GraphQL response carrying `data` and a reported quota.
#[must_use]
pub fn graphql(data: &Value, available: u32) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": data,
        "extensions": {"cost": {"throttleStatus": {"currentlyAvailable": available}}}
    }))
}

fn parse_url(raw: &str) -> Url {
    Url::parse(raw).unwrap_or_else(|e| panic!("invalid mock url {raw}: {e}"))
}
