//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that builds the router with mock
//! providers injected, so whole playthroughs can be driven over HTTP
//! without network access.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use geoquiz_core::{
    config::{DatabaseConfig, GameConfig, ProvidersConfig, ServerConfig},
    testing::{MockCountryFactsProvider, MockLocationProvider},
    Config, CountriesConfig, CountryFactsProvider, GeoDbConfig, LocationProvider,
    ScoreHistoryStore, SqliteScoreHistoryStore,
};

/// Re-export fixtures for test convenience
pub use geoquiz_core::testing::fixtures;

/// Test fixture for API testing with mock providers.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_create_session() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/sessions", json!({})).await;
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock location provider - configure candidate locations
    pub locations: Arc<MockLocationProvider>,
    /// Mock country facts provider - configure country names
    pub facts: Arc<MockCountryFactsProvider>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with the world fixtures loaded.
    pub async fn new() -> Self {
        Self::with_rounds(10).await
    }

    /// Create a test fixture with a custom session length.
    pub async fn with_rounds(rounds_per_session: u32) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        // Create mocks
        let locations = Arc::new(MockLocationProvider::new());
        locations.set_pool(fixtures::world_locations()).await;
        let facts = Arc::new(MockCountryFactsProvider::new());
        facts.set_countries(fixtures::world_facts()).await;

        // Create config
        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                ..ServerConfig::default()
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            game: GameConfig {
                rounds_per_session,
                seed: Some(7),
                ..GameConfig::default()
            },
            providers: ProvidersConfig {
                geodb: GeoDbConfig {
                    api_key: "test-key".to_string(),
                    base_url: None,
                    host: None,
                    timeout_secs: 5,
                },
                countries: CountriesConfig::default(),
            },
        };

        let history: Arc<dyn ScoreHistoryStore> = Arc::new(
            SqliteScoreHistoryStore::new(&db_path).expect("Failed to create history store"),
        );

        let state = Arc::new(geoquiz_server::state::AppState::new(
            config,
            history,
            Arc::clone(&locations) as Arc<dyn LocationProvider>,
            Arc::clone(&facts) as Arc<dyn CountryFactsProvider>,
        ));

        // Create router
        let router = geoquiz_server::api::create_router(state);

        Self {
            router,
            locations,
            facts,
            temp_dir,
        }
    }

    /// Create a session and return its id.
    pub async fn create_session(&self) -> String {
        let response = self.post("/api/v1/sessions", Value::Null).await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"]
            .as_str()
            .expect("session id in response")
            .to_string()
    }

    /// Common name of the country in the most recently acquired round.
    pub async fn current_answer(&self) -> String {
        let codes = self.facts.requested_codes().await;
        let code = codes.last().expect("no round acquired yet");
        fixtures::common_name(code)
            .expect("round country is in the fixture set")
            .to_string()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body (`Value::Null` sends no body).
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let body = if body.is_null() { None } else { Some(body) };
        self.request("POST", path, body).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Fetch the raw text of a response (for non-JSON endpoints).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
