//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use tower::ServiceExt;

use relaycast_api::router::build_router;
use relaycast_api::state::AppState;
use relaycast_core::config::AppConfig;
use relaycast_relay::RelayEngine;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// The relay engine behind the router
    pub engine: Arc<RelayEngine>,
}

impl TestApp {
    /// Create a new test application with default configuration
    pub fn new() -> Self {
        let config = Arc::new(AppConfig::default());
        let engine = Arc::new(RelayEngine::new(config.relay.clone()));
        let router = build_router(AppState {
            config,
            engine: Arc::clone(&engine),
        });

        Self { router, engine }
    }

    /// Issue a GET request against the router, returning status and body text
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(path)
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }
}
