//! Integration tests for the HTTP surface.

mod helpers;

use http::StatusCode;

#[tokio::test]
async fn test_status_page_on_empty_relay() {
    let app = helpers::TestApp::new();

    let (status, body) = app.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "<html><body><p>0 current connections.</p></body></html>"
    );
}

#[tokio::test]
async fn test_status_page_counts_broadcast_clients_only() {
    let app = helpers::TestApp::new();
    let (_a, _rx_a) = app.engine.manager.register("/chat");
    let (_b, _rx_b) = app.engine.manager.register("/chat");
    let (_m, _rx_m) = app.engine.manager.register("/admin");

    let (status, body) = app.get("/anything/at/all").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "<html><body><p>2 current connections.</p></body></html>"
    );
}

#[tokio::test]
async fn test_health_check() {
    let app = helpers::TestApp::new();

    let (status, body) = app.get("/api/health").await;

    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).expect("health body is JSON");
    assert_eq!(body.get("status").unwrap().as_str().unwrap(), "ok");
}
