use std::net::SocketAddr;
use std::path::Path;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use greeter::config::Config;
use greeter::server::create_app;

fn test_config(dir: &Path) -> Config {
    Config {
        agent_name: "TestAgent".to_string(),
        version_file: dir.join("version.info"),
        max_requests: 3,
        window_secs: 60,
        ..Config::default()
    }
}

fn get(path: &str, client: &str) -> Request<Body> {
    let addr: SocketAddr = format!("{}:4000", client).parse().unwrap();
    let mut request = Request::builder().uri(path).body(Body::empty()).unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

async fn send(app: &Router, path: &str, client: &str) -> Response {
    app.clone().oneshot(get(path, client)).await.unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(test_config(dir.path()));

    let response = send(&app, "/health", "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], "dev");
    assert!(body["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_version_endpoint_reads_version_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("version.info"), "1.2.3\n").unwrap();
    let app = create_app(test_config(dir.path()));

    let response = send(&app, "/version", "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["version"], "1.2.3");
    assert_eq!(body["agent_name"], "TestAgent");
}

#[tokio::test]
async fn test_version_endpoint_defaults_to_dev() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(test_config(dir.path()));

    let body = body_json(send(&app, "/version", "10.0.0.1").await).await;
    assert_eq!(body["version"], "dev");
}

#[tokio::test]
async fn test_greeting_message() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("version.info"), "2.0.0").unwrap();
    let app = create_app(test_config(dir.path()));

    let response = send(&app, "/", "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("TestAgent"));
    assert!(message.contains("2.0.0"));
    assert!(message.starts_with("Ciao"));
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(test_config(dir.path()));

    // Make requests up to and past the limit of 3
    for i in 0..5 {
        let response = send(&app, "/", "10.0.0.1").await;

        if i < 3 {
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()["x-ratelimit-limit"].to_str().unwrap(),
                "3"
            );
            assert_eq!(
                response.headers()["x-ratelimit-remaining"]
                    .to_str()
                    .unwrap(),
                (2 - i).to_string()
            );
        } else {
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
            assert!(response.headers().contains_key("retry-after"));

            let body = body_json(response).await;
            assert_eq!(body["error"], "Rate limit exceeded");
            assert_eq!(body["description"], "3 per 60 seconds");
            assert!(body["retry_after"].as_u64().unwrap() >= 1);
        }
    }
}

#[tokio::test]
async fn test_health_is_never_rate_limited() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(test_config(dir.path()));

    // Exhaust the client's budget on the greeting route
    for _ in 0..4 {
        send(&app, "/", "10.0.0.1").await;
    }
    assert_eq!(
        send(&app, "/", "10.0.0.1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    for _ in 0..10 {
        let response = send(&app, "/health", "10.0.0.1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("x-ratelimit-limit"));
    }
}

#[tokio::test]
async fn test_clients_have_independent_budgets() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(test_config(dir.path()));

    for _ in 0..4 {
        send(&app, "/", "10.0.0.1").await;
    }
    assert_eq!(
        send(&app, "/", "10.0.0.1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let response = send(&app, "/", "10.0.0.2").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_routes_have_independent_budgets() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(test_config(dir.path()));

    for _ in 0..4 {
        send(&app, "/", "10.0.0.1").await;
    }
    assert_eq!(
        send(&app, "/", "10.0.0.1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let response = send(&app, "/version", "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::OK);
}
