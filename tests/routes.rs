//! Agent control routes, driven through `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use agent_discovery::http::{router, AppState, ServerHandle};
use agent_discovery::lifecycle::GracefulServer;
use agent_discovery::RuntimeData;

mod common;
use common::{agent_with, config_for, FakeServer, MockLifecycleManager};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn state_for(mock: &MockLifecycleManager) -> AppState {
    let mut config = config_for(mock);
    config.shutdown.soft_deadline_ms = 20;
    config.shutdown.hard_deadline_ms = 500;
    let agent = agent_with(&config, json!({ "name": "billing" }));
    let server: Arc<dyn GracefulServer> = FakeServer::closing_after(Duration::from_millis(5));
    AppState::new(agent, server)
}

#[tokio::test]
async fn test_health_route() {
    let mock = MockLifecycleManager::start().await;
    let app = router(state_for(&mock).await);

    let response = app
        .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "response": "AOK", "error": null }));
}

#[tokio::test]
async fn test_manual_register_with_override() {
    let mock = MockLifecycleManager::start().await;
    let state = state_for(&mock).await;
    state.agent.register(RuntimeData::with_port(8080)).await.unwrap();
    let app = router(state);

    let uri = format!("/manualRegister?host=127.0.0.1&port={}", mock.addr.port());
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!("ok"));

    let posted = mock.wait_for("/register", 2).await;
    assert_eq!(posted.len(), 2);
    assert_eq!(posted[1].body["port"], 8080);
    assert_eq!(posted[1].body["lcManagerRegister"]["host"], "127.0.0.1");
}

#[tokio::test]
async fn test_manual_unregister() {
    let mock = MockLifecycleManager::start().await;
    let state = state_for(&mock).await;
    state.agent.register(RuntimeData::with_port(9090)).await.unwrap();
    let app = router(state);

    let response = app
        .oneshot(Request::builder().uri("/manualUnregister").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let posted = mock.wait_for("/unregister", 1).await;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].body["port"], 9090);
}

#[tokio::test]
async fn test_manual_register_rejects_bad_port() {
    let mock = MockLifecycleManager::start().await;
    let app = router(state_for(&mock).await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/manualRegister?host=lcm&port=not-a-port")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_terminate_route() {
    let mock = MockLifecycleManager::start().await;
    let state = state_for(&mock).await;
    let terminated = state.terminated.clone();
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/terminate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "msg": "Soft shutdown" }));

    tokio::time::timeout(Duration::from_secs(1), terminated.notified())
        .await
        .unwrap();
    assert_eq!(mock.requests_to("/stopping").len(), 1);
}

#[tokio::test]
async fn test_served_routes_over_tcp() {
    let mock = MockLifecycleManager::start().await;
    let agent = agent_with(&config_for(&mock), json!({ "name": "billing" }));
    let server = Arc::new(ServerHandle::new());
    let state = AppState::new(agent, server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server.serve(listener, router(state)).await.unwrap();

    let body: Value = reqwest::get(format!("http://{addr}/test"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["response"], "AOK");

    server.close().await;
}
