//! Shared utilities for integration testing.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use agent_discovery::config::{
    AgentConfig, DirectoryCoordinates, Environment, InlineSource, JsonObject, StaticSources,
};
use agent_discovery::directory::HttpDirectory;
use agent_discovery::lifecycle::GracefulServer;
use agent_discovery::Agent;

/// One request seen by the mock lifecycle manager.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    instances: Mutex<HashMap<String, Vec<Value>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    fail_queries: AtomicBool,
}

/// A programmable lifecycle manager on an ephemeral port.
///
/// `GET /query/` answers from the programmed instances. `POST /register`,
/// `/unregister` and `/stopping` answer with a rest-quick envelope. Any other
/// path echoes the request inside an envelope, so the mock can also stand in
/// for a discovered service.
#[derive(Clone)]
pub struct MockLifecycleManager {
    state: Arc<MockState>,
    pub addr: SocketAddr,
}

impl MockLifecycleManager {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(MockState::default());

        let app = Router::new().fallback(handle).with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { state, addr }
    }

    pub fn coordinates(&self) -> DirectoryCoordinates {
        DirectoryCoordinates::new("127.0.0.1", self.addr.port())
    }

    /// Add a responsive instance of `service_type`.
    pub fn add_instance(&self, service_type: &str, host: &str, port: u16) {
        self.state
            .instances
            .lock()
            .unwrap()
            .entry(service_type.to_string())
            .or_default()
            .push(json!({ "host": host, "port": port, "serviceType": service_type }));
    }

    /// Advertise the mock itself as an instance of `service_type`.
    pub fn add_self_instance(&self, service_type: &str) {
        self.add_instance(service_type, "127.0.0.1", self.addr.port());
    }

    pub fn fail_queries(&self, fail: bool) {
        self.state.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn query_count(&self) -> usize {
        self.requests_to("/query/").len()
    }

    /// Wait until at least `count` requests hit `path`, or give up after a second.
    pub async fn wait_for(&self, path: &str, count: usize) -> Vec<RecordedRequest> {
        for _ in 0..100 {
            let seen = self.requests_to(path);
            if seen.len() >= count {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.requests_to(path)
    }
}

async fn handle(State(state): State<Arc<MockState>>, request: Request<Body>) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let bytes = to_bytes(request.into_body(), usize::MAX).await.unwrap_or_default();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        body: body.clone(),
    });

    match path.as_str() {
        "/query/" => {
            if state.fail_queries.load(Ordering::SeqCst) {
                return (StatusCode::INTERNAL_SERVER_ERROR, "directory unavailable").into_response();
            }
            let params: HashMap<String, String> = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
                .into_owned()
                .collect();
            let service_type = params.get("serviceType").cloned().unwrap_or_default();
            let instances = state
                .instances
                .lock()
                .unwrap()
                .get(&service_type)
                .cloned()
                .unwrap_or_default();
            Json(Value::Array(instances)).into_response()
        }
        "/register" | "/unregister" | "/stopping" => Json(json!({
            "kitVersion": "1.0.0",
            "status": "ok",
            "result": { "action": path.trim_start_matches('/') },
        }))
        .into_response(),
        _ => Json(json!({
            "kitVersion": "1.0.0",
            "status": "ok",
            "result": { "method": method, "path": path, "body": body },
        }))
        .into_response(),
    }
}

/// A `GracefulServer` whose close takes `delay`, or never completes when `None`.
pub struct FakeServer {
    delay: Option<Duration>,
    pub closes: AtomicUsize,
}

impl FakeServer {
    pub fn closing_after(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn never_closing() -> Arc<Self> {
        Arc::new(Self {
            delay: None,
            closes: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl GracefulServer for FakeServer {
    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
    }
}

pub fn object(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Config pointing every directory role at `mock`.
pub fn config_for(mock: &MockLifecycleManager) -> AgentConfig {
    let mut config = AgentConfig::default();
    config.directory.lc_manager = Some(mock.coordinates());
    config.discovery.request_timeout_secs = 2;
    config
}

/// Agent over `mock`, with `static_data` as the only static registration source.
pub fn agent_with(config: &AgentConfig, static_data: Value) -> Agent {
    let directory = Arc::new(HttpDirectory::new(Duration::from_secs(2)).unwrap());
    let sources = StaticSources::new(
        Arc::new(InlineSource::new("appSettings.json", object(static_data))),
        Arc::new(InlineSource::absent("package.json")),
    );
    Agent::with_parts(config, directory, sources, Environment::default()).unwrap()
}
