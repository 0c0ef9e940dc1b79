//! In-process stand-ins for the prediction service and the proxy itself.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{Json, Router};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tokio::sync::Barrier;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub(crate) enum MockBehavior {
    /// Reply 200 with a fixed JSON body.
    Respond(Value),
    /// Reply 200 with these exact bytes, labelled as JSON.
    Raw(&'static str),
    /// Reply 200 with [`echo_prediction`] for the requested division.
    Echo,
    Status(StatusCode),
    /// Never answer within any reasonable test budget.
    Hang,
    /// Hold the reply until every participant has arrived, then echo.
    Rendezvous(Arc<Barrier>),
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub body: Value,
    pub content_type: Option<String>,
    pub accept: Option<String>,
}

#[derive(Clone)]
struct MockState {
    default: MockBehavior,
    overrides: Arc<HashMap<String, MockBehavior>>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub(crate) struct MockUpstream {
    pub url: reqwest::Url,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().expect("recorded requests lock").clone()
    }

    pub fn requested_divisions(&self) -> Vec<String> {
        let mut divisions: Vec<String> = self
            .requests()
            .iter()
            .filter_map(|req| req.body.get("division").and_then(Value::as_str))
            .map(str::to_owned)
            .collect();
        divisions.sort();
        divisions
    }

    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

/// Payload returned by [`MockBehavior::Echo`] for `division`.
pub(crate) fn echo_prediction(division: &str) -> Value {
    json!({
        "regression_result": [division.len(), 0.25, 950.5],
        "classification_result": "moderate",
        "llm_suggestion": format!("advice for {division}")
    })
}

pub(crate) async fn spawn_mock_upstream(default: MockBehavior) -> MockUpstream {
    spawn_mock_upstream_with(default, HashMap::new()).await
}

pub(crate) async fn spawn_mock_upstream_with(
    default: MockBehavior,
    overrides: HashMap<String, MockBehavior>,
) -> MockUpstream {
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        default,
        overrides: Arc::new(overrides),
        recorded: Arc::clone(&recorded),
    };
    let app = Router::new()
        .route("/ml_model_pred/predict/", axum::routing::post(mock_predict))
        .with_state(state);
    let (addr, handle) = spawn_test_server(app).await;
    let url = reqwest::Url::parse(&format!("http://{addr}/ml_model_pred/predict/"))
        .expect("mock upstream URL");

    MockUpstream {
        url,
        recorded,
        handle,
    }
}

async fn mock_predict(State(mock): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    mock.recorded
        .lock()
        .expect("recorded requests lock")
        .push(RecordedRequest {
            body: body.clone(),
            content_type: header_str(header::CONTENT_TYPE),
            accept: header_str(header::ACCEPT),
        });

    let division = body
        .get("division")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let behavior = mock
        .overrides
        .get(&division)
        .cloned()
        .unwrap_or_else(|| mock.default.clone());

    match behavior {
        MockBehavior::Respond(payload) => Json(payload).into_response(),
        MockBehavior::Raw(body) => {
            ([(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        MockBehavior::Echo => Json(echo_prediction(&division)).into_response(),
        MockBehavior::Status(status) => (status, "mock upstream failure").into_response(),
        MockBehavior::Hang => {
            tokio::time::sleep(Duration::from_secs(120)).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        MockBehavior::Rendezvous(barrier) => {
            barrier.wait().await;
            Json(echo_prediction(&division)).into_response()
        }
    }
}

pub(crate) async fn spawn_test_server(app: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });
    (addr, handle)
}

/// URL on a loopback port nothing is listening on.
pub(crate) async fn closed_port_url() -> reqwest::Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway listener address");
    drop(listener);
    reqwest::Url::parse(&format!("http://{addr}/ml_model_pred/predict/")).expect("closed port URL")
}

pub(crate) fn elapsed_within(started: Instant, budget: Duration) -> bool {
    started.elapsed() < budget + Duration::from_secs(2)
}
