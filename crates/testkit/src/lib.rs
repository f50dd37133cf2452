use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use signoz_mcp_core::backend::QueryBackend;
use signoz_mcp_core::error::{Result, SignozError};
use signoz_mcp_core::payload::QueryRangePayload;
use signoz_mcp_core::render::QueryRangeResponse;

mod spans;

pub use spans::{RecordedSpan, SpanRecorder};

pub fn result_body(entry: Value) -> Value {
    json!({"status": "success", "data": {"result": [entry]}})
}

pub fn empty_body() -> Value {
    json!({"status": "success", "data": {"result": []}})
}

pub fn table_body(headers: &[&str], rows: Vec<Vec<Value>>) -> Value {
    result_body(json!({"queryName": "A", "table": {"headers": headers, "rows": rows}}))
}

pub fn series_body(labels: Value, points: &[(i64, &str)]) -> Value {
    let values = points
        .iter()
        .map(|(ts, v)| json!({"timestamp": ts, "value": v}))
        .collect::<Vec<_>>();
    result_body(json!({"queryName": "A", "series": [{"labels": labels, "values": values}]}))
}

pub fn sample_logs_body() -> Value {
    result_body(json!({"queryName": "A", "list": [
        {
            "timestamp": "2026-02-01T00:00:01.200Z",
            "data": {
                "body": "context deadline exceeded",
                "severity_text": "ERROR",
                "resources_string": {"service.name": "api"}
            }
        },
        {
            "timestamp": "2026-02-01T00:00:00.950Z",
            "data": {
                "body": "retrying attempt=2",
                "severity_text": "WARN",
                "resources_string": {"service.name": "api"}
            }
        }
    ]}))
}

pub fn sample_traces_body() -> Value {
    result_body(json!({"queryName": "A", "list": [
        {
            "timestamp": "2026-02-01T00:00:00Z",
            "data": {
                "traceID": "4bf92f3577b34da6a3ce929d0e0e4736",
                "spanID": "00f067aa0ba902b7",
                "serviceName": "api",
                "name": "GET /v1/orders",
                "durationNano": 1_800_000_000_i64,
                "hasError": true
            }
        }
    ]}))
}

/// In-memory backend that replays queued responses and records every payload.
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<QueryRangeResponse>>>,
    calls: Mutex<Vec<QueryRangePayload>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, body: Value) -> Self {
        let parsed = serde_json::from_value(body)
            .map_err(|e| SignozError::Internal(format!("bad scripted response: {e}")));
        self.push(parsed)
    }

    pub fn fail(self, err: SignozError) -> Self {
        self.push(Err(err))
    }

    fn push(self, response: Result<QueryRangeResponse>) -> Self {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
        self
    }

    pub fn calls(&self) -> Vec<QueryRangePayload> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl QueryBackend for ScriptedBackend {
    async fn query_range(&self, payload: &QueryRangePayload) -> Result<QueryRangeResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(payload.clone());
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| Err(SignozError::Internal("no scripted response".into())))
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: HashMap<String, String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<VecDeque<(u16, Value)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    delay: Duration,
}

/// Local HTTP server standing in for SigNoz's `query_range` endpoint.
///
/// Responses are served in order; the last one repeats.
pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub async fn start(responses: Vec<(u16, Value)>) -> anyhow::Result<Self> {
        Self::start_with_delay(responses, Duration::ZERO).await
    }

    pub async fn start_with_delay(
        responses: Vec<(u16, Value)>,
        delay: Duration,
    ) -> anyhow::Result<Self> {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: requests.clone(),
            delay,
        };
        let app = Router::new()
            .route("/api/v4/query_range", post(query_range))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            requests,
            task,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn query_range(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let recorded = RecordedRequest {
        headers: headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    if let Ok(mut requests) = state.requests.lock() {
        requests.push(recorded);
    }

    let next = match state.responses.lock() {
        Ok(mut queue) if queue.len() > 1 => queue.pop_front(),
        Ok(queue) => queue.front().cloned(),
        Err(_) => None,
    };
    let (status, value) = next.unwrap_or_else(|| (200, empty_body()));

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(value),
    )
}
