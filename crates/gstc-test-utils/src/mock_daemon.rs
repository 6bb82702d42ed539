//! A scriptable stand-in for the daemon's HTTP API.
//!
//! [`MockDaemon`] serves an axum router on an ephemeral `127.0.0.1` port.
//! Every request is recorded verbatim (method, path, raw query, body) and
//! answered from a FIFO of scripted [`Reply`] values. When the script is
//! empty the mock answers with a plain success envelope and a `null`
//! payload.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use gstc_config::AppConfig;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::TestConfigBuilder;

/// One request as the mock saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Query string exactly as received, without the leading `?`.
    pub raw_query: Option<String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// Query pairs split on `&` and `=`. Values are not percent-decoded.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let Some(query) = &self.raw_query else {
            return Vec::new();
        };
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect()
    }

    /// The first value for `key`, not percent-decoded.
    pub fn query(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// A scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A JSON body with the given HTTP status.
    Json { status: u16, body: Value },
    /// Arbitrary bytes with the given HTTP status.
    Raw { status: u16, body: String },
}

impl Reply {
    /// `{"code":0,"description":"Success","response":<response>}` with 200.
    pub fn success(response: Value) -> Self {
        Reply::Json {
            status: 200,
            body: json!({ "code": 0, "description": "Success", "response": response }),
        }
    }

    /// A daemon error envelope. The real daemon pairs these with a 4xx
    /// status, so the mock does too.
    pub fn daemon_error(code: i32, description: &str) -> Self {
        Reply::Json {
            status: 400,
            body: json!({ "code": code, "description": description, "response": null }),
        }
    }

    /// A body that is not a daemon envelope.
    pub fn garbage(status: u16, body: &str) -> Self {
        Reply::Raw {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Default)]
struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<VecDeque<Reply>>,
}

/// Build the mock router over shared state.
fn router(state: Arc<MockState>) -> Router {
    Router::new().fallback(handle_any).with_state(state)
}

async fn handle_any(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };
    let request = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        raw_query: uri.query().map(str::to_string),
        body,
    };
    debug!(method = %request.method, path = %request.path, "mock daemon request");

    if let Ok(mut requests) = state.requests.lock() {
        requests.push(request);
    }

    let reply = state
        .replies
        .lock()
        .ok()
        .and_then(|mut replies| replies.pop_front())
        .unwrap_or_else(|| Reply::success(Value::Null));

    let (status, body) = match reply {
        Reply::Json { status, body } => (status, body.to_string()),
        Reply::Raw { status, body } => (status, body),
    };
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// A running mock daemon. Stops when dropped or on [`MockDaemon::shutdown`].
pub struct MockDaemon {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MockDaemon {
    /// Bind an ephemeral port on `127.0.0.1` and start serving.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock daemon");
        let addr = listener.local_addr().expect("mock daemon has no address");
        let state = Arc::new(MockState::default());
        let app = router(Arc::clone(&state));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });
        debug!(%addr, "mock daemon listening");

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// `http://127.0.0.1:<port>`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A default config pointing at this mock.
    pub fn config(&self) -> AppConfig {
        TestConfigBuilder::new()
            .daemon_host(&self.host())
            .daemon_port(self.port())
            .build()
    }

    /// Queue a reply for the next unanswered request.
    pub fn push_reply(&self, reply: Reply) {
        self.state
            .replies
            .lock()
            .expect("reply queue poisoned")
            .push_back(reply);
    }

    /// Queue several replies in order.
    pub fn push_replies(&self, replies: impl IntoIterator<Item = Reply>) {
        for reply in replies {
            self.push_reply(reply);
        }
    }

    /// Everything received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .expect("request log poisoned")
            .clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests().pop()
    }

    /// Stop serving and wait for the server task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MockDaemon {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
