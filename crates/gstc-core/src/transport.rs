//! Transport invoker: runs a [`RequestEnvelope`] against the daemon and
//! classifies the outcome.
//!
//! This is the single chokepoint every operation passes through. Callers only
//! ever see a [`DaemonResponse`] or one of the two [`ClientError`] variants;
//! no `reqwest` or `serde_json` error type leaks out.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::BoxFuture;
use crate::address::Address;
use crate::envelope::{RequestEnvelope, Verb};
use crate::error::{ClientError, DaemonCode, ErrorCode};

/// The JSON envelope every daemon reply is wrapped in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub code: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub response: Value,
}

impl DaemonResponse {
    /// A success envelope carrying `response`.
    pub fn ok(response: Value) -> Self {
        Self {
            code: 0,
            description: "Success".to_string(),
            response,
        }
    }

    /// The payload, or `None` when the daemon sent `null`.
    pub fn into_payload(self) -> Option<Value> {
        match self.response {
            Value::Null => None,
            other => Some(other),
        }
    }
}

/// Decode a raw body into a [`DaemonResponse`], raising a [`ClientError`] for
/// anything that is not a success envelope.
pub fn decode_response(body: &[u8]) -> Result<DaemonResponse, ClientError> {
    let response: DaemonResponse =
        serde_json::from_slice(body).map_err(|e| ClientError::corrupted(e.to_string()))?;

    if response.code != 0 {
        return Err(ClientError::Daemon {
            description: response.description,
            code: response.code,
        });
    }

    Ok(response)
}

/// Classify a reply by status and body.
///
/// An empty `204 No Content` is the daemon's BAD_VALUE answer. Every other
/// reply goes through [`decode_response`].
pub fn classify_reply(status: StatusCode, body: &[u8]) -> Result<DaemonResponse, ClientError> {
    if status == StatusCode::NO_CONTENT && body.is_empty() {
        let code = DaemonCode::BadValue;
        return Err(ClientError::Daemon {
            description: code.description().to_string(),
            code: code.as_i32(),
        });
    }
    decode_response(body)
}

/// Performs network calls for envelopes.
///
/// Uses [`BoxFuture`] so the facade can hold an `Arc<dyn Transport>` and tests
/// can substitute a scripted double.
pub trait Transport: Send + Sync {
    /// Execute `envelope` against `address`.
    ///
    /// Produces exactly one [`DaemonResponse`] or exactly one [`ClientError`].
    fn invoke<'a>(
        &'a self,
        address: &'a Address,
        envelope: &'a RequestEnvelope,
    ) -> BoxFuture<'a, Result<DaemonResponse, ClientError>>;
}

/// [`Transport`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with an optional whole-request timeout.
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder =
            Client::builder().user_agent(crate::build_info::user_agent());
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ClientError::Transport {
            reason: "client setup failed".to_string(),
            code: ErrorCode::SocketError,
            detail: e.to_string(),
        })?;
        Ok(Self { client })
    }

    /// Wrap an already configured `reqwest` client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// The HTTP method each verb travels as.
fn method_for(verb: Verb) -> Method {
    match verb {
        Verb::Create => Method::POST,
        Verb::Read => Method::GET,
        Verb::Update => Method::PUT,
        Verb::Delete => Method::DELETE,
    }
}

impl Transport for HttpTransport {
    fn invoke<'a>(
        &'a self,
        address: &'a Address,
        envelope: &'a RequestEnvelope,
    ) -> BoxFuture<'a, Result<DaemonResponse, ClientError>> {
        Box::pin(async move {
            let url = envelope.url(address);
            debug!(verb = %envelope.verb, url = %url, "daemon request");

            let mut request = self.client.request(method_for(envelope.verb), url.as_str());
            if let Some(body) = &envelope.body {
                request = request.json(body);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| ClientError::unreachable(e.to_string()))?;

            // The daemon answers errors with a non-2xx status *and* a JSON
            // envelope, so the body decides the outcome. BAD_VALUE is the
            // exception: it maps to 204 and the envelope never arrives.
            let status = resp.status();
            let body = resp
                .bytes()
                .await
                .map_err(|e| ClientError::corrupted(format!("failed to read body: {e}")))?;

            let decoded = classify_reply(status, &body);
            trace!(status = %status, ok = decoded.is_ok(), "daemon reply");
            decoded
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_success_keeps_payload() {
        let body = br#"{"code":0,"description":"Success","response":{"nodes":[]}}"#;
        let resp = decode_response(body).unwrap();
        assert_eq!(resp.code, 0);
        assert_eq!(resp.description, "Success");
        assert_eq!(resp.response, json!({ "nodes": [] }));
    }

    #[test]
    fn test_decode_null_payload() {
        let body = br#"{"code":0,"description":"Success","response":null}"#;
        let resp = decode_response(body).unwrap();
        assert_eq!(resp.into_payload(), None);
    }

    #[test]
    fn test_decode_missing_payload_is_null() {
        let body = br#"{"code":0,"description":"Success"}"#;
        let resp = decode_response(body).unwrap();
        assert_eq!(resp.response, Value::Null);
    }

    #[test]
    fn test_decode_daemon_error() {
        let body = br#"{"code":5,"description":"Pipeline requested doesn't exist","response":null}"#;
        let err = decode_response(body).unwrap_err();
        assert_eq!(
            err,
            ClientError::Daemon {
                description: "Pipeline requested doesn't exist".to_string(),
                code: 5,
            }
        );
    }

    #[test]
    fn test_decode_negative_code_is_daemon_error() {
        let body = br#"{"code":-7,"description":"Not found","response":null}"#;
        let err = decode_response(body).unwrap_err();
        assert!(err.is_daemon());
        assert_eq!(err.code(), -7);
    }

    #[test]
    fn test_decode_garbage_is_corrupted() {
        let err = decode_response(b"<html>not json</html>").unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.code(), ErrorCode::RecvError.as_i32());
    }

    #[test]
    fn test_decode_wrong_shape_is_corrupted() {
        let err = decode_response(br#"{"status":"ok"}"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RecvError.as_i32());
    }

    #[test]
    fn test_empty_no_content_is_bad_value() {
        let err = classify_reply(StatusCode::NO_CONTENT, b"").unwrap_err();
        assert_eq!(
            err,
            ClientError::Daemon {
                description: "Bad value".to_string(),
                code: 13,
            }
        );
        assert_eq!(err.daemon_code(), Some(DaemonCode::BadValue));
    }

    #[test]
    fn test_empty_ok_is_still_corrupted() {
        let err = classify_reply(StatusCode::OK, b"").unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.code(), ErrorCode::RecvError.as_i32());
    }

    #[test]
    fn test_error_status_defers_to_envelope() {
        let body = br#"{"code":4,"description":"Existing resource","response":null}"#;
        let err = classify_reply(StatusCode::CONFLICT, body).unwrap_err();
        assert_eq!(err.code(), 4);
        assert!(err.is_daemon());
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(method_for(Verb::Create), Method::POST);
        assert_eq!(method_for(Verb::Read), Method::GET);
        assert_eq!(method_for(Verb::Update), Method::PUT);
        assert_eq!(method_for(Verb::Delete), Method::DELETE);
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new(None).is_ok());
        assert!(HttpTransport::new(Some(Duration::from_secs(3))).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = HttpTransport::new(None).unwrap();
        let address = Address::new("127.0.0.1", port);
        let envelope = RequestEnvelope::read("/pipelines");
        let err = transport.invoke(&address, &envelope).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.code(), ErrorCode::Unreachable.as_i32());
    }
}
