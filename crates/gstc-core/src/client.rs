//! `GstdClient`: the facade over every daemon operation.
//!
//! A client binds one [`Address`] to one shared [`Transport`]. It holds no
//! mutable state, so clones can be handed to as many tasks as needed.

use std::sync::Arc;

use gstc_config::AppConfig;
use serde_json::Value;

use crate::address::Address;
use crate::envelope::RequestEnvelope;
use crate::error::ClientError;
use crate::resource::{self, PipelineState, Seek};
use crate::transport::{DaemonResponse, HttpTransport, Transport};

/// Typed client for the daemon's HTTP API.
#[derive(Clone)]
pub struct GstdClient {
    address: Address,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for GstdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GstdClient")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl GstdClient {
    /// Create a client talking HTTP to `address`, without a request timeout.
    pub fn new(address: Address) -> Result<Self, ClientError> {
        Ok(Self::with_transport(address, Arc::new(HttpTransport::new(None)?)))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(address: Address, transport: Arc<dyn Transport>) -> Self {
        Self { address, transport }
    }

    /// Create a client from the `[daemon]` and `[client]` config sections.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config.client.request_timeout())?;
        Ok(Self::with_transport(
            Address::from_config(&config.daemon),
            Arc::new(transport),
        ))
    }

    /// A new client pointing at `address` and sharing this client's transport.
    pub fn with_address(&self, address: Address) -> Self {
        Self {
            address,
            transport: Arc::clone(&self.transport),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Run one envelope through the transport.
    pub async fn execute(&self, envelope: &RequestEnvelope) -> Result<DaemonResponse, ClientError> {
        self.transport.invoke(&self.address, envelope).await
    }

    /// Execute an envelope built by a fallible resource function.
    async fn send(
        &self,
        envelope: Result<RequestEnvelope, ClientError>,
    ) -> Result<DaemonResponse, ClientError> {
        self.execute(&envelope?).await
    }

    // ── Generic primitives ─────────────────────────────────────────────

    /// CREATE `name` under `path`.
    pub async fn create(
        &self,
        path: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<DaemonResponse, ClientError> {
        let envelope = RequestEnvelope::create(path, name, description.map(str::to_string));
        self.execute(&envelope).await
    }

    /// READ the resource at `path`.
    pub async fn read(&self, path: &str) -> Result<DaemonResponse, ClientError> {
        self.execute(&RequestEnvelope::read(path)).await
    }

    /// UPDATE the resource at `path` to `value`.
    pub async fn update(&self, path: &str, value: &str) -> Result<DaemonResponse, ClientError> {
        self.execute(&RequestEnvelope::update(path, value)).await
    }

    /// DELETE `name` from the collection at `path`.
    pub async fn delete(&self, path: &str, name: &str) -> Result<DaemonResponse, ClientError> {
        self.execute(&RequestEnvelope::delete(path, name)).await
    }

    // ── Pipelines ──────────────────────────────────────────────────────

    /// Names of all pipelines known to the daemon.
    pub async fn list_pipelines(&self) -> Result<Vec<String>, ClientError> {
        node_names(self.execute(&resource::list_pipelines()).await?)
    }

    /// Check that the daemon answers at all.
    pub async fn ping(&self) -> Result<(), ClientError> {
        self.execute(&resource::list_pipelines()).await.map(|_| ())
    }

    pub async fn pipeline_create(
        &self,
        pipeline: &str,
        description: &str,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::pipeline_create(pipeline, description)).await
    }

    pub async fn pipeline_delete(&self, pipeline: &str) -> Result<DaemonResponse, ClientError> {
        self.send(resource::pipeline_delete(pipeline)).await
    }

    pub async fn pipeline_play(&self, pipeline: &str) -> Result<DaemonResponse, ClientError> {
        self.send(resource::pipeline_state(pipeline, PipelineState::Playing))
            .await
    }

    pub async fn pipeline_pause(&self, pipeline: &str) -> Result<DaemonResponse, ClientError> {
        self.send(resource::pipeline_state(pipeline, PipelineState::Paused))
            .await
    }

    pub async fn pipeline_stop(&self, pipeline: &str) -> Result<DaemonResponse, ClientError> {
        self.send(resource::pipeline_state(pipeline, PipelineState::Null))
            .await
    }

    /// The pipeline graph in DOT format, wrapped in the daemon's payload.
    pub async fn pipeline_graph(&self, pipeline: &str) -> Result<DaemonResponse, ClientError> {
        self.send(resource::pipeline_graph(pipeline)).await
    }

    pub async fn pipeline_verbose(
        &self,
        pipeline: &str,
        enable: bool,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::pipeline_verbose(pipeline, enable)).await
    }

    // ── Elements ───────────────────────────────────────────────────────

    pub async fn list_elements(&self, pipeline: &str) -> Result<Vec<String>, ClientError> {
        node_names(self.send(resource::list_elements(pipeline)).await?)
    }

    pub async fn list_properties(
        &self,
        pipeline: &str,
        element: &str,
    ) -> Result<Vec<String>, ClientError> {
        node_names(self.send(resource::list_properties(pipeline, element)).await?)
    }

    /// Current value of an element property.
    pub async fn element_get(
        &self,
        pipeline: &str,
        element: &str,
        property: &str,
    ) -> Result<Value, ClientError> {
        let resp = self
            .send(resource::element_get(pipeline, element, property))
            .await?;
        field(resp, "value")
    }

    pub async fn element_set(
        &self,
        pipeline: &str,
        element: &str,
        property: &str,
        value: &str,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::element_set(pipeline, element, property, value))
            .await
    }

    /// Emit a parameterless action signal on an element.
    pub async fn action_emit(
        &self,
        pipeline: &str,
        element: &str,
        action: &str,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::action_emit(pipeline, element, action))
            .await
    }

    // ── Signals ────────────────────────────────────────────────────────

    pub async fn list_signals(
        &self,
        pipeline: &str,
        element: &str,
    ) -> Result<Vec<String>, ClientError> {
        node_names(self.send(resource::list_signals(pipeline, element)).await?)
    }

    /// Wait for the signal to fire; the response carries its arguments.
    pub async fn signal_connect(
        &self,
        pipeline: &str,
        element: &str,
        signal: &str,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::signal_connect(pipeline, element, signal))
            .await
    }

    pub async fn signal_disconnect(
        &self,
        pipeline: &str,
        element: &str,
        signal: &str,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::signal_disconnect(pipeline, element, signal))
            .await
    }

    /// Signal connect timeout in microseconds (-1 forever).
    pub async fn signal_timeout(
        &self,
        pipeline: &str,
        element: &str,
        signal: &str,
        timeout: i64,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::signal_timeout(pipeline, element, signal, timeout))
            .await
    }

    /// Set the connect timeout, then wait for the signal.
    pub async fn signal_connect_timeout(
        &self,
        pipeline: &str,
        element: &str,
        signal: &str,
        timeout: i64,
    ) -> Result<DaemonResponse, ClientError> {
        self.signal_timeout(pipeline, element, signal, timeout)
            .await?;
        self.signal_connect(pipeline, element, signal).await
    }

    // ── Bus ────────────────────────────────────────────────────────────

    pub async fn bus_filter(
        &self,
        pipeline: &str,
        filter: &str,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::bus_filter(pipeline, filter)).await
    }

    /// One bus read. A `null` payload means no message arrived in time.
    pub async fn bus_read(&self, pipeline: &str) -> Result<DaemonResponse, ClientError> {
        self.send(resource::bus_read(pipeline)).await
    }

    /// Bus read timeout in nanoseconds (-1 forever).
    pub async fn bus_timeout(
        &self,
        pipeline: &str,
        timeout_ns: i64,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::bus_timeout(pipeline, timeout_ns)).await
    }

    /// Configure filter and timeout, then read a single bus message.
    ///
    /// Returns `Ok(None)` when the read timed out without a message.
    pub async fn bus_wait(
        &self,
        pipeline: &str,
        filter: &str,
        timeout_ns: i64,
    ) -> Result<Option<Value>, ClientError> {
        self.bus_filter(pipeline, filter).await?;
        self.bus_timeout(pipeline, timeout_ns).await?;
        Ok(self.bus_read(pipeline).await?.into_payload())
    }

    // ── Events ─────────────────────────────────────────────────────────

    pub async fn event_seek(
        &self,
        pipeline: &str,
        seek: &Seek,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::event_seek(pipeline, seek)).await
    }

    pub async fn event_eos(&self, pipeline: &str) -> Result<DaemonResponse, ClientError> {
        self.send(resource::event_eos(pipeline)).await
    }

    pub async fn event_flush_start(&self, pipeline: &str) -> Result<DaemonResponse, ClientError> {
        self.send(resource::event_flush_start(pipeline)).await
    }

    pub async fn event_flush_stop(
        &self,
        pipeline: &str,
        reset: bool,
    ) -> Result<DaemonResponse, ClientError> {
        self.send(resource::event_flush_stop(pipeline, reset)).await
    }

    // ── Debug ──────────────────────────────────────────────────────────

    pub async fn debug_enable(&self, enable: bool) -> Result<DaemonResponse, ClientError> {
        self.execute(&resource::debug_enable(enable)).await
    }

    pub async fn debug_color(&self, color: bool) -> Result<DaemonResponse, ClientError> {
        self.execute(&resource::debug_color(color)).await
    }

    pub async fn debug_reset(&self, reset: bool) -> Result<DaemonResponse, ClientError> {
        self.execute(&resource::debug_reset(reset)).await
    }

    pub async fn debug_threshold(&self, threshold: &str) -> Result<DaemonResponse, ClientError> {
        self.execute(&resource::debug_threshold(threshold)).await
    }
}

/// Take `field` out of the response payload.
fn field(resp: DaemonResponse, name: &str) -> Result<Value, ClientError> {
    match resp.response {
        Value::Object(mut map) => map
            .remove(name)
            .ok_or_else(|| ClientError::corrupted(format!("response has no `{name}` field"))),
        other => Err(ClientError::corrupted(format!(
            "expected an object payload, got {other}"
        ))),
    }
}

/// Names out of a `{"nodes": [{"name": ...}, ...]}` listing.
fn node_names(resp: DaemonResponse) -> Result<Vec<String>, ClientError> {
    let nodes = field(resp, "nodes")?;
    let Value::Array(nodes) = nodes else {
        return Err(ClientError::corrupted("`nodes` is not an array"));
    };
    nodes
        .into_iter()
        .map(|node| match node.get("name") {
            Some(Value::String(name)) => Ok(name.clone()),
            _ => Err(ClientError::corrupted("node without a string `name`")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxFuture;
    use crate::envelope::Verb;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records envelopes and answers every call with the same response.
    struct Recorder {
        seen: Mutex<Vec<(String, RequestEnvelope)>>,
        reply: Result<DaemonResponse, ClientError>,
    }

    impl Recorder {
        fn replying(reply: Result<DaemonResponse, ClientError>) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn seen(&self) -> Vec<(String, RequestEnvelope)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for Recorder {
        fn invoke<'a>(
            &'a self,
            address: &'a Address,
            envelope: &'a RequestEnvelope,
        ) -> BoxFuture<'a, Result<DaemonResponse, ClientError>> {
            self.seen
                .lock()
                .unwrap()
                .push((address.base(), envelope.clone()));
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }
    }

    fn client(recorder: &Arc<Recorder>) -> GstdClient {
        GstdClient::with_transport(Address::default(), recorder.clone())
    }

    #[tokio::test]
    async fn test_list_pipelines_extracts_names() {
        let rec = Recorder::replying(Ok(DaemonResponse::ok(json!({
            "nodes": [{ "name": "p0" }, { "name": "p1" }]
        }))));
        let names = client(&rec).list_pipelines().await.unwrap();
        assert_eq!(names, vec!["p0".to_string(), "p1".to_string()]);
        assert_eq!(rec.seen()[0].1.path, "/pipelines");
    }

    #[tokio::test]
    async fn test_list_without_nodes_is_corrupted() {
        let rec = Recorder::replying(Ok(DaemonResponse::ok(json!({ "other": 1 }))));
        let err = client(&rec).list_elements("p0").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RecvError.as_i32());
    }

    #[tokio::test]
    async fn test_element_get_returns_value() {
        let rec = Recorder::replying(Ok(DaemonResponse::ok(json!({
            "name": "pattern",
            "value": "ball",
            "param": { "access": "((GstdParamFlags) READ | WRITE)" }
        }))));
        let value = client(&rec)
            .element_get("p0", "v0", "pattern")
            .await
            .unwrap();
        assert_eq!(value, json!("ball"));
    }

    #[tokio::test]
    async fn test_empty_argument_sends_nothing() {
        let rec = Recorder::replying(Ok(DaemonResponse::ok(Value::Null)));
        let err = client(&rec).pipeline_play("").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NullArgument.as_i32());
        assert!(rec.seen().is_empty());
    }

    #[tokio::test]
    async fn test_daemon_error_passes_through() {
        let daemon_err = ClientError::Daemon {
            description: "Pipeline requested doesn't exist".to_string(),
            code: 5,
        };
        let rec = Recorder::replying(Err(daemon_err.clone()));
        let err = client(&rec).pipeline_pause("p0").await.unwrap_err();
        assert_eq!(err, daemon_err);
    }

    #[tokio::test]
    async fn test_bus_wait_sequence() {
        let rec = Recorder::replying(Ok(DaemonResponse::ok(Value::Null)));
        let msg = client(&rec)
            .bus_wait("p0", "eos", 1_000)
            .await
            .unwrap();
        assert_eq!(msg, None);

        let seen: Vec<_> = rec
            .seen()
            .into_iter()
            .map(|(_, e)| (e.verb, e.path, e.name))
            .collect();
        assert_eq!(
            seen,
            vec![
                (Verb::Update, "/pipelines/p0/bus/types".to_string(), Some("eos".to_string())),
                (Verb::Update, "/pipelines/p0/bus/timeout".to_string(), Some("1000".to_string())),
                (Verb::Read, "/pipelines/p0/bus/message".to_string(), None),
            ]
        );
    }

    #[tokio::test]
    async fn test_signal_connect_timeout_sequence() {
        let rec = Recorder::replying(Ok(DaemonResponse::ok(json!({ "name": "handoff" }))));
        client(&rec)
            .signal_connect_timeout("p0", "id", "handoff", 500)
            .await
            .unwrap();
        let paths: Vec<_> = rec.seen().into_iter().map(|(_, e)| e.path).collect();
        assert_eq!(
            paths,
            vec![
                "/pipelines/p0/elements/id/signals/handoff/timeout".to_string(),
                "/pipelines/p0/elements/id/signals/handoff/callback".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_with_address_repoints_without_touching_original() {
        let rec = Recorder::replying(Ok(DaemonResponse::ok(Value::Null)));
        let original = client(&rec);
        let moved = original.with_address(Address::new("10.0.0.2", 5002));

        original.ping().await.unwrap();
        moved.ping().await.unwrap();

        let bases: Vec<_> = rec.seen().into_iter().map(|(b, _)| b).collect();
        assert_eq!(
            bases,
            vec![
                "http://127.0.0.1:5001".to_string(),
                "http://10.0.0.2:5002".to_string(),
            ]
        );
        assert_eq!(original.address(), &Address::default());
    }

    #[tokio::test]
    async fn test_generic_primitives() {
        let rec = Recorder::replying(Ok(DaemonResponse::ok(Value::Null)));
        let c = client(&rec);
        c.create("/pipelines", "p0", None).await.unwrap();
        c.read("/pipelines/p0/graph").await.unwrap();
        c.update("/debug/enable", "true").await.unwrap();
        c.delete("/pipelines", "p0").await.unwrap();

        let verbs: Vec<_> = rec.seen().into_iter().map(|(_, e)| e.verb).collect();
        assert_eq!(verbs, vec![Verb::Create, Verb::Read, Verb::Update, Verb::Delete]);
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig::default();
        let c = GstdClient::from_config(&config).unwrap();
        assert_eq!(c.address(), &Address::default());
    }
}
