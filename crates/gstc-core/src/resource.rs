//! Named daemon operations expressed as request envelopes.
//!
//! Each function here is a pure mapping from semantic parameters to exactly
//! one [`RequestEnvelope`]. Nothing is sent; the
//! [`GstdClient`](crate::client::GstdClient) facade hands the envelopes to a
//! transport.
//!
//! Pipeline, element, property, signal and action names are opaque strings.
//! They are only checked for being non-empty; an empty one yields a
//! `NULL_ARGUMENT` transport error before anything reaches the network.

use std::fmt;

use serde_json::json;

use crate::envelope::RequestEnvelope;
use crate::error::ClientError;

/// Separator between seek fields. The daemon's event parser splits on
/// whitespace, and the value travels inside a query string.
pub const SEEK_SEPARATOR: &str = "%20";

fn require<'a>(value: &'a str, what: &str) -> Result<&'a str, ClientError> {
    if value.is_empty() {
        return Err(ClientError::missing_argument(what));
    }
    Ok(value)
}

fn flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn pipeline_path(pipeline: &str) -> Result<String, ClientError> {
    Ok(format!("/pipelines/{}", require(pipeline, "pipeline name")?))
}

fn element_path(pipeline: &str, element: &str) -> Result<String, ClientError> {
    Ok(format!(
        "{}/elements/{}",
        pipeline_path(pipeline)?,
        require(element, "element name")?
    ))
}

fn signal_path(pipeline: &str, element: &str, signal: &str) -> Result<String, ClientError> {
    Ok(format!(
        "{}/signals/{}",
        element_path(pipeline, element)?,
        require(signal, "signal name")?
    ))
}

/// Target states for a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Playing,
    Paused,
    Null,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Playing => "playing",
            PipelineState::Paused => "paused",
            PipelineState::Null => "null",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a seek event.
///
/// The defaults describe a full, unbounded forward seek at normal speed:
/// rate 1.0, time format, flush flag, absolute start at 0, absolute end at -1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seek {
    pub rate: f64,
    pub format: i32,
    pub flags: i32,
    pub start_type: i32,
    pub start: i64,
    pub end_type: i32,
    pub end: i64,
}

impl Default for Seek {
    fn default() -> Self {
        Self {
            rate: 1.0,
            format: 3,
            flags: 1,
            start_type: 1,
            start: 0,
            end_type: 1,
            end: -1,
        }
    }
}

impl Seek {
    /// Render the seven fields in daemon order joined by [`SEEK_SEPARATOR`].
    ///
    /// Integral rates render without a fractional part (`1`, not `1.0`).
    pub fn encode(&self) -> String {
        [
            self.rate.to_string(),
            self.format.to_string(),
            self.flags.to_string(),
            self.start_type.to_string(),
            self.start.to_string(),
            self.end_type.to_string(),
            self.end.to_string(),
        ]
        .join(SEEK_SEPARATOR)
    }
}

// ── Pipelines ──────────────────────────────────────────────────────────

pub fn list_pipelines() -> RequestEnvelope {
    RequestEnvelope::read("/pipelines")
}

pub fn pipeline_create(pipeline: &str, description: &str) -> Result<RequestEnvelope, ClientError> {
    let pipeline = require(pipeline, "pipeline name")?;
    Ok(RequestEnvelope::create(
        "/pipelines",
        pipeline,
        Some(description.to_string()),
    ))
}

pub fn pipeline_delete(pipeline: &str) -> Result<RequestEnvelope, ClientError> {
    let pipeline = require(pipeline, "pipeline name")?;
    Ok(RequestEnvelope::delete("/pipelines", pipeline).with_body(json!({ "name": pipeline })))
}

/// Change the pipeline state (play, pause, stop).
pub fn pipeline_state(pipeline: &str, state: PipelineState) -> Result<RequestEnvelope, ClientError> {
    let path = format!("{}/state", pipeline_path(pipeline)?);
    Ok(RequestEnvelope::update(path, state.as_str())
        .with_body(json!({ "name": state.as_str() })))
}

pub fn pipeline_graph(pipeline: &str) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::read(format!("{}/graph", pipeline_path(pipeline)?)))
}

pub fn pipeline_verbose(pipeline: &str, enable: bool) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::update(
        format!("{}/verbose", pipeline_path(pipeline)?),
        flag(enable),
    ))
}

// ── Elements ───────────────────────────────────────────────────────────

pub fn list_elements(pipeline: &str) -> Result<RequestEnvelope, ClientError> {
    // The trailing slash is part of the daemon's resource name.
    Ok(RequestEnvelope::read(format!("{}/elements/", pipeline_path(pipeline)?)))
}

pub fn list_properties(pipeline: &str, element: &str) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::read(format!(
        "{}/properties",
        element_path(pipeline, element)?
    )))
}

pub fn element_get(
    pipeline: &str,
    element: &str,
    property: &str,
) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::read(format!(
        "{}/properties/{}",
        element_path(pipeline, element)?,
        require(property, "property name")?
    )))
}

pub fn element_set(
    pipeline: &str,
    element: &str,
    property: &str,
    value: &str,
) -> Result<RequestEnvelope, ClientError> {
    let path = format!(
        "{}/properties/{}",
        element_path(pipeline, element)?,
        require(property, "property name")?
    );
    Ok(RequestEnvelope::update(path, value).with_body(json!({
        "name": pipeline,
        "element": element,
        "prop": property,
        "value": value,
    })))
}

/// Emit a parameterless action signal on an element.
pub fn action_emit(
    pipeline: &str,
    element: &str,
    action: &str,
) -> Result<RequestEnvelope, ClientError> {
    let action = require(action, "action name")?;
    let path = format!("{}/actions/{}", element_path(pipeline, element)?, action);
    Ok(RequestEnvelope::create(path, action, None))
}

// ── Signals ────────────────────────────────────────────────────────────

pub fn list_signals(pipeline: &str, element: &str) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::read(format!(
        "{}/signals",
        element_path(pipeline, element)?
    )))
}

pub fn signal_connect(
    pipeline: &str,
    element: &str,
    signal: &str,
) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::read(format!(
        "{}/callback",
        signal_path(pipeline, element, signal)?
    )))
}

pub fn signal_disconnect(
    pipeline: &str,
    element: &str,
    signal: &str,
) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::read(format!(
        "{}/disconnect",
        signal_path(pipeline, element, signal)?
    )))
}

/// Timeout for a signal connect, in microseconds (-1 forever, 0 immediate).
pub fn signal_timeout(
    pipeline: &str,
    element: &str,
    signal: &str,
    timeout: i64,
) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::update(
        format!("{}/timeout", signal_path(pipeline, element, signal)?),
        timeout.to_string(),
    ))
}

// ── Bus ────────────────────────────────────────────────────────────────

/// Restrict the bus to `+`-separated message types (e.g. `eos+error`).
pub fn bus_filter(pipeline: &str, filter: &str) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::update(
        format!("{}/bus/types", pipeline_path(pipeline)?),
        filter,
    ))
}

pub fn bus_read(pipeline: &str) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::read(format!(
        "{}/bus/message",
        pipeline_path(pipeline)?
    )))
}

/// Bus read timeout in nanoseconds (-1 forever, 0 immediate).
pub fn bus_timeout(pipeline: &str, timeout_ns: i64) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::update(
        format!("{}/bus/timeout", pipeline_path(pipeline)?),
        timeout_ns.to_string(),
    ))
}

// ── Events ─────────────────────────────────────────────────────────────

fn event_path(pipeline: &str) -> Result<String, ClientError> {
    Ok(format!("{}/event", pipeline_path(pipeline)?))
}

pub fn event_seek(pipeline: &str, seek: &Seek) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::create(
        event_path(pipeline)?,
        "seek",
        Some(seek.encode()),
    ))
}

pub fn event_eos(pipeline: &str) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::create(event_path(pipeline)?, "eos", None))
}

pub fn event_flush_start(pipeline: &str) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::create(
        event_path(pipeline)?,
        "flush_start",
        None,
    ))
}

pub fn event_flush_stop(pipeline: &str, reset: bool) -> Result<RequestEnvelope, ClientError> {
    Ok(RequestEnvelope::create(
        event_path(pipeline)?,
        "flush_stop",
        Some(flag(reset).to_string()),
    ))
}

// ── Debug ──────────────────────────────────────────────────────────────

pub fn debug_enable(enable: bool) -> RequestEnvelope {
    RequestEnvelope::update("/debug/enable", flag(enable))
}

pub fn debug_color(color: bool) -> RequestEnvelope {
    RequestEnvelope::update("/debug/color", flag(color))
}

pub fn debug_reset(reset: bool) -> RequestEnvelope {
    RequestEnvelope::update("/debug/reset", flag(reset))
}

/// Debug threshold, as accepted by `GST_DEBUG` (e.g. `*:3` or `2`).
pub fn debug_threshold(threshold: &str) -> RequestEnvelope {
    RequestEnvelope::update("/debug/threshold", threshold)
}
