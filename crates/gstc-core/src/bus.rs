//! Bus polling: the long-running read loop over one pipeline's message bus.
//!
//! A [`BusPoller`] owns one pipeline name and walks the state machine
//! `Idle → Polling → (MessageDelivered → Polling)* → Closed`. Every non-null
//! bus read becomes a [`BusEvent::Message`]; the first failed read becomes a
//! single [`BusEvent::Closed`] and ends the poller for good.
//!
//! Callers stop a poller early through a [`CancellationToken`], checked before
//! each read. A read that is already in flight runs to completion.

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::client::GstdClient;
use crate::error::{ClientError, DaemonCode};

/// Capacity of the event channel used by [`BusPoller::spawn`].
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Where a poller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Not started, or stopped by cancellation.
    Idle,
    /// A bus read is pending or about to be issued.
    Polling,
    /// A message was just handed to the sink.
    MessageDelivered,
    /// A read failed. Terminal.
    Closed,
}

/// Why a poller closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The daemon no longer knows the pipeline (or its bus).
    PipelineGone,
    /// Any other transport or daemon failure.
    Failure,
}

impl CloseReason {
    /// Classify the error that ended the loop.
    pub fn classify(error: &ClientError) -> Self {
        match error.daemon_code() {
            Some(DaemonCode::NoPipeline | DaemonCode::NoResource) => CloseReason::PipelineGone,
            _ => CloseReason::Failure,
        }
    }
}

/// Terminal notification for a pipeline's bus.
#[derive(Debug, Clone, PartialEq)]
pub struct BusClosed {
    pub pipeline: String,
    pub reason: CloseReason,
    pub error: ClientError,
}

/// What a poller hands to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// One bus message, in daemon order.
    Message { pipeline: String, message: Value },
    /// The bus closed. Sent exactly once per poller.
    Closed(BusClosed),
}

/// How [`BusPoller::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// The poller is closed; no further reads will be issued.
    Closed,
    /// The token was cancelled; the poller is idle again.
    Cancelled,
}

/// Reads one pipeline's bus until it fails or is cancelled.
#[derive(Debug)]
pub struct BusPoller {
    client: GstdClient,
    pipeline: String,
    state: PollerState,
}

impl BusPoller {
    pub fn new(client: GstdClient, pipeline: impl Into<String>) -> Self {
        Self {
            client,
            pipeline: pipeline.into(),
            state: PollerState::Idle,
        }
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Set the bus filter and read timeout before polling.
    ///
    /// An empty filter leaves the daemon's current filter untouched.
    pub async fn configure(&self, filter: &str, timeout_ns: i64) -> Result<(), ClientError> {
        if !filter.is_empty() {
            self.client.bus_filter(&self.pipeline, filter).await?;
        }
        self.client.bus_timeout(&self.pipeline, timeout_ns).await?;
        debug!(pipeline = %self.pipeline, filter, timeout_ns, "bus configured");
        Ok(())
    }

    /// Read until there is something to report.
    ///
    /// Returns `None` when the token is cancelled (the poller goes back to
    /// [`PollerState::Idle`]) or when the poller is already closed.
    pub async fn next_event(&mut self, cancel: &CancellationToken) -> Option<BusEvent> {
        if self.state == PollerState::Closed {
            return None;
        }

        loop {
            if cancel.is_cancelled() {
                info!(pipeline = %self.pipeline, "bus polling cancelled");
                self.state = PollerState::Idle;
                return None;
            }

            self.state = PollerState::Polling;
            match self.client.bus_read(&self.pipeline).await {
                Ok(resp) => match resp.into_payload() {
                    Some(message) => {
                        self.state = PollerState::MessageDelivered;
                        return Some(BusEvent::Message {
                            pipeline: self.pipeline.clone(),
                            message,
                        });
                    }
                    None => {
                        trace!(pipeline = %self.pipeline, "empty bus read");
                        // Let the runtime schedule others between empty reads.
                        tokio::task::yield_now().await;
                    }
                },
                Err(error) => {
                    self.state = PollerState::Closed;
                    let reason = CloseReason::classify(&error);
                    match reason {
                        CloseReason::PipelineGone => {
                            info!(pipeline = %self.pipeline, error = %error, "bus closed, pipeline gone");
                        }
                        CloseReason::Failure => {
                            warn!(pipeline = %self.pipeline, error = %error, "bus closed");
                        }
                    }
                    return Some(BusEvent::Closed(BusClosed {
                        pipeline: self.pipeline.clone(),
                        reason,
                        error,
                    }));
                }
            }
        }
    }

    /// Drive the loop, handing every event to `sink`, until the bus closes or
    /// `cancel` fires.
    pub async fn run<F>(&mut self, mut sink: F, cancel: &CancellationToken) -> PollExit
    where
        F: FnMut(BusEvent),
    {
        if self.state != PollerState::Closed {
            info!(pipeline = %self.pipeline, "bus polling started");
        }
        while let Some(event) = self.next_event(cancel).await {
            sink(event);
        }
        self.exit()
    }

    /// Run the loop on its own task, delivering events over a bounded channel.
    ///
    /// Dropping the handle's receiver stops the task after the next event.
    pub fn spawn(mut self, cancel: CancellationToken) -> BusPollerHandle {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            info!(pipeline = %self.pipeline, "bus polling started");
            while let Some(event) = self.next_event(&token).await {
                if tx.send(event).await.is_err() {
                    debug!(pipeline = %self.pipeline, "bus event receiver dropped");
                    if self.state != PollerState::Closed {
                        self.state = PollerState::Idle;
                    }
                    break;
                }
            }
            self
        });

        BusPollerHandle {
            events: rx,
            cancel,
            task,
        }
    }

    fn exit(&self) -> PollExit {
        if self.state == PollerState::Closed {
            PollExit::Closed
        } else {
            PollExit::Cancelled
        }
    }
}

/// Handle to a poller running on its own task.
#[derive(Debug)]
pub struct BusPollerHandle {
    events: mpsc::Receiver<BusEvent>,
    cancel: CancellationToken,
    task: JoinHandle<BusPoller>,
}

impl BusPollerHandle {
    /// Next event, or `None` once the task has stopped.
    pub async fn recv(&mut self) -> Option<BusEvent> {
        self.events.recv().await
    }

    /// Ask the poller to stop before its next read.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the task and get the poller back.
    pub async fn join(self) -> Result<BusPoller, tokio::task::JoinError> {
        drop(self.events);
        self.task.await
    }
}
