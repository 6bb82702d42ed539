#![deny(unsafe_code)]

//! Client library for the GStreamer Daemon (gstd) HTTP API.
//!
//! Turns pipeline intents (create, play, seek, read the bus...) into
//! resource-addressed requests, classifies every failure as either a
//! transport problem or a daemon-reported error, and runs the long-lived
//! bus polling loop.
//!
//! ```no_run
//! # async fn demo() -> Result<(), gstc_core::ClientError> {
//! use gstc_core::{Address, GstdClient};
//!
//! let client = GstdClient::new(Address::default())?;
//! client.pipeline_create("p0", "videotestsrc ! autovideosink").await?;
//! client.pipeline_play("p0").await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future for async trait methods that
/// must stay object-safe (`Arc<dyn Transport>`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Daemon address and URL composition.
pub mod address;
/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Per-pipeline bus polling loop.
pub mod bus;
/// `GstdClient` facade.
pub mod client;
/// Transport-independent request envelopes.
pub mod envelope;
/// Transport vs. daemon error taxonomy.
pub mod error;
/// Named operations mapped onto envelopes.
pub mod resource;
/// HTTP transport and response decoding.
pub mod transport;

pub use address::Address;
pub use bus::{BusClosed, BusEvent, BusPoller, BusPollerHandle, CloseReason, PollExit, PollerState};
pub use client::GstdClient;
pub use envelope::{RequestEnvelope, Verb};
pub use error::{ClientError, DaemonCode, ErrorCode};
pub use resource::{PipelineState, Seek};
pub use transport::{DaemonResponse, HttpTransport, Transport};
