#![deny(unsafe_code)]

//! Shared test utilities for the gstc workspace.
//!
//! Provides a scriptable mock of the daemon's HTTP API, config builders and
//! tracing helpers so that individual crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! gstc-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod mock_daemon;
pub mod tracing_setup;

pub use mock_daemon::{MockDaemon, RecordedRequest, Reply};
