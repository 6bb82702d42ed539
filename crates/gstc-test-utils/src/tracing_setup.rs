//! Log capture for tests that drive the client against [`MockDaemon`].
//!
//! Without `RUST_LOG`, the client's request/reply events and the mock's
//! request log are shown at `debug`; everything else stays at `info`.
//!
//! [`MockDaemon`]: crate::MockDaemon

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_TEST_FILTER: &str = "info,gstc_core=debug,gstc_test_utils=debug";

/// Install a subscriber writing through the test harness, once per process.
///
/// Later calls are no-ops, so every test may call it.
///
/// ```ignore
/// #[tokio::test]
/// async fn watch_bus() {
///     gstc_test_utils::tracing_setup::init_test_tracing();
///     // "daemon request" / "mock daemon request" lines now show up
/// }
/// ```
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER)),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_TEST_FILTER).is_ok());
    }

    #[test]
    fn test_init_is_repeatable() {
        init_test_tracing();
        init_test_tracing();
        tracing::debug!(target: "gstc_core", "still initialised");
    }
}
