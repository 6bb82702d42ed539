//! Configuration builders and temporary config files for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries, and [`TestConfigFile`] when
//! the code under test reads configuration from disk.

use std::path::{Path, PathBuf};

use gstc_config::AppConfig;
use tempfile::TempDir;

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .daemon_port(5002)
///     .bus_timeout_ns(-1)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn daemon_host(mut self, host: &str) -> Self {
        self.config.daemon.host = host.to_string();
        self
    }

    pub fn daemon_port(mut self, port: u16) -> Self {
        self.config.daemon.port = port;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.client.request_timeout_secs = secs;
        self
    }

    pub fn bus_timeout_ns(mut self, timeout_ns: i64) -> Self {
        self.config.bus.timeout_ns = timeout_ns;
        self
    }

    pub fn bus_filter(mut self, filter: &str) -> Self {
        self.config.bus.filter = filter.to_string();
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A config file in a temp directory that is removed on drop, even on panic.
pub struct TestConfigFile {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TestConfigFile {
    /// Write `toml_content` to a fresh `gstc.toml`.
    pub async fn with_toml(toml_content: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("gstc.toml");
        tokio::fs::write(&path, toml_content)
            .await
            .expect("failed to write test config");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// A path inside the temp directory where no file exists.
    pub fn missing() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("absent.toml");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with new content.
    pub async fn write(&self, toml_content: &str) {
        tokio::fs::write(&self.path, toml_content)
            .await
            .expect("failed to write updated config");
    }
}
