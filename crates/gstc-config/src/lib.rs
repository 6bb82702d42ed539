#![deny(unsafe_code)]

//! Configuration loading and validation for gstc.
//!
//! Loads TOML configuration files describing where the GStreamer Daemon is
//! reachable and how the client should talk to it. Provides the [`AppConfig`]
//! type as the central configuration structure.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the daemon is reachable.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Client-side request behaviour.
    #[serde(default)]
    pub client: ClientConfig,

    /// Bus polling defaults.
    #[serde(default)]
    pub bus: BusConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network location of the GStreamer Daemon HTTP endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// URL scheme: "http" or "https".
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Host name or IP address of the daemon.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port of the daemon.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5001
}

/// Client-side request configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Whole-request timeout in seconds (0 = no client-side timeout).
    ///
    /// Bus reads are long polls bounded by the daemon's bus timeout, so a
    /// bounded value here must outlast `bus.timeout_ns`.
    #[serde(default)]
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    /// The request timeout as a [`Duration`], or `None` when unbounded.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Check a bus read timeout against this request timeout.
    ///
    /// `timeout_ns` must be `-1`, `0` or positive. A bounded request timeout
    /// must outlast a bounded bus long-poll and rules out `-1`.
    pub fn check_bus_timeout(&self, timeout_ns: i64) -> Result<(), ConfigError> {
        if timeout_ns < -1 {
            return Err(ConfigError::Validation(format!(
                "bus.timeout_ns must be -1, 0 or positive, got {timeout_ns}"
            )));
        }

        let Some(request_timeout) = self.request_timeout() else {
            return Ok(());
        };
        if timeout_ns < 0 {
            return Err(ConfigError::Validation(
                "client.request_timeout_secs must be 0 when bus.timeout_ns is -1 (wait forever)"
                    .to_string(),
            ));
        }
        let bus_timeout = Duration::from_nanos(timeout_ns as u64);
        if request_timeout <= bus_timeout {
            return Err(ConfigError::Validation(format!(
                "client.request_timeout_secs ({}s) must exceed bus.timeout_ns ({timeout_ns}ns)",
                self.request_timeout_secs
            )));
        }
        Ok(())
    }
}

/// Defaults applied to a pipeline bus before polling it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Daemon-side read timeout in nanoseconds.
    /// `-1` waits forever, `0` returns immediately.
    #[serde(default = "default_bus_timeout_ns")]
    pub timeout_ns: i64,

    /// Message type filter, `+`-separated (e.g. "error+warning+eos").
    /// Empty means the filter is left untouched.
    #[serde(default)]
    pub filter: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            timeout_ns: default_bus_timeout_ns(),
            filter: String::new(),
        }
    }
}

fn default_bus_timeout_ns() -> i64 {
    1_000_000_000 // 1 s
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daemon.host.is_empty() {
            return Err(ConfigError::Validation(
                "daemon.host must not be empty".to_string(),
            ));
        }
        if self.daemon.port == 0 {
            return Err(ConfigError::Validation(
                "daemon.port must be non-zero".to_string(),
            ));
        }
        let valid_schemes = ["http", "https"];
        if !valid_schemes.contains(&self.daemon.scheme.as_str()) {
            return Err(ConfigError::Validation(format!(
                "daemon.scheme must be one of {:?}, got {:?}",
                valid_schemes, self.daemon.scheme
            )));
        }

        self.client.check_bus_timeout(self.bus.timeout_ns)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.daemon.scheme, "http");
        assert_eq!(config.daemon.host, "127.0.0.1");
        assert_eq!(config.daemon.port, 5001);
        assert_eq!(config.client.request_timeout_secs, 0);
        assert_eq!(config.bus.timeout_ns, 1_000_000_000);
        assert!(config.bus.filter.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.daemon.port, 5001);
        assert!(config.client.request_timeout().is_none());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [daemon]
            scheme = "https"
            host = "gstd.local"
            port = 8443

            [client]
            request_timeout_secs = 5

            [bus]
            timeout_ns = 200000000
            filter = "error+warning+eos"

            [logging]
            level = "debug"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.daemon.scheme, "https");
        assert_eq!(config.daemon.host, "gstd.local");
        assert_eq!(config.daemon.port, 8443);
        assert_eq!(
            config.client.request_timeout(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(config.bus.timeout_ns, 200_000_000);
        assert_eq!(config.bus.filter, "error+warning+eos");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_zero_port() {
        let toml = r#"
            [daemon]
            port = 0
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_host() {
        let toml = r#"
            [daemon]
            host = ""
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_scheme() {
        let toml = r#"
            [daemon]
            scheme = "ftp"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_negative_bus_timeout() {
        let toml = r#"
            [bus]
            timeout_ns = -5
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_bus_timeout_forever_is_valid() {
        let toml = r#"
            [bus]
            timeout_ns = -1
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.bus.timeout_ns, -1);
    }

    #[test]
    fn test_validation_rejects_request_timeout_shorter_than_bus_timeout() {
        let toml = r#"
            [client]
            request_timeout_secs = 1

            [bus]
            timeout_ns = 2000000000
        "#;
        let err = AppConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("must exceed"));
    }

    #[test]
    fn test_validation_rejects_request_timeout_with_endless_bus() {
        let toml = r#"
            [client]
            request_timeout_secs = 30

            [bus]
            timeout_ns = -1
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_check_bus_timeout_against_request_timeout() {
        let unbounded = ClientConfig::default();
        assert!(unbounded.check_bus_timeout(-1).is_ok());
        assert!(unbounded.check_bus_timeout(60_000_000_000).is_ok());
        assert!(unbounded.check_bus_timeout(-2).is_err());

        let bounded = ClientConfig {
            request_timeout_secs: 5,
        };
        assert!(bounded.check_bus_timeout(0).is_ok());
        assert!(bounded.check_bus_timeout(4_000_000_000).is_ok());
        assert!(bounded.check_bus_timeout(-1).is_err());
        let err = bounded.check_bus_timeout(5_000_000_000).unwrap_err();
        assert!(err.to_string().contains("must exceed"));
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[tokio::test]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gstc.toml");
        tokio::fs::write(&path, b"[daemon]\nport = 5050\nhost = \"10.0.0.7\"\n")
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.daemon.port, 5050);
        assert_eq!(config.daemon.host, "10.0.0.7");
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/gstc.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    // ── Error display ─────────────────────────────────────────────────

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = AppConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("port = 5001"));
        let parsed = AppConfig::parse(&rendered).unwrap();
        assert_eq!(parsed.daemon.host, config.daemon.host);
    }
}
