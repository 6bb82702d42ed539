//! Daemon address and URL composition.

use std::fmt;

use gstc_config::DaemonConfig;

/// Where the daemon's HTTP endpoint lives.
///
/// An `Address` is never mutated once a client holds it; re-pointing a
/// client means building a new `Address` and a new client value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    scheme: String,
    host: String,
    port: u16,
}

impl Address {
    /// Default daemon HTTP port.
    pub const DEFAULT_PORT: u16 = 5001;

    /// An `http` address for the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: "http".to_string(),
            host: host.into(),
            port,
        }
    }

    /// Use a different URL scheme (e.g. `https`).
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Build an address from the `[daemon]` configuration section.
    pub fn from_config(config: &DaemonConfig) -> Self {
        Self::new(&config.host, config.port).with_scheme(&config.scheme)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `scheme://host:port` with no trailing slash.
    pub fn base(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Compose the full URL for a resource path.
    ///
    /// `name` becomes the `name=` query parameter. `description` is appended
    /// as `&description=` only when it is `Some`, so an omitted description
    /// and an empty one produce different URLs. Values are appended verbatim;
    /// callers that need a space-equivalent inside a value pass `%20`.
    pub fn url(&self, path: &str, name: Option<&str>, description: Option<&str>) -> String {
        let mut url = self.base();
        url.push_str(path);

        if let Some(name) = name {
            url.push_str("?name=");
            url.push_str(name);
            if let Some(description) = description {
                url.push_str("&description=");
                url.push_str(description);
            }
        } else if let Some(description) = description {
            url.push_str("?description=");
            url.push_str(description);
        }

        url
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::new("127.0.0.1", Self::DEFAULT_PORT)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_url() {
        let addr = Address::new("localhost", 5000);
        assert_eq!(addr.base(), "http://localhost:5000");
        assert_eq!(addr.to_string(), "http://localhost:5000");
    }

    #[test]
    fn test_url_without_query() {
        let addr = Address::new("localhost", 5000);
        assert_eq!(
            addr.url("/pipelines", None, None),
            "http://localhost:5000/pipelines"
        );
    }

    #[test]
    fn test_url_with_name_only() {
        let addr = Address::new("localhost", 5000);
        assert_eq!(
            addr.url("/pipelines/p0/state", Some("playing"), None),
            "http://localhost:5000/pipelines/p0/state?name=playing"
        );
    }

    #[test]
    fn test_omitted_description_is_not_appended() {
        let addr = Address::default();
        let url = addr.url("/pipelines/p0/event", Some("eos"), None);
        assert!(!url.contains("description"));
    }

    #[test]
    fn test_empty_description_is_appended() {
        let addr = Address::default();
        let url = addr.url("/pipelines", Some("p0"), Some(""));
        assert_eq!(url, "http://127.0.0.1:5001/pipelines?name=p0&description=");
    }

    #[test]
    fn test_values_are_appended_verbatim() {
        let addr = Address::default();
        let url = addr.url("/pipelines/p0/event", Some("seek"), Some("1%203"));
        assert!(url.ends_with("?name=seek&description=1%203"));
    }

    #[test]
    fn test_from_config() {
        let config = DaemonConfig {
            scheme: "https".to_string(),
            host: "gstd.local".to_string(),
            port: 8443,
        };
        let addr = Address::from_config(&config);
        assert_eq!(addr.base(), "https://gstd.local:8443");
        assert_eq!(addr.host(), "gstd.local");
        assert_eq!(addr.port(), 8443);
        assert_eq!(addr.scheme(), "https");
    }
}
