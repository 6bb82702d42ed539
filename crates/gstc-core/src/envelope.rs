//! Transport-independent request envelopes.
//!
//! A [`RequestEnvelope`] is one of the daemon's four primitive operations
//! (create, read, update, delete) bound to a resource path. It knows nothing
//! about sockets or HTTP clients; the [`Transport`](crate::transport::Transport)
//! turns it into a network call.

use std::fmt;

use serde_json::Value;

use crate::address::Address;

/// The four primitive operations understood by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verb::Create => "create",
            Verb::Read => "read",
            Verb::Update => "update",
            Verb::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// One request before transport: verb, resource path, query values and an
/// optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub verb: Verb,
    pub path: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub body: Option<Value>,
}

impl RequestEnvelope {
    fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            name: None,
            description: None,
            body: None,
        }
    }

    /// CREATE `name` under `path`, with an optional description.
    pub fn create(
        path: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            description,
            ..Self::new(Verb::Create, path)
        }
    }

    /// READ the resource at `path`.
    pub fn read(path: impl Into<String>) -> Self {
        Self::new(Verb::Read, path)
    }

    /// UPDATE the resource at `path` to `value`.
    pub fn update(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(value.into()),
            ..Self::new(Verb::Update, path)
        }
    }

    /// DELETE `name` from the collection at `path`.
    pub fn delete(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(Verb::Delete, path)
        }
    }

    /// Attach a JSON body sent alongside the query parameters.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The complete URL for this envelope against `address`.
    pub fn url(&self, address: &Address) -> String {
        address.url(&self.path, self.name.as_deref(), self.description.as_deref())
    }
}
