//! Error taxonomy: transport failures vs. daemon-reported failures.
//!
//! Every fallible client call returns [`ClientError`]. A request either never
//! produced a valid daemon envelope ([`ClientError::Transport`]) or the daemon
//! parsed it and answered with a non-zero code ([`ClientError::Daemon`]).
//! Both carry a numeric code so callers can handle them uniformly via
//! [`ClientError::code`], or match on the variant to treat them separately.

use std::fmt;

/// Client-side status codes.
///
/// Negative values share the numbering used by the daemon's own client
/// libraries. Only [`ErrorCode::Unreachable`], [`ErrorCode::RecvError`] and
/// [`ErrorCode::NullArgument`] are raised by this crate; the rest exist so a
/// code received from elsewhere can still be named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    NullArgument = -1,
    Unreachable = -2,
    Timeout = -3,
    Oom = -4,
    TypeError = -5,
    Malformed = -6,
    NotFound = -7,
    SendError = -8,
    RecvError = -9,
    SocketError = -10,
    ThreadError = -11,
    BusTimeout = -12,
    SocketTimeout = -13,
}

impl ErrorCode {
    const ALL: [ErrorCode; 14] = [
        ErrorCode::Ok,
        ErrorCode::NullArgument,
        ErrorCode::Unreachable,
        ErrorCode::Timeout,
        ErrorCode::Oom,
        ErrorCode::TypeError,
        ErrorCode::Malformed,
        ErrorCode::NotFound,
        ErrorCode::SendError,
        ErrorCode::RecvError,
        ErrorCode::SocketError,
        ErrorCode::ThreadError,
        ErrorCode::BusTimeout,
        ErrorCode::SocketTimeout,
    ];

    /// The numeric value of this code.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Look up a client code by its numeric value.
    pub fn from_i32(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_i32() == code)
    }

    /// Upper-case symbolic name, e.g. `UNREACHABLE`.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Ok => "OK",
            ErrorCode::NullArgument => "NULL_ARGUMENT",
            ErrorCode::Unreachable => "UNREACHABLE",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Oom => "OOM",
            ErrorCode::TypeError => "TYPE_ERROR",
            ErrorCode::Malformed => "MALFORMED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::SendError => "SEND_ERROR",
            ErrorCode::RecvError => "RECV_ERROR",
            ErrorCode::SocketError => "SOCKET_ERROR",
            ErrorCode::ThreadError => "THREAD_ERROR",
            ErrorCode::BusTimeout => "BUS_TIMEOUT",
            ErrorCode::SocketTimeout => "SOCKET_TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_i32())
    }
}

/// Return codes reported by the daemon in the `code` field of its envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DaemonCode {
    Eok = 0,
    NullArgument = 1,
    BadDescription = 2,
    ExistingName = 3,
    MissingInitialization = 4,
    NoPipeline = 5,
    NoResource = 6,
    NoCreate = 7,
    ExistingResource = 8,
    NoUpdate = 9,
    BadCommand = 10,
    NoRead = 11,
    NoConnection = 12,
    BadValue = 13,
    StateError = 14,
    IpcError = 15,
    EventError = 16,
    MissingArgument = 17,
    MissingName = 18,
}

impl DaemonCode {
    const ALL: [DaemonCode; 19] = [
        DaemonCode::Eok,
        DaemonCode::NullArgument,
        DaemonCode::BadDescription,
        DaemonCode::ExistingName,
        DaemonCode::MissingInitialization,
        DaemonCode::NoPipeline,
        DaemonCode::NoResource,
        DaemonCode::NoCreate,
        DaemonCode::ExistingResource,
        DaemonCode::NoUpdate,
        DaemonCode::BadCommand,
        DaemonCode::NoRead,
        DaemonCode::NoConnection,
        DaemonCode::BadValue,
        DaemonCode::StateError,
        DaemonCode::IpcError,
        DaemonCode::EventError,
        DaemonCode::MissingArgument,
        DaemonCode::MissingName,
    ];

    /// The numeric value of this code.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Look up a daemon code by its numeric value.
    pub fn from_i32(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_i32() == code)
    }

    /// The daemon's canonical description for this code.
    pub fn description(self) -> &'static str {
        match self {
            DaemonCode::Eok => "Success",
            DaemonCode::NullArgument => "Required argument is NULL",
            DaemonCode::BadDescription => "Bad pipeline description",
            DaemonCode::ExistingName => "Name already exists",
            DaemonCode::MissingInitialization => "Missing initialization",
            DaemonCode::NoPipeline => "Pipeline requested doesn't exist",
            DaemonCode::NoResource => "Resource requested doesn't exist",
            DaemonCode::NoCreate => "Cannot create in this resource",
            DaemonCode::ExistingResource => "Resource already exists",
            DaemonCode::NoUpdate => "Cannot update this resource",
            DaemonCode::BadCommand => "Bad command",
            DaemonCode::NoRead => "Resource not readable",
            DaemonCode::NoConnection => "Cannot connect",
            DaemonCode::BadValue => "Bad value",
            DaemonCode::StateError => "State error",
            DaemonCode::IpcError => "IPC error",
            DaemonCode::EventError => "Event error",
            DaemonCode::MissingArgument => "One or more arguments are missing",
            DaemonCode::MissingName => "Name is missing",
        }
    }
}

/// Reason text for a daemon that could not be reached.
pub const REASON_UNREACHABLE: &str = "unreachable";
/// Reason text for a body that is not a valid daemon envelope.
pub const REASON_CORRUPTED: &str = "corrupted response";
/// Reason text for a required argument that was empty.
pub const REASON_MISSING_ARGUMENT: &str = "missing argument";

/// A classified client failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a valid daemon response.
    #[error("transport error {code}: {reason}: {detail}")]
    Transport {
        reason: String,
        code: ErrorCode,
        detail: String,
    },

    /// The daemon parsed the request and reported a failure.
    #[error("daemon error {code}: {description}")]
    Daemon { description: String, code: i32 },
}

impl ClientError {
    /// The daemon could not be reached (refused, reset, timed out).
    pub fn unreachable(detail: impl Into<String>) -> Self {
        ClientError::Transport {
            reason: REASON_UNREACHABLE.to_string(),
            code: ErrorCode::Unreachable,
            detail: detail.into(),
        }
    }

    /// The daemon answered with something that is not a valid envelope.
    pub fn corrupted(detail: impl Into<String>) -> Self {
        ClientError::Transport {
            reason: REASON_CORRUPTED.to_string(),
            code: ErrorCode::RecvError,
            detail: detail.into(),
        }
    }

    /// A required argument was empty; nothing was sent.
    pub fn missing_argument(what: &str) -> Self {
        ClientError::Transport {
            reason: REASON_MISSING_ARGUMENT.to_string(),
            code: ErrorCode::NullArgument,
            detail: format!("{what} must not be empty"),
        }
    }

    /// Numeric code of either variant.
    pub fn code(&self) -> i32 {
        match self {
            ClientError::Transport { code, .. } => code.as_i32(),
            ClientError::Daemon { code, .. } => *code,
        }
    }

    /// Whether this is a transport-level failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    /// Whether this failure was reported by the daemon.
    pub fn is_daemon(&self) -> bool {
        matches!(self, ClientError::Daemon { .. })
    }

    /// The named daemon code, for daemon-reported failures with a known code.
    pub fn daemon_code(&self) -> Option<DaemonCode> {
        match self {
            ClientError::Daemon { code, .. } => DaemonCode::from_i32(*code),
            ClientError::Transport { .. } => None,
        }
    }
}
