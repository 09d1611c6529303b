//! Error types for the node client

use std::fmt;
use thiserror::Error;

/// Result type alias for node calls
pub type Result<T> = std::result::Result<T, InvokeError>;

/// Category of a failed node call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeErrorKind {
    /// Connection failure or timeout
    Transport,
    /// The service answered with a non-2xx status
    Protocol,
    /// A 2xx answer that is null, malformed, or missing an expected field
    Data,
    /// The request itself could not be built (e.g. a GET payload that is not an object)
    Request,
}

impl fmt::Display for InvokeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvokeErrorKind::Transport => "transport",
            InvokeErrorKind::Protocol => "protocol",
            InvokeErrorKind::Data => "data",
            InvokeErrorKind::Request => "request",
        };
        f.write_str(name)
    }
}

/// A failed call to a node method
///
/// Every failure mode of the invoker is folded into this one type so callers
/// branch on `Result` alone.
#[derive(Debug, Clone, Error)]
#[error("{kind} error calling '{method}': {message}")]
pub struct InvokeError {
    pub kind: InvokeErrorKind,
    /// HTTP status for protocol errors
    pub status: Option<u16>,
    /// Remote method that was called
    pub method: String,
    pub message: String,
}

impl InvokeError {
    pub fn transport(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: InvokeErrorKind::Transport,
            status: None,
            method: method.into(),
            message: message.into(),
        }
    }

    /// Create a protocol error from status code and response body
    pub fn protocol(method: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: InvokeErrorKind::Protocol,
            status: Some(status),
            method: method.into(),
            message: format!("status {}: {}", status, body.into()),
        }
    }

    pub fn data(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: InvokeErrorKind::Data,
            status: None,
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn request(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: InvokeErrorKind::Request,
            status: None,
            method: method.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self.status, Some(status) if (400..500).contains(&status))
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(status) if status >= 500)
    }

    /// Transport failures and 5xx answers may succeed on a later attempt;
    /// everything else is deterministic.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            InvokeErrorKind::Transport => true,
            InvokeErrorKind::Protocol => self.is_server_error(),
            InvokeErrorKind::Data | InvokeErrorKind::Request => false,
        }
    }
}
