//! Client error taxonomy shared by every backend call.

use std::fmt;

/// Message shown when the backend cannot be reached or answers non-2xx.
pub const CONNECTIVITY_ERROR: &str = "Failed to connect to server. Make sure the backend is running!";

/// Message shown when a stream fails before any content arrived.
pub const STREAM_CONNECT_ERROR: &str = "Error: Failed to connect to streaming endpoint.";

/// Categories of client errors for consistent handling in front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// Required input was empty; no request was sent
    Validation,
    /// Non-2xx response from the backend
    HttpStatus,
    /// Connection refused, reset, or other transport failure
    Transport,
    /// Connect or request timeout
    Timeout,
    /// Response body could not be decoded
    Decode,
    /// The operation was cancelled before it finished
    Cancelled,
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientErrorKind::Validation => write!(f, "validation"),
            ClientErrorKind::HttpStatus => write!(f, "http_status"),
            ClientErrorKind::Transport => write!(f, "transport"),
            ClientErrorKind::Timeout => write!(f, "timeout"),
            ClientErrorKind::Decode => write!(f, "decode"),
            ClientErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Structured error with a display message and optional diagnostic details.
///
/// `message` is what a front end shows the user. `details` carries the
/// underlying cause (status code, reqwest error) for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Validation, message)
    }

    /// Non-2xx status. The body is kept for diagnostics only.
    pub fn http_status(status: u16, body: &str) -> Self {
        let details = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {body}")
        };
        Self::new(ClientErrorKind::HttpStatus, CONNECTIVITY_ERROR).with_details(details)
    }

    pub fn decode(details: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Decode, CONNECTIVITY_ERROR).with_details(details)
    }

    pub fn cancelled() -> Self {
        Self::new(ClientErrorKind::Cancelled, "Request cancelled")
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ClientErrorKind::Validation
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            ClientErrorKind::Timeout
        } else if e.is_decode() {
            ClientErrorKind::Decode
        } else {
            ClientErrorKind::Transport
        };
        Self::new(kind, CONNECTIVITY_ERROR).with_details(e.to_string())
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ClientError {}

/// Result type for backend operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_shows_generic_message() {
        let err = ClientError::http_status(503, "upstream down");
        assert_eq!(err.kind, ClientErrorKind::HttpStatus);
        assert_eq!(err.to_string(), CONNECTIVITY_ERROR);
        assert_eq!(err.details.as_deref(), Some("HTTP 503: upstream down"));
    }

    #[test]
    fn test_http_status_without_body() {
        let err = ClientError::http_status(500, "");
        assert_eq!(err.details.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_validation_keeps_message() {
        let err = ClientError::validation("Please enter a message!");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Please enter a message!");
    }
}
