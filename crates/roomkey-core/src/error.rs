//! Error types for roomkey.
//!
//! One error type covers the whole request path, with explicit variants for
//! transport failures, HTTP status failures, authentication outcomes, input
//! validation and response decoding. The refresh coordinator only ever looks
//! at [`Error::status`].

use std::fmt;
use thiserror::Error;

/// Message carried by the terminal error handed to every caller caught in a
/// failed refresh.
pub const REFRESH_FAILED_MESSAGE: &str = "Token refresh failed";

/// The unified error type for roomkey operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("request failed: {0}")]
    Status(#[from] StatusError),

    /// Authentication errors (refresh failed, no session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Input validation errors (base URL, header values, paths).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A success response whose body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl Error {
    /// HTTP status carried by this error, if any.
    ///
    /// [`AuthError::RefreshFailed`] reports `401` so callers can treat the
    /// terminal refresh failure like any other unauthorized response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status(err) => Some(err.status),
            Error::Auth(AuthError::RefreshFailed) => Some(401),
            _ => None,
        }
    }

    /// Returns true for a `401 Unauthorized`.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns true for the terminal "refresh failed" error.
    pub fn is_refresh_failed(&self) -> bool {
        matches!(self, Error::Auth(AuthError::RefreshFailed))
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP client error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The refresh call failed; tokens have been cleared.
    #[error("{}", REFRESH_FAILED_MESSAGE)]
    RefreshFailed,

    /// The operation needs a session but no tokens are held.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The server rejected the supplied credentials.
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// A non-success HTTP response.
#[derive(Debug, Clone)]
pub struct StatusError {
    /// HTTP status code.
    pub status: u16,
    /// Short error name from the body (e.g. `Unauthorized`), if present.
    pub error: Option<String>,
    /// Human readable message from the body, if present.
    pub message: Option<String>,
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for StatusError {}

impl StatusError {
    /// Create a new status error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Create a status error with no body details.
    pub fn bare(status: u16) -> Self {
        Self::new(status, None, None)
    }

    /// Check if this is an authentication error.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid request path.
    #[error("invalid path '{value}': {reason}")]
    Path { value: String, reason: String },

    /// Header name or value that cannot be sent.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

/// Response decoding errors.
#[derive(Debug, Error)]
#[error("unexpected response body for {context}: {source}")]
pub struct DecodeError {
    /// What was being decoded.
    pub context: String,
    #[source]
    pub source: serde_json::Error,
}

impl DecodeError {
    pub fn new(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_failed_reports_401_and_fixed_message() {
        let err = Error::from(AuthError::RefreshFailed);
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert!(err.is_refresh_failed());
        assert_eq!(
            err.to_string(),
            "authentication error: Token refresh failed"
        );
    }

    #[test]
    fn status_error_display_includes_details() {
        let err = StatusError::new(
            401,
            Some("Unauthorized".to_string()),
            Some("jwt expired".to_string()),
        );
        assert_eq!(err.to_string(), "HTTP 401 [Unauthorized]: jwt expired");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn transport_errors_carry_no_status() {
        let err = Error::from(TransportError::Timeout { duration_ms: 10 });
        assert_eq!(err.status(), None);
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn server_error_is_not_unauthorized() {
        let err = Error::from(StatusError::bare(500));
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_unauthorized());
        assert!(!err.is_refresh_failed());
    }
}
